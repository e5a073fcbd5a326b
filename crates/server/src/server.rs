//! Listener setup and graceful shutdown.

use crate::{app, AppState};
use medphase_core::config::Config;
use medphase_core::{Error, ErrorCode, Result};
use tokio::net::TcpListener;

/// Bind the configured address and serve until a shutdown signal arrives.
pub async fn serve(config: Config) -> Result<()> {
    let schema = config.schema;
    let addr = schema.server.bind_address();

    if schema.cors.allows_any_origin() {
        tracing::warn!("CORS allows any origin; restrict cors.allowed_origins for production");
    }

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::bind_failed(&addr).with_source(e))?;
    let local = listener.local_addr().map_err(Error::from)?;

    tracing::info!(
        address = %local,
        max_upload_bytes = schema.server.max_upload_bytes,
        config_file = config.path.as_deref(),
        "Server listening"
    );

    axum::serve(listener, app(AppState::new(schema)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::new(ErrorCode::ServerError, format!("Server error: {}", e)).with_source(e))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
