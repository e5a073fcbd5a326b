//! HTTP surface for the MedPhase image filters
//!
//! Three routes:
//!
//! - `GET /` service description
//! - `GET /health` status, versions and counters
//! - `POST /process` multipart upload (`image`, `phase`) answered with a PNG
//!
//! ```rust,no_run
//! use medphase_core::config::Config;
//!
//! # async fn run() -> medphase_core::Result<()> {
//! let config = Config::load(None)?;
//! medphase_server::serve(config).await
//! # }
//! ```

#![warn(missing_docs)]

mod cors;
mod error;
mod routes;
mod server;
mod state;

pub use cors::cors_layer;
pub use error::ApiError;
pub use server::{serve, shutdown_signal};
pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Name reported by the info and health routes
pub const SERVICE_NAME: &str = "MedPhase Image Processing API";

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let config = state.config();
    let body_limit = config.server.max_upload_bytes;
    let cors = cors_layer(&config.cors);

    Router::new()
        .route("/", get(routes::info::root))
        .route("/health", get(routes::info::health))
        .route("/process", post(routes::process::process_image))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
