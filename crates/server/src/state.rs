//! Shared, read-only application state.

use medphase_core::config::ConfigSchema;
use std::sync::Arc;
use std::time::Instant;

/// State handed to every handler.
///
/// Holds the startup configuration; nothing in it changes after the
/// server starts.
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<ConfigSchema>,
    started_at: Instant,
}

impl AppState {
    /// Wrap a validated configuration
    pub fn new(config: ConfigSchema) -> Self {
        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Startup configuration
    pub fn config(&self) -> &ConfigSchema {
        &self.config
    }

    /// Seconds since the state was created
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ConfigSchema::default())
    }
}
