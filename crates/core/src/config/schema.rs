//! Configuration schema definitions

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Origin value that admits every caller
pub const ANY_ORIGIN: &str = "*";

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigSchema {
    /// Listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Cross-origin policy
    #[serde(default)]
    pub cors: CorsConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConfigSchema {
    /// Reject values the server cannot start with
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.cors.validate()?;
        Ok(())
    }
}

/// Listener and request-size settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::invalid_config("server.host must not be empty"));
        }
        if self.port == 0 {
            return Err(Error::invalid_config("server.port must be between 1 and 65535"));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::invalid_config("server.max_upload_bytes must be positive"));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7860
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

/// Cross-origin policy
///
/// The default admits any origin. Operators exposing the service beyond a
/// trusted network should list their front-end origins explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorsConfig {
    /// Allowed origins, or `["*"]` for any
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Send `Access-Control-Allow-Credentials: true`
    #[serde(default)]
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allow_credentials: false,
        }
    }
}

impl CorsConfig {
    /// Returns true if any origin is admitted
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == ANY_ORIGIN)
    }

    fn validate(&self) -> Result<()> {
        if self.allowed_origins.is_empty() {
            return Err(Error::invalid_config("cors.allowed_origins must not be empty")
                .with_suggestion("Use [\"*\"] to admit every origin"));
        }
        if self.allow_credentials && self.allows_any_origin() {
            return Err(Error::invalid_config(
                "cors.allow_credentials cannot be combined with a wildcard origin",
            )
            .with_suggestion("List the front-end origins explicitly"));
        }
        Ok(())
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec![ANY_ORIGIN.to_string()]
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of compact text
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
