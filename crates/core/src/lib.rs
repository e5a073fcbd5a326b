//! Core utilities for the MedPhase image service
//!
//! This crate provides the pieces shared by the server and the CLI:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions,
//!   plus the mapping from error code to HTTP status class
//! - **Configuration**: TOML-based startup configuration with environment
//!   overrides and validation
//!
//! # Example
//!
//! ```rust,no_run
//! use medphase_core::config::Config;
//!
//! let config = Config::load(None).expect("invalid configuration");
//! println!("listening on {}", config.schema.server.bind_address());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema, CorsConfig, LoggingConfig, ServerConfig};
    pub use crate::error::{exit_codes, Error, ErrorCode, ErrorReport, Result, ResultExt};
}
