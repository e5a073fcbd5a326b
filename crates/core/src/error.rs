//! Error handling with codes, context and recovery suggestions
//!
//! Every failure that leaves the image pipeline or the HTTP layer carries an
//! [`ErrorCode`]. The code decides the response class: validation and decode
//! problems are the client's fault, everything else is ours.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // General errors (1xxx)
    /// Unexpected internal fault
    Internal = 1001,

    // IO errors (2xxx)
    /// Generic IO failure
    IoError = 2000,
    /// File does not exist
    FileNotFound = 2001,
    /// File exists but cannot be read
    PermissionDenied = 2002,

    // Configuration errors (3xxx)
    /// Generic configuration failure
    ConfigError = 3000,
    /// Configuration file does not exist
    ConfigNotFound = 3001,
    /// Configuration file is not valid TOML
    ConfigParseError = 3002,
    /// Configuration file has the wrong shape
    ConfigValidationError = 3003,
    /// A configuration value is out of range
    InvalidConfigValue = 3004,

    // Validation errors (4xxx)
    /// Phase is neither `arterial` nor `venous`
    InvalidPhase = 4001,
    /// Upload is not declared as an image
    UnsupportedMediaType = 4002,
    /// A required form part is absent
    MissingField = 4003,
    /// Body is not a readable multipart form
    MalformedRequest = 4004,
    /// Body exceeds the upload limit
    PayloadTooLarge = 4005,

    // Image errors (5xxx)
    /// Bytes could not be decoded as an image
    DecodeFailed = 5001,
    /// Result could not be encoded as PNG
    EncodeFailed = 5002,

    // Server errors (6xxx)
    /// HTTP server failure
    ServerError = 6000,
    /// Listener could not bind its address
    BindFailed = 6001,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "General",
            2 => "IO",
            3 => "Configuration",
            4 => "Validation",
            5 => "Image",
            6 => "Server",
            _ => "Unknown",
        }
    }

    /// HTTP status code for a response carrying this error.
    ///
    /// Request validation and undecodable uploads are client errors; an
    /// oversized body gets its own status; the rest are server faults.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::PayloadTooLarge => 413,
            ErrorCode::DecodeFailed => 400,
            code if code.code() / 1000 == 4 => 400,
            _ => 500,
        }
    }

    /// Returns true if the caller, not the service, is responsible
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.http_status())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Main error type with rich context
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// HTTP status for this error, see [`ErrorCode::http_status`]
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Convert to a serializable report
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code,
            code_str: self.code.to_string(),
            category: self.code.category().to_string(),
            message: self.message.clone(),
            context: self.context.clone(),
            suggestion: self.suggestion.clone(),
            source: self.source.as_ref().map(|e| e.to_string()),
        }
    }

    // Convenience constructors

    /// Unclassified failure inside the service
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Generic configuration failure
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Explicitly requested configuration file does not exist
    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create a medphase.toml file or use --config to specify a path")
    }

    /// Configuration parsed but holds an unusable value
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigValidationError, message)
    }

    /// Phase label outside the supported set
    pub fn invalid_phase() -> Self {
        Self::new(
            ErrorCode::InvalidPhase,
            "Invalid phase. Must be 'arterial' or 'venous'",
        )
    }

    /// Upload without an `image/*` media type
    pub fn unsupported_media_type() -> Self {
        Self::new(ErrorCode::UnsupportedMediaType, "File must be an image (JPG/PNG)")
    }

    /// Required multipart field absent
    pub fn missing_field(name: &str) -> Self {
        Self::new(ErrorCode::MissingField, format!("Missing required field: {}", name))
    }

    /// Request body could not be parsed
    pub fn malformed_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedRequest, message)
    }

    /// Request body exceeded the configured limit
    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            ErrorCode::PayloadTooLarge,
            format!("Upload exceeds the {} byte limit", limit),
        )
    }

    /// Listener could not be opened
    pub fn bind_failed(address: &str) -> Self {
        Self::new(ErrorCode::BindFailed, format!("Failed to bind {}", address))
            .with_suggestion("Choose another port with --port or MEDPHASE_PORT")
    }
}

/// Serializable error report, printed by the CLI with `--json-errors`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Error code
    pub code: ErrorCode,
    /// Code rendered as `E####`
    pub code_str: String,
    /// Category name of the code
    pub category: String,
    /// Human-readable message
    pub message: String,
    /// Additional context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Recovery suggestion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Source error, rendered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for CLI commands
pub mod exit_codes {
    /// Command completed
    pub const SUCCESS: i32 = 0;
    /// Any other failure
    pub const FAILURE: i32 = 1;
    /// Bad input from the caller
    pub const VALIDATION_ERROR: i32 = 2;
    /// Configuration could not be loaded
    pub const CONFIG_ERROR: i32 = 3;
    /// Image could not be decoded or encoded
    pub const IMAGE_ERROR: i32 = 4;
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("TOML parse error: {}", err))
            .with_source(err)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Attach context to the error, if any
    fn context(self, context: impl Into<String>) -> Result<T>;
    /// Attach a recovery suggestion to the error, if any
    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_suggestion(suggestion))
    }
}
