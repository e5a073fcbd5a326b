//! Error types for the image crate.

use crate::ImageFormat;
use medphase_core::{Error as CoreError, ErrorCode};
use thiserror::Error;

/// Result type alias for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur while decoding, filtering or encoding.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Zero-byte payload
    #[error("Invalid image file: empty payload")]
    EmptyInput,

    /// Unknown image format
    #[error("Invalid image file: unknown image format")]
    UnknownFormat,

    /// Recognised container that this build cannot decode
    #[error("Invalid image file: {0:?} images are not supported")]
    UnsupportedFormat(ImageFormat),

    /// Invalid image data
    #[error("Invalid image file: {0}")]
    InvalidData(String),

    /// The codec rejected the bytes
    #[error("Invalid image file: {0}")]
    Decode(#[source] image::ImageError),

    /// The PNG codec failed
    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// The PNG codec produced no bytes
    #[error("Failed to encode image: encoder produced no output")]
    EmptyOutput,
}

impl ImageError {
    /// Returns true if the input bytes are at fault
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            ImageError::EmptyInput
                | ImageError::UnknownFormat
                | ImageError::UnsupportedFormat(_)
                | ImageError::InvalidData(_)
                | ImageError::Decode(_)
        )
    }

    /// Returns true if output could not be produced
    pub fn is_encode_error(&self) -> bool {
        matches!(self, ImageError::Encode(_) | ImageError::EmptyOutput)
    }

    /// Error code used when this error leaves the crate
    pub fn code(&self) -> ErrorCode {
        if self.is_decode_error() {
            ErrorCode::DecodeFailed
        } else {
            ErrorCode::EncodeFailed
        }
    }
}

impl From<ImageError> for CoreError {
    fn from(err: ImageError) -> Self {
        CoreError::new(err.code(), err.to_string()).with_source(err)
    }
}
