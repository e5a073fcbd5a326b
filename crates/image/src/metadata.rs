//! Image metadata extraction.

use crate::{detect_format, ImageError, ImageFormat, Result};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Image metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// File size in bytes
    pub size_bytes: usize,
}

impl ImageMetadata {
    /// Number of pixels
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Read dimensions from the container header without decoding pixels.
pub fn extract_metadata(data: &[u8]) -> Result<ImageMetadata> {
    let format = detect_format(data)?;
    let codec = format
        .codec()
        .filter(|_| format.is_decodable())
        .ok_or(ImageError::UnsupportedFormat(format))?;

    let (width, height) = image::io::Reader::with_format(Cursor::new(data), codec)
        .into_dimensions()
        .map_err(ImageError::Decode)?;

    Ok(ImageMetadata {
        width,
        height,
        format,
        size_bytes: data.len(),
    })
}
