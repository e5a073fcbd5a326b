//! Lossless PNG output.

use crate::{ImageError, Result};
use image::{ImageOutputFormat, RgbImage};
use std::io::Cursor;

/// Encode an RGB buffer as PNG bytes.
///
/// Never returns an empty buffer: a codec that writes nothing is reported
/// as [`ImageError::EmptyOutput`].
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .map_err(ImageError::Encode)?;

    let bytes = buffer.into_inner();
    if bytes.is_empty() {
        return Err(ImageError::EmptyOutput);
    }
    Ok(bytes)
}
