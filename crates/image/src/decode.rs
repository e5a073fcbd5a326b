//! Upload decoding into a normalised RGB buffer.

use crate::{detect_format, ImageError, ImageFormat, Result};
use image::RgbImage;

/// An upload decoded to 8-bit RGB.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Pixels in R, G, B order
    pub pixels: RgbImage,
    /// Container the bytes arrived in
    pub format: ImageFormat,
}

/// Decode raw upload bytes.
///
/// Palette, grayscale, alpha and 16-bit sources are all converted to 8-bit
/// RGB; alpha is discarded rather than composited.
pub fn decode(data: &[u8]) -> Result<DecodedImage> {
    let format = detect_format(data)?;
    if !format.is_decodable() {
        return Err(ImageError::UnsupportedFormat(format));
    }
    let codec = format.codec().ok_or(ImageError::UnsupportedFormat(format))?;

    let image = image::load_from_memory_with_format(data, codec).map_err(ImageError::Decode)?;
    let pixels = image.to_rgb8();

    tracing::debug!(
        format = ?format,
        color = ?image.color(),
        width = pixels.width(),
        height = pixels.height(),
        "Image decoded"
    );

    Ok(DecodedImage { pixels, format })
}
