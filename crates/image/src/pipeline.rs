//! Decode, filter, encode.

use crate::{decode, encode_png, ImageFormat, Phase, Result};
use std::time::Instant;

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// PNG-encoded result
    pub png: Vec<u8>,
    /// Width in pixels, same as the input
    pub width: u32,
    /// Height in pixels, same as the input
    pub height: u32,
    /// Phase that was applied
    pub phase: Phase,
    /// Container of the upload
    pub source_format: ImageFormat,
}

/// Run the whole pipeline on uploaded bytes.
///
/// The result depends only on `data` and `phase`. Errors are classified by
/// [`ImageError::is_decode_error`](crate::ImageError::is_decode_error) and
/// [`ImageError::is_encode_error`](crate::ImageError::is_encode_error).
pub fn process(data: &[u8], phase: Phase) -> Result<ProcessedImage> {
    let started = Instant::now();
    let span = tracing::debug_span!("process", %phase, size_bytes = data.len());
    let _guard = span.enter();

    let decoded = decode(data)?;
    let (width, height) = decoded.pixels.dimensions();
    tracing::info!(format = ?decoded.format, width, height, "Image loaded");

    let filter = phase.filter();
    let filtered = filter.apply(&decoded.pixels);
    tracing::info!(filter = filter.name(), "{} applied", phase.describe());

    let png = encode_png(&filtered)?;
    tracing::info!(
        output_bytes = png.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "{} phase processing completed",
        phase
    );

    Ok(ProcessedImage {
        png,
        width,
        height,
        phase,
        source_format: decoded.format,
    })
}

/// Download name for a processed upload: `processed_<name>`.
///
/// Only the last path component of `original` is kept, and characters that
/// cannot sit inside a quoted header value become `_`. A missing or empty
/// name falls back to `image`.
pub fn processed_filename(original: Option<&str>) -> String {
    let base = original
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or("image");

    let safe: String = base
        .chars()
        .map(|c| if c == ' ' || (c.is_ascii_graphic() && c != '"') { c } else { '_' })
        .collect();

    format!("processed_{}", safe)
}
