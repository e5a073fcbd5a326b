//! Phase filters for medical images.
//!
//! This crate provides:
//! - Format detection from magic bytes
//! - Decoding of uploads into a normalised RGB buffer
//! - The two phase filters: CLAHE contrast enhancement (arterial) and
//!   15x15 Gaussian smoothing (venous)
//! - Lossless PNG encoding
//! - A single-shot pipeline tying the stages together
//!
//! ```no_run
//! use medphase_image::{process, Phase};
//!
//! let upload = std::fs::read("scan.jpg").unwrap();
//! let output = process(&upload, Phase::Arterial).unwrap();
//! std::fs::write("processed_scan.png", &output.png).unwrap();
//! ```

#![warn(missing_docs)]

pub mod color;
mod decode;
mod detect;
mod encode;
mod error;
pub mod filter;
mod metadata;
mod pipeline;

pub use decode::{decode, DecodedImage};
pub use detect::{detect_format, ImageFormat};
pub use encode::encode_png;
pub use error::{ImageError, Result};
pub use filter::{ContrastEnhancer, GaussianSmoother, ParsePhaseError, Phase, PhaseFilter};
pub use metadata::{extract_metadata, ImageMetadata};
pub use pipeline::{process, processed_filename, ProcessedImage};

/// Semver requirement on the `image` codec crate, as written in the
/// workspace manifest. This is not the resolved version from the lockfile.
pub const CODEC_VERSION_REQ: &str = "0.24";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_version_req_matches_manifest() {
        let manifest = include_str!("../../../Cargo.toml");
        let expected = format!("image = {{ version = \"{}\"", CODEC_VERSION_REQ);
        assert!(manifest.contains(&expected), "workspace manifest does not pin {expected}");
    }
}
