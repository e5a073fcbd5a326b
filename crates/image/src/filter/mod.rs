//! Phase selection and the filters behind each phase.
//!
//! A [`Phase`] is a closed set: adding a third phase means adding a variant
//! and the compiler points at every match that must learn about it.

mod blur;
mod clahe;

pub use blur::GaussianSmoother;
pub use clahe::{Clahe, ContrastEnhancer};

use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A filter applied for one acquisition phase.
pub trait PhaseFilter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Produce a filtered copy with the same dimensions.
    fn apply(&self, image: &RgbImage) -> RgbImage;
}

/// Contrast phase of the scan, selecting which filter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Contrast enhancement (CLAHE on lightness)
    Arterial,
    /// Gaussian smoothing
    Venous,
}

impl Phase {
    /// Every supported phase
    pub const ALL: [Phase; 2] = [Phase::Arterial, Phase::Venous];

    /// Wire name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Arterial => "arterial",
            Phase::Venous => "venous",
        }
    }

    /// Human description of what the phase does
    pub fn describe(&self) -> &'static str {
        match self {
            Phase::Arterial => "contrast enhancement",
            Phase::Venous => "smoothing",
        }
    }

    /// The filter this phase dispatches to
    pub fn filter(self) -> Box<dyn PhaseFilter> {
        match self {
            Phase::Arterial => Box::new(ContrastEnhancer::default()),
            Phase::Venous => Box::new(GaussianSmoother::default()),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase label that is not one of the supported names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid phase {0:?}. Must be 'arterial' or 'venous'")]
pub struct ParsePhaseError(pub String);

impl FromStr for Phase {
    type Err = ParsePhaseError;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arterial" => Ok(Phase::Arterial),
            "venous" => Ok(Phase::Venous),
            other => Err(ParsePhaseError(other.to_string())),
        }
    }
}
