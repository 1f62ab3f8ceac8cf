//! Error types for showerreco.
//!
//! Errors come in two tiers. A [`ConfigError`] means the pipeline itself is
//! misconfigured and processing must stop. A [`CandidateError`] means the
//! current shower candidate cannot be reconstructed and should be skipped.

use thiserror::Error;

/// Result type alias for showerreco operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Pitch correction requested without a spatial space charge provider.
    #[error("space charge pitch correction requested but spatial corrections are not enabled")]
    SpatialCorrectionDisabled,

    /// Field correction requested without an E-field space charge provider.
    #[error("space charge E-field correction requested but E-field corrections are not enabled")]
    EFieldCorrectionDisabled,

    /// Space charge correction requested on uncorrected input positions.
    #[error("space charge corrections require input positions that are already corrected")]
    UncorrectedInput,

    /// RMS gradient requested with zero segments.
    #[error("cannot calculate the RMS shower gradient with 0 segments")]
    ZeroSegments,

    /// A numeric parameter is out of range.
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// Recoverable per-candidate failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CandidateError {
    /// A required element has not been set in the element store.
    #[error("element '{0}' is not set")]
    MissingElement(String),

    /// An element exists but holds a different type.
    #[error("element '{label}' is not a {expected}")]
    ElementType {
        label: String,
        expected: &'static str,
    },

    /// The candidate has no space points.
    #[error("no space points in the candidate")]
    NoSpacePoints,

    /// Hit ordering was given no hits.
    #[error("no hits to order")]
    NoHits,

    /// Every hit was rejected in every plane.
    #[error("no hits in any plane after filtering")]
    NoHitsInAnyPlane,

    /// Charge weighted centroid with no charge.
    #[error("total charge is zero, cannot weight the centroid")]
    ZeroTotalCharge,
}

/// Top-level error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Fatal configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Recoverable candidate failure.
    #[error("candidate error: {0}")]
    Candidate(#[from] CandidateError),
}

impl Error {
    /// Returns true if the error should abort the pipeline rather than skip
    /// the current candidate.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
