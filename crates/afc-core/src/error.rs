//! AFC error types
//!
//! Errors are split the way callers need to react to them: request-level
//! rejections (bad geometry, boundary or region denial), computation
//! defects (non-finite link budgets), cancellation, and configuration
//! problems. Data-quality fallbacks are not errors; they are counted in
//! [`crate::observe::DataQuality`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for AFC operations
pub type AfcResult<T> = Result<T, AfcError>;

/// Machine-readable reason a request was rejected before computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    /// AP location lies outside the geographic boundary of its ruleset
    OutsideBoundary,
    /// AP location lies inside a region on the deny list
    DeniedRegion,
    /// A mandatory request field is missing or malformed
    MissingField,
    /// Requested channel or frequency is not part of the band plan
    UnsupportedSpectrum,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::OutsideBoundary => write!(f, "outside ruleset boundary"),
            RejectReason::DeniedRegion => write!(f, "denied region"),
            RejectReason::MissingField => write!(f, "missing field"),
            RejectReason::UnsupportedSpectrum => write!(f, "unsupported spectrum"),
        }
    }
}

/// Failures while expanding the AP uncertainty volume into scan points
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Ellipse minor axis exceeds its major axis
    #[error("degenerate ellipse: semi-minor {minor_m} m exceeds semi-major {major_m} m")]
    DegenerateEllipse { major_m: f64, minor_m: f64 },

    /// An axis or vector length is zero, negative or not finite
    #[error("invalid {what}: {value}")]
    InvalidLength { what: &'static str, value: f64 },

    /// Polygon has fewer than three distinct vertices
    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// Latitude or longitude out of range
    #[error("invalid coordinate ({lat_deg}, {lon_deg})")]
    InvalidCoordinate { lat_deg: f64, lon_deg: f64 },

    /// Height uncertainty is negative or not finite
    #[error("invalid height uncertainty: {0} m")]
    NegativeUncertainty(f64),

    /// Every candidate point was discarded by the minimum-height policy
    #[error("no valid scan point: all {discarded} candidates below {min_agl_m} m AGL")]
    NoValidPoints { discarded: usize, min_agl_m: f64 },

    /// Rasterised shape would exceed the configured point budget
    #[error("uncertainty region expands to {count} points (limit {limit})")]
    TooManyPoints { count: usize, limit: usize },
}

/// Arithmetic defects in the link budget
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputationError {
    /// Path loss was zero, negative or not finite
    #[error("invalid path loss {value_db} dB toward incumbent {incumbent}")]
    InvalidPathLoss { incumbent: String, value_db: f64 },

    /// A solved power bound was not finite
    #[error("non-finite power bound for {unit} from incumbent {incumbent}")]
    NonFiniteBound { incumbent: String, unit: String },

    /// EIRP and PSD accounting disagree for the same unit
    #[error("power accounting mismatch for {unit}: eirp {eirp_dbm} dBm vs psd {psd_dbm_per_mhz} dBm/MHz over {bandwidth_mhz} MHz")]
    InconsistentAccounting {
        unit: String,
        eirp_dbm: f64,
        psd_dbm_per_mhz: f64,
        bandwidth_mhz: f64,
    },
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("config not found: {0}")]
    NotFound(String),

    /// Failed to read configuration file
    #[error("failed to read config: {0}")]
    ReadError(String),

    /// Failed to parse configuration
    #[error("failed to parse config: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("invalid config: {0}")]
    ValidationError(String),
}

/// Top-level error returned by an evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AfcError {
    /// Uncertainty volume could not be expanded
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// Request rejected before any computation
    #[error("request rejected ({reason}): {detail}")]
    Rejected { reason: RejectReason, detail: String },

    /// Request is structurally invalid
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No configuration installed for the request's ruleset
    #[error("unknown ruleset '{0}'")]
    UnknownRuleset(String),

    /// Modelling defect; never silently clamped
    #[error("internal computation error: {0}")]
    Computation(#[from] ComputationError),

    /// Deadline exceeded or caller cancelled
    #[error("evaluation cancelled after {completed} of {total} scan points")]
    Cancelled { completed: usize, total: usize },

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Coarse error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Request,
    Computation,
    Cancelled,
    Config,
}

impl AfcError {
    /// Shorthand for a rejection with a reason and detail message
    pub fn rejected(reason: RejectReason, detail: impl Into<String>) -> Self {
        AfcError::Rejected {
            reason,
            detail: detail.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AfcError::Geometry(_)
            | AfcError::Rejected { .. }
            | AfcError::InvalidRequest(_)
            | AfcError::UnknownRuleset(_) => ErrorKind::Request,
            AfcError::Computation(_) => ErrorKind::Computation,
            AfcError::Cancelled { .. } => ErrorKind::Cancelled,
            AfcError::Config(_) => ErrorKind::Config,
        }
    }

    /// Check if this is a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AfcError::Cancelled { .. })
    }

    /// Rejection reason, if this is a request-level rejection
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            AfcError::Rejected { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
