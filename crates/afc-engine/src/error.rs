//! Errors raised while loading incumbent and terrain data

use thiserror::Error;

/// Result type for dataset loading and index construction
pub type DataResult<T> = Result<T, DataError>;

#[derive(Error, Debug)]
pub enum DataError {
    /// Link record fails structural validation
    #[error("invalid link {id}: {reason}")]
    InvalidLink { id: String, reason: String },

    /// Two records share an id
    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// Exclusion zone fails structural validation
    #[error("invalid exclusion zone {id}: {reason}")]
    InvalidZone { id: String, reason: String },

    /// Terrain grid dimensions disagree with its data
    #[error("invalid terrain: {0}")]
    InvalidTerrain(String),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    pub(crate) fn link(id: &str, reason: impl Into<String>) -> Self {
        DataError::InvalidLink {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn zone(id: &str, reason: impl Into<String>) -> Self {
        DataError::InvalidZone {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}
