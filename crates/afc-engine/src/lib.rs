//! # AFC Engine
//!
//! Computes the maximum permissible EIRP or PSD per 6 GHz channel or
//! frequency slice for an access point with an uncertain location, so
//! that no protected fixed-service receiver sees I/N above the regulatory
//! threshold and no radio-astronomy exclusion zone is entered.
//!
//! ## Pipeline
//!
//! ```text
//! ApRequest
//!   │ validate, boundary / deny-region pre-checks   (assembler)
//!   ▼
//! scan points ──(rayon)──▶ victims                  (scan, incumbent)
//!                            │ path loss, antennas  (afc_core)
//!                            ▼
//!                     per-point PSD limits          (solver)
//!                            │ sequential min-reduction
//!                            ▼
//!                 ceiling, post-solve pipeline, overrides
//!                            ▼
//!                   AvailabilityResponse
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use afc_engine::prelude::*;
//! use afc_engine::dataset::Dataset;
//!
//! let engine = AfcEngine::with_config(AfcConfig::default()).unwrap();
//! let snapshot = Dataset::load("dataset.json".as_ref()).unwrap().into_snapshot().unwrap();
//! let request: ApRequest = serde_json::from_str("...").unwrap();
//! let response = engine.evaluate(&request, &snapshot).unwrap();
//! println!("{} channels", response.channels.len());
//! ```

pub mod assembler;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod incumbent;
pub mod request;
pub mod response;
pub mod scan;
pub mod snapshot;
pub mod solver;

// Re-export main types
pub use engine::{evaluate, AfcEngine, EvaluateOptions};
pub use error::{DataError, DataResult};
pub use incumbent::{ExclusionZone, FsLink, IncumbentIndex};
pub use request::ApRequest;
pub use response::{Availability, AvailabilityResponse, UnavailableReason};
pub use snapshot::DataSnapshot;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::engine::{evaluate, AfcEngine, EvaluateOptions};
    pub use crate::incumbent::{ExclusionZone, FsLink, IncumbentIndex, PassiveRepeater, RepeaterKind};
    pub use crate::request::{ApHeight, ApRequest, ChannelInquiry, HeightReference, LocationUncertainty};
    pub use crate::response::{Availability, AvailabilityResponse, UnavailableReason};
    pub use crate::snapshot::DataSnapshot;
    pub use afc_core::prelude::*;
}
