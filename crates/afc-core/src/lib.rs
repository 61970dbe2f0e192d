//! # AFC Core
//!
//! Physics and data-access layer of the 6 GHz automated frequency
//! coordination engine.
//!
//! ## Overview
//!
//! - **Geodesy**: great-circle and ECEF helpers, polygons, look angles
//! - **Channel plan**: 6 GHz operating classes and frequency ranges
//! - **Terrain**: the [`terrain::TerrainSource`] oracle with flat and raster
//!   implementations and documented fallbacks
//! - **Antennas**: FS discrimination patterns, near-field adjustment,
//!   passive repeater gains, AP antenna patterns
//! - **Propagation**: free space, WINNER-II, delta-Bullington diffraction,
//!   clutter and building entry loss
//! - **Link budget**: dB helpers, coupling budget, emission mask, closed-form
//!   power limits
//! - **Configuration**, **errors** and **observability** shared by the
//!   engine and its harnesses
//!
//! ## Signal Flow
//!
//! ```text
//! AP ──path loss──▶ (repeater gains) ──▶ FS antenna discrimination ──▶ I/N
//! ```

pub mod antenna;
pub mod channel_plan;
pub mod config;
pub mod coordinates;
pub mod error;
pub mod link_budget;
pub mod observe;
pub mod propagation;
pub mod stats;
pub mod terrain;

// Re-export main types
pub use channel_plan::{Channel, FrequencyRange};
pub use config::AfcConfig;
pub use coordinates::{GeoPoint, GeoPolygon, LlaPosition};
pub use error::{AfcError, AfcResult, ComputationError, ConfigError, ErrorKind, GeometryError, RejectReason};
pub use observe::{DataQuality, DataQualityReport};
pub use terrain::{FlatTerrain, Morphology, RasterTerrain, TerrainSource};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::antenna::{AntennaLibrary, DeviceAntenna, FsAntenna};
    pub use crate::channel_plan::{Channel, FrequencyRange};
    pub use crate::config::AfcConfig;
    pub use crate::coordinates::{GeoPoint, GeoPolygon, LlaPosition};
    pub use crate::error::{AfcError, AfcResult};
    pub use crate::propagation::{PathEndpoint, PropagationEngine};
    pub use crate::terrain::{TerrainQuery, TerrainSource};
}
