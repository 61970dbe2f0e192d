//! # Incumbent Resolver
//!
//! Protected fixed-service links, radio-astronomy exclusion zones, and the
//! logic that turns them into victims for one scan point.
//!
//! A link runs from its transmitter through an ordered chain of passive
//! repeaters (transmitter side first) to its receiver:
//!
//! ```text
//!   Tx ──▶ R1 ──▶ R2 ──▶ Rx
//! ```
//!
//! Interference can enter at the receiver itself (the *direct* victim, with
//! the dish pointed at R2) or at a repeater, which relays it down the rest
//! of the chain.

pub mod index;
pub mod resolver;

pub use index::IncumbentIndex;
pub use resolver::{IncumbentResolver, LinkGeometry, Victim, VictimKind};

use serde::{Deserialize, Serialize};

use afc_core::antenna::FsAntenna;
use afc_core::channel_plan::FrequencyRange;
use afc_core::coordinates::{GeoPoint, LlaPosition, EARTH_RADIUS_M};

use crate::error::{DataError, DataResult};
use crate::scan::ScanPoint;

/// Effective earth radius for radio-horizon distances (4/3 earth)
pub const EFFECTIVE_EARTH_RADIUS_M: f64 = EARTH_RADIUS_M * 4.0 / 3.0;

/// FS receive station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsReceiver {
    pub location: GeoPoint,
    pub height_agl_m: f64,
    pub antenna: FsAntenna,
    /// Uses `regulatory.default_feeder_loss_db` when absent
    #[serde(default)]
    pub feeder_loss_db: Option<f64>,
    /// Overrides the noise band table
    #[serde(default)]
    pub noise_dbm_per_mhz: Option<f64>,
}

/// FS transmit station
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FsTransmitter {
    pub location: GeoPoint,
    pub height_agl_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepeaterKind {
    /// Flat billboard reflector
    Reflector { width_m: f64, height_m: f64 },
    /// Two dishes joined by a waveguide
    BackToBack { gain_dbi: f64, insertion_loss_db: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassiveRepeater {
    pub id: String,
    pub location: GeoPoint,
    pub height_agl_m: f64,
    pub kind: RepeaterKind,
}

/// One licensed FS path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsLink {
    pub id: String,
    pub receiver: FsReceiver,
    pub transmitter: FsTransmitter,
    pub center_mhz: f64,
    pub bandwidth_mhz: f64,
    /// Ordered from the transmitter side to the receiver side
    #[serde(default)]
    pub repeaters: Vec<PassiveRepeater>,
}

impl FsLink {
    /// Receive band
    pub fn band(&self) -> FrequencyRange {
        FrequencyRange::centered(self.center_mhz, self.bandwidth_mhz)
    }

    /// Structural checks; a chain must resolve to exactly one transmitter
    pub fn validate(&self) -> DataResult<()> {
        let id = self.id.as_str();
        if id.trim().is_empty() {
            return Err(DataError::link(id, "empty id"));
        }
        if !self.band().is_valid() || self.bandwidth_mhz <= 0.0 {
            return Err(DataError::link(
                id,
                format!("band {} MHz / {} MHz", self.center_mhz, self.bandwidth_mhz),
            ));
        }
        if !self.receiver.antenna.gain_dbi.is_finite() {
            return Err(DataError::link(id, "receiver gain is not finite"));
        }

        let mut positions = vec![("transmitter", self.transmitter.location)];
        positions.extend(self.repeaters.iter().map(|r| (r.id.as_str(), r.location)));
        positions.push(("receiver", self.receiver.location));
        for (name, p) in &positions {
            if !p.is_valid() {
                return Err(DataError::link(id, format!("{} at invalid coordinate", name)));
            }
        }
        for pair in positions.windows(2) {
            if pair[0].1.distance_to(&pair[1].1) < 1.0 {
                return Err(DataError::link(
                    id,
                    format!("{} and {} coincide", pair[0].0, pair[1].0),
                ));
            }
        }

        for (i, r) in self.repeaters.iter().enumerate() {
            if self.repeaters[..i].iter().any(|other| other.id == r.id) {
                return Err(DataError::link(id, format!("repeater {} appears twice", r.id)));
            }
            let valid = match r.kind {
                RepeaterKind::Reflector { width_m, height_m } => width_m > 0.0 && height_m > 0.0,
                RepeaterKind::BackToBack { gain_dbi, insertion_loss_db } => {
                    gain_dbi.is_finite() && insertion_loss_db.is_finite() && insertion_loss_db >= 0.0
                }
            };
            if !valid {
                return Err(DataError::link(id, format!("repeater {} has invalid dimensions", r.id)));
            }
        }
        Ok(())
    }
}

/// Exclusion-zone shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneGeometry {
    /// Fixed-radius sphere around a point in space
    Sphere {
        center: GeoPoint,
        height_amsl_m: f64,
        radius_m: f64,
    },
    /// Radius is the sum of both radio horizons over a 4/3 earth
    HorizonDistance {
        center: GeoPoint,
        antenna_height_agl_m: f64,
    },
}

/// Radio horizon distance of an antenna `height_m` above ground
pub fn radio_horizon_m(height_m: f64) -> f64 {
    (2.0 * EFFECTIVE_EARTH_RADIUS_M * height_m.max(0.0)).sqrt()
}

/// Radio-astronomy site protected unconditionally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionZone {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub band: FrequencyRange,
    pub geometry: ZoneGeometry,
}

impl ExclusionZone {
    pub fn validate(&self) -> DataResult<()> {
        if !self.band.is_valid() {
            return Err(DataError::zone(&self.id, "invalid band"));
        }
        let ok = match self.geometry {
            ZoneGeometry::Sphere { center, radius_m, height_amsl_m } => {
                center.is_valid() && radius_m.is_finite() && radius_m > 0.0 && height_amsl_m.is_finite()
            }
            ZoneGeometry::HorizonDistance {
                center,
                antenna_height_agl_m,
            } => center.is_valid() && antenna_height_agl_m.is_finite() && antenna_height_agl_m >= 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(DataError::zone(&self.id, "invalid geometry"))
        }
    }

    /// Whether a scan point lies inside the zone
    pub fn contains(&self, point: &ScanPoint) -> bool {
        match self.geometry {
            ZoneGeometry::Sphere {
                center,
                height_amsl_m,
                radius_m,
            } => LlaPosition::new(center.lat_deg, center.lon_deg, height_amsl_m).slant_distance_to(&point.lla())
                <= radius_m,
            ZoneGeometry::HorizonDistance {
                center,
                antenna_height_agl_m,
            } => {
                let reach = radio_horizon_m(antenna_height_agl_m) + radio_horizon_m(point.height_agl_m);
                center.distance_to(&point.geo()) <= reach
            }
        }
    }
}
