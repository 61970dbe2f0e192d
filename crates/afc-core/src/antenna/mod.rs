//! # Antenna Pattern Resolver
//!
//! Discrimination gain of an FS receive antenna toward an interferer, and
//! the AP's own outbound discrimination.
//!
//! Pattern precedence for FS antennas:
//!
//! 1. Measured pattern from the [`AntennaLibrary`], by model name
//! 2. FCC category A/B envelope, when a category is declared and the
//!    peak gain reaches `antenna.low_angle_gain_threshold_dbi`
//! 3. Broad pattern by gain class: omni below
//!    `antenna.omni_gain_threshold_dbi`, else ITU-R F.1245 or F.699
//!
//! A declared model with no measured pattern falls back to the broad
//! pattern; [`AntennaResolver::audit`] records that as a data-quality event.
//!
//! ## Example
//!
//! ```rust
//! use afc_core::antenna::{AntennaLibrary, AntennaResolver, FsAntenna, PatternSource};
//! use afc_core::config::AntennaConfig;
//! use afc_core::observe::DataQuality;
//!
//! let config = AntennaConfig::default();
//! let library = AntennaLibrary::new();
//! let quality = DataQuality::new();
//! let resolver = AntennaResolver::new(&config, &library, &quality);
//!
//! let dish = FsAntenna::generic(38.0);
//! let d = resolver.discrimination(&dish, 20.0, 6175.0, 50_000.0);
//! assert_eq!(d.source, PatternSource::F1245);
//! assert!(d.gain_dbi < 38.0);
//! assert_eq!(d.near_field_adjustment_db, 0.0);
//! ```

pub mod library;
pub mod near_field;
pub mod pattern;
pub mod repeater;

pub use library::{AntennaLibrary, PatternTable};
pub use near_field::{far_field_distance_m, NearFieldTable};
pub use pattern::AntennaCategory;

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::config::{AntennaConfig, BroadPattern};
use crate::coordinates::SPEED_OF_LIGHT;
use crate::observe::DataQuality;

/// Wavelength in meters for a frequency in MHz
pub fn wavelength_m(frequency_mhz: f64) -> f64 {
    SPEED_OF_LIGHT / (frequency_mhz * 1e6)
}

/// FS antenna as declared in the license record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsAntenna {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub category: AntennaCategory,
    /// Peak gain (dBi)
    pub gain_dbi: f64,
    #[serde(default)]
    pub diameter_m: Option<f64>,
    /// Aperture efficiency in (0, 1]
    #[serde(default)]
    pub efficiency: Option<f64>,
}

impl FsAntenna {
    /// Undeclared model and category
    pub fn generic(gain_dbi: f64) -> Self {
        Self {
            model: None,
            category: AntennaCategory::Unknown,
            gain_dbi,
            diameter_m: None,
            efficiency: None,
        }
    }

    /// Declared model name, if any non-blank one is present
    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }

    /// Declared diameter, or the one implied by `G = η·(πD/λ)²`
    pub fn diameter_m(&self, wavelength_m: f64, efficiency: f64) -> f64 {
        self.diameter_m.filter(|d| *d > 0.0).unwrap_or_else(|| {
            let g = 10.0_f64.powf(self.gain_dbi / 10.0);
            wavelength_m / PI * (g / efficiency).sqrt()
        })
    }
}

/// Which pattern produced a discrimination value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternSource {
    Measured,
    LowAngle,
    F1245,
    F699,
    Omni,
}

/// Receive gain toward an interferer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Discrimination {
    /// Far-field gain toward the interferer (dBi)
    pub gain_dbi: f64,
    /// Near-field correction (≤ 0 dB)
    pub near_field_adjustment_db: f64,
    pub source: PatternSource,
}

impl Discrimination {
    pub fn effective_gain_dbi(&self) -> f64 {
        self.gain_dbi + self.near_field_adjustment_db
    }
}

/// AP transmit antenna
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceAntenna {
    Omni,
    Directional {
        boresight_azimuth_deg: f64,
        #[serde(default)]
        boresight_elevation_deg: f64,
        /// `(off_axis_deg, relative_gain_db)` pairs
        pattern: PatternTable,
    },
}

impl Default for DeviceAntenna {
    fn default() -> Self {
        DeviceAntenna::Omni
    }
}

impl DeviceAntenna {
    /// Gain relative to peak at an off-axis angle (≤ 0 dB)
    pub fn relative_gain_db(&self, off_axis_deg: f64) -> f64 {
        match self {
            DeviceAntenna::Omni => 0.0,
            DeviceAntenna::Directional { pattern, .. } => pattern.relative_gain_db(off_axis_deg).min(0.0),
        }
    }

    /// Relative gain toward a direction given as azimuth/elevation from the AP
    pub fn relative_gain_toward(&self, azimuth_deg: f64, elevation_deg: f64) -> f64 {
        match self {
            DeviceAntenna::Omni => 0.0,
            DeviceAntenna::Directional {
                boresight_azimuth_deg,
                boresight_elevation_deg,
                ..
            } => {
                let off = angle_between_deg(
                    *boresight_azimuth_deg,
                    *boresight_elevation_deg,
                    azimuth_deg,
                    elevation_deg,
                );
                self.relative_gain_db(off)
            }
        }
    }
}

/// Great-circle angle between two (azimuth, elevation) directions
pub fn angle_between_deg(az1_deg: f64, el1_deg: f64, az2_deg: f64, el2_deg: f64) -> f64 {
    let (el1, el2) = (el1_deg.to_radians(), el2_deg.to_radians());
    let daz = (az2_deg - az1_deg).to_radians();
    let cos = el1.sin() * el2.sin() + el1.cos() * el2.cos() * daz.cos();
    cos.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Resolves FS antenna discrimination for one request
#[derive(Clone, Copy)]
pub struct AntennaResolver<'a> {
    config: &'a AntennaConfig,
    library: &'a AntennaLibrary,
    quality: &'a DataQuality,
}

impl<'a> AntennaResolver<'a> {
    pub fn new(config: &'a AntennaConfig, library: &'a AntennaLibrary, quality: &'a DataQuality) -> Self {
        Self {
            config,
            library,
            quality,
        }
    }

    /// Record a data-quality event if the antenna declares a model with no
    /// measured pattern. Returns whether a measured pattern is available.
    pub fn audit(&self, link_id: &str, antenna: &FsAntenna) -> bool {
        match antenna.model_name() {
            Some(model) if self.library.pattern(model).is_none() => {
                self.quality.missing_antenna_patterns.inc();
                tracing::warn!(
                    link = link_id,
                    model,
                    "no measured pattern for antenna model, using broad category pattern"
                );
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Receive discrimination toward an interferer `distance_m` away and
    /// `off_axis_deg` off boresight
    pub fn discrimination(
        &self,
        antenna: &FsAntenna,
        off_axis_deg: f64,
        frequency_mhz: f64,
        distance_m: f64,
    ) -> Discrimination {
        let (gain_dbi, source) = self.pattern_gain(antenna, off_axis_deg);
        Discrimination {
            gain_dbi,
            near_field_adjustment_db: self.near_field_adjustment_db(antenna, off_axis_deg, frequency_mhz, distance_m),
            source,
        }
    }

    /// Far-field gain by pattern precedence
    pub fn pattern_gain(&self, antenna: &FsAntenna, off_axis_deg: f64) -> (f64, PatternSource) {
        if let Some(model) = antenna.model_name() {
            match self.library.pattern(model) {
                Some(table) => {
                    return (antenna.gain_dbi + table.relative_gain_db(off_axis_deg), PatternSource::Measured);
                }
                None => return self.broad_gain(antenna.gain_dbi, off_axis_deg),
            }
        }

        if antenna.category != AntennaCategory::Unknown
            && antenna.gain_dbi >= self.config.low_angle_gain_threshold_dbi
        {
            let g = pattern::category_envelope_gain_dbi(antenna.gain_dbi, antenna.category, off_axis_deg);
            return (g, PatternSource::LowAngle);
        }

        self.broad_gain(antenna.gain_dbi, off_axis_deg)
    }

    /// Broad category pattern by gain class
    pub fn broad_gain(&self, peak_gain_dbi: f64, off_axis_deg: f64) -> (f64, PatternSource) {
        if peak_gain_dbi < self.config.omni_gain_threshold_dbi {
            return (peak_gain_dbi, PatternSource::Omni);
        }
        match self.config.broad_pattern {
            BroadPattern::F1245 => (pattern::f1245_gain_dbi(peak_gain_dbi, off_axis_deg), PatternSource::F1245),
            BroadPattern::F699 => (pattern::f699_gain_dbi(peak_gain_dbi, off_axis_deg), PatternSource::F699),
        }
    }

    /// Near-field correction (≤ 0 dB); 0 when disabled, out of angle,
    /// omni, or at/after the far-field distance
    pub fn near_field_adjustment_db(
        &self,
        antenna: &FsAntenna,
        off_axis_deg: f64,
        frequency_mhz: f64,
        distance_m: f64,
    ) -> f64 {
        let nf = &self.config.near_field;
        if !nf.enabled
            || off_axis_deg.abs() > nf.max_off_axis_deg
            || antenna.gain_dbi < self.config.omni_gain_threshold_dbi
        {
            return 0.0;
        }
        let lambda = wavelength_m(frequency_mhz);
        let eta = antenna
            .efficiency
            .filter(|e| *e > 0.0 && *e <= 1.0)
            .unwrap_or(nf.default_efficiency);
        let far_field = far_field_distance_m(antenna.diameter_m(lambda, eta), lambda);
        if distance_m >= far_field {
            return 0.0;
        }
        self.library.near_field().adjustment_db(distance_m / far_field, eta)
    }
}
