//! # Propagation Model Engine
//!
//! Path loss between an AP and an incumbent endpoint. The model is chosen
//! once per segment from [`PropagationConfig`] and carried as a
//! [`PathModel`] variant holding only the parameters that model needs:
//!
//! | distance                     | model                               |
//! |------------------------------|-------------------------------------|
//! | `< free_space_max_m`         | free space                          |
//! | `< statistical_max_m`        | WINNER-II by AP morphology          |
//! | beyond                       | delta-Bullington terrain diffraction |
//!
//! Terrain-diffraction paths may add P.2108 clutter at the AP end and
//! P.452 height-gain clutter at the FS end, and are never reported below
//! free space.

pub mod atmosphere;
pub mod building;
pub mod clutter;
pub mod diffraction;
pub mod free_space;
pub mod winner2;

pub use building::building_entry_loss_db;
pub use diffraction::{DiffractionLoss, GroundConstants};
pub use free_space::free_space_path_loss_db;
pub use winner2::Winner2Scenario;

use serde::{Deserialize, Serialize};

use crate::config::{LosMode, PropagationConfig};
use crate::coordinates::{GeoPoint, LlaPosition};
use crate::stats::normal_quantile_percent;
use crate::terrain::{Morphology, RadioClimate, TerrainProfile, TerrainQuery, TerrainSample};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One end of a path: horizontal position and antenna height above ground
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathEndpoint {
    pub point: GeoPoint,
    pub height_agl_m: f64,
}

impl PathEndpoint {
    pub fn new(point: GeoPoint, height_agl_m: f64) -> Self {
        Self { point, height_agl_m }
    }
}

/// Line-of-sight decision for the statistical model
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LosDecision {
    Los,
    Nlos,
    /// Surface data incomplete: blend by LOS probability
    Combined { p_los: f64 },
}

/// Parameters of the WINNER-II branch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Winner2Params {
    pub scenario: Winner2Scenario,
    pub los: LosDecision,
    pub percentile: f64,
}

/// Parameters of the terrain-diffraction branch, resolved for one path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffractionParams {
    pub refractivity: f64,
    pub climate: RadioClimate,
    pub ground: GroundConstants,
    pub reliability_pct: f64,
    pub confidence_pct: f64,
}

/// Model selected for one segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathModel {
    FreeSpace,
    Statistical(Winner2Params),
    TerrainDiffraction(DiffractionParams),
}

/// Which model/branch produced a path loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTag {
    FreeSpace,
    Winner2Los,
    Winner2Nlos,
    Winner2Combined,
    TerrainDiffraction,
}

impl std::fmt::Display for ModelTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ModelTag::FreeSpace => "free_space",
            ModelTag::Winner2Los => "winner2_los",
            ModelTag::Winner2Nlos => "winner2_nlos",
            ModelTag::Winner2Combined => "winner2_combined",
            ModelTag::TerrainDiffraction => "terrain_diffraction",
        };
        f.write_str(s)
    }
}

/// Path loss with a diagnostic breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathLoss {
    pub total_db: f64,
    pub model: ModelTag,
    pub free_space_db: f64,
    pub clutter_ap_db: f64,
    pub clutter_fs_db: f64,
    /// Horizontal distance between the endpoints (m)
    pub distance_m: f64,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Model dispatch over one terrain snapshot
#[derive(Clone, Copy)]
pub struct PropagationEngine<'a> {
    config: &'a PropagationConfig,
    terrain: TerrainQuery<'a>,
}

impl<'a> PropagationEngine<'a> {
    pub fn new(config: &'a PropagationConfig, terrain: TerrainQuery<'a>) -> Self {
        Self { config, terrain }
    }

    pub fn terrain(&self) -> TerrainQuery<'a> {
        self.terrain
    }

    /// Choose the model for the AP → FS segment
    pub fn select_model(
        &self,
        ap: &PathEndpoint,
        ap_sample: &TerrainSample,
        fs: &PathEndpoint,
        fs_sample: &TerrainSample,
        distance_m: f64,
    ) -> PathModel {
        let cfg = self.config;
        if distance_m < cfg.free_space_max_m {
            return PathModel::FreeSpace;
        }

        if distance_m < cfg.statistical_max_m {
            let los = self.los_decision(ap, ap_sample, fs, fs_sample, distance_m);
            return PathModel::Statistical(Winner2Params {
                scenario: Winner2Scenario::for_morphology(ap_sample.morphology),
                los,
                percentile: cfg.statistical_percentile,
            });
        }

        let diff = &cfg.diffraction;
        let midpoint = ap.point.interpolate(&fs.point, 0.5);
        let climate = self
            .terrain
            .radio_climate(&ap.point)
            .less_favorable(self.terrain.radio_climate(&fs.point));
        PathModel::TerrainDiffraction(DiffractionParams {
            refractivity: self.terrain.surface_refractivity(&midpoint, diff.default_refractivity),
            climate,
            ground: GroundConstants {
                polarization: diff.polarization,
                permittivity: diff.ground_permittivity,
                conductivity: diff.ground_conductivity,
            },
            reliability_pct: diff.reliability_pct,
            confidence_pct: diff.confidence_pct,
        })
    }

    fn los_decision(
        &self,
        ap: &PathEndpoint,
        ap_sample: &TerrainSample,
        fs: &PathEndpoint,
        fs_sample: &TerrainSample,
        distance_m: f64,
    ) -> LosDecision {
        if matches!(self.config.los_switch_height_m, Some(h) if ap.height_agl_m >= h) {
            return LosDecision::Los;
        }
        match self.config.los_mode {
            LosMode::AlwaysLos => LosDecision::Los,
            LosMode::AlwaysNlos => LosDecision::Nlos,
            LosMode::SurfaceData => {
                let step = self.config.diffraction.profile_step_m;
                let profile = self.terrain.profile(&ap.point, &fs.point, step);
                if profile.has_full_surface_coverage() {
                    let h_ap = ap_sample.terrain_m + ap.height_agl_m;
                    let h_fs = fs_sample.terrain_m + fs.height_agl_m;
                    if surface_clear(&profile, h_ap, h_fs) {
                        LosDecision::Los
                    } else {
                        LosDecision::Nlos
                    }
                } else {
                    let scenario = Winner2Scenario::for_morphology(ap_sample.morphology);
                    LosDecision::Combined {
                        p_los: winner2::los_probability(scenario, distance_m),
                    }
                }
            }
        }
    }

    /// Path loss from an AP to an FS endpoint at `frequency_mhz`
    pub fn path_loss(&self, ap: &PathEndpoint, fs: &PathEndpoint, frequency_mhz: f64) -> PathLoss {
        let ap_sample = self.terrain.point(&ap.point);
        let fs_sample = self.terrain.point(&fs.point);
        let distance_m = ap.point.distance_to(&fs.point);

        let ap_lla = ap.point.with_alt(ap_sample.terrain_m + ap.height_agl_m);
        let fs_lla = fs.point.with_alt(fs_sample.terrain_m + fs.height_agl_m);
        let free_space_db = free_space_path_loss_db(ap_lla.slant_distance_to(&fs_lla), frequency_mhz);

        let model = self.select_model(ap, &ap_sample, fs, &fs_sample, distance_m);
        let mut result = PathLoss {
            total_db: free_space_db,
            model: ModelTag::FreeSpace,
            free_space_db,
            clutter_ap_db: 0.0,
            clutter_fs_db: 0.0,
            distance_m,
        };

        match model {
            PathModel::FreeSpace => {}
            PathModel::Statistical(params) => {
                let (loss, tag) = winner2_loss_db(&params, distance_m, ap.height_agl_m, fs.height_agl_m, frequency_mhz);
                result.total_db = loss.max(free_space_db);
                result.model = tag;
            }
            PathModel::TerrainDiffraction(params) => {
                let profile = self
                    .terrain
                    .profile(&ap.point, &fs.point, self.config.diffraction.profile_step_m);
                let h_ap = ap_sample.terrain_m + ap.height_agl_m;
                let h_fs = fs_sample.terrain_m + fs.height_agl_m;
                let median = terrain_loss_db(&params, &profile, h_ap, h_fs, frequency_mhz);
                result.total_db = median.max(free_space_db);
                result.model = ModelTag::TerrainDiffraction;

                result.clutter_ap_db = self.ap_clutter_db(ap, &ap_sample, distance_m, frequency_mhz);
                result.clutter_fs_db = self.fs_clutter_db(fs, &fs_sample, distance_m, frequency_mhz);
                result.total_db += result.clutter_ap_db + result.clutter_fs_db;
            }
        }

        tracing::trace!(
            model = %result.model,
            distance_m,
            total_db = result.total_db,
            "path loss"
        );
        result
    }

    /// Free-space loss of a segment between two fixed 3-D positions
    pub fn free_space_segment(&self, a: &LlaPosition, b: &LlaPosition, frequency_mhz: f64) -> f64 {
        free_space_path_loss_db(a.slant_distance_to(b), frequency_mhz)
    }

    fn ap_clutter_db(&self, ap: &PathEndpoint, sample: &TerrainSample, distance_m: f64, frequency_mhz: f64) -> f64 {
        let c = &self.config.ap_clutter;
        let applies = c.enabled
            && ap.height_agl_m <= c.max_height_m
            && distance_m >= c.min_distance_m
            && sample.morphology != Morphology::Rural;
        if applies {
            clutter::p2108_terrestrial_db(frequency_mhz, distance_m, c.percentile)
        } else {
            0.0
        }
    }

    fn fs_clutter_db(&self, fs: &PathEndpoint, sample: &TerrainSample, distance_m: f64, frequency_mhz: f64) -> f64 {
        let c = &self.config.fs_clutter;
        let applies = c.enabled
            && fs.height_agl_m <= c.max_height_m
            && distance_m >= c.min_distance_m
            && sample.morphology != Morphology::Rural;
        if applies {
            clutter::p452_height_gain_db(frequency_mhz, fs.height_agl_m, sample.morphology)
        } else {
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Core model functions
// ---------------------------------------------------------------------------

/// Whether the straight line between the antennas clears every surface sample
pub fn surface_clear(profile: &TerrainProfile, h_start_amsl: f64, h_end_amsl: f64) -> bool {
    let d = profile.total_distance_m();
    if d <= 0.0 {
        return true;
    }
    let n = profile.distances_m.len();
    (1..n.saturating_sub(1)).all(|i| {
        let t = profile.distances_m[i] / d;
        let ray = h_start_amsl + (h_end_amsl - h_start_amsl) * t;
        let surface = profile.terrain_m[i] + profile.building_m[i].unwrap_or(0.0);
        surface < ray
    })
}

/// WINNER-II loss at the configured percentile; the higher endpoint acts
/// as the base station
pub fn winner2_loss_db(
    params: &Winner2Params,
    distance_m: f64,
    h_a: f64,
    h_b: f64,
    frequency_mhz: f64,
) -> (f64, ModelTag) {
    let (h_bs, h_ms) = if h_a >= h_b { (h_a, h_b) } else { (h_b, h_a) };
    let fc = frequency_mhz / 1000.0;
    let z = normal_quantile_percent(params.percentile);
    let los = || winner2::los(params.scenario, distance_m, h_bs, h_ms, fc).at_quantile(z);
    let nlos = || winner2::nlos(params.scenario, distance_m, h_bs, h_ms, fc).at_quantile(z);
    match params.los {
        LosDecision::Los => (los(), ModelTag::Winner2Los),
        LosDecision::Nlos => (nlos(), ModelTag::Winner2Nlos),
        LosDecision::Combined { p_los } => (winner2::combined_loss_db(los(), nlos(), p_los), ModelTag::Winner2Combined),
    }
}

/// Free space plus diffraction plus time/location variability at the
/// configured percentiles
pub fn terrain_loss_db(
    params: &DiffractionParams,
    profile: &TerrainProfile,
    h_start_amsl: f64,
    h_end_amsl: f64,
    frequency_mhz: f64,
) -> f64 {
    let d = profile.total_distance_m();
    let ae = atmosphere::effective_earth_radius_m(params.refractivity);
    let diffraction = diffraction::delta_bullington(profile, h_start_amsl, h_end_amsl, frequency_mhz, ae, &params.ground);

    let sigma_t = atmosphere::time_sigma_db(params.climate, d);
    let sigma_l = atmosphere::location_sigma_db(profile.interdecile_range_m(), d, frequency_mhz);
    let variability = normal_quantile_percent(params.reliability_pct) * sigma_t
        + normal_quantile_percent(params.confidence_pct) * sigma_l;

    let free_space = free_space_path_loss_db(d, frequency_mhz);
    (free_space + diffraction.total_db + variability).max(free_space)
}
