//! # Configuration System
//!
//! Every policy the engine applies is carried by one immutable [`AfcConfig`]
//! per ruleset:
//!
//! - Regulatory limits (I/N threshold, EIRP/PSD ceilings and floors, noise)
//! - Scan-point generation (height policy, minimum height, grid override)
//! - Incumbent search (radius, repeater convention, inside-volume distance)
//! - Propagation model dispatch and model parameters
//! - Antenna pattern selection and near-field adjustment
//! - Response assembly (boundary, deny lists, visibility, post-solve order)
//! - Logging
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `AFC_CONFIG` environment variable
//! 2. `./afc.yaml` (current directory)
//! 3. `~/.config/afc/config.yaml` (user config)
//! 4. `/etc/afc/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! ruleset_id: US_47_CFR_PART_15_SUBPART_E
//!
//! regulatory:
//!   in_threshold_db: -6.0
//!   power_accounting: psd
//!   inside_volume:
//!     policy: low_power_ceiling
//!     eirp_dbm: 24.0
//!     psd_dbm_per_mhz: 11.0
//!
//! scan:
//!   height_policy:
//!     policy: step
//!     step_m: 2.0
//!   below_min_height: discard
//!
//! propagation:
//!   los_mode: always_nlos
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::channel_plan::FrequencyRange;
use crate::coordinates::GeoPolygon;
use crate::error::ConfigError;
use crate::observe::LogConfig;

// ---------------------------------------------------------------------------
// Policy enums
// ---------------------------------------------------------------------------

/// Output unit for channel results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerAccounting {
    /// Aggregate power over the operating channel (dBm)
    Eirp,
    /// Spectral density (dBm/MHz)
    Psd,
}

impl Default for PowerAccounting {
    fn default() -> Self {
        PowerAccounting::Eirp
    }
}

/// Handling of incumbents whose receiver lies inside the AP's own
/// uncertainty volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum InsideVolumePolicy {
    /// Overlapping units become unavailable
    Block,
    /// The incumbent is not considered
    Ignore,
    /// Overlapping units are capped at a fixed low-power ceiling
    LowPowerCeiling { eirp_dbm: f64, psd_dbm_per_mhz: f64 },
}

impl Default for InsideVolumePolicy {
    fn default() -> Self {
        InsideVolumePolicy::Block
    }
}

/// One step of the post-solve channel policy pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostSolveStep {
    InsideVolume,
    MinimumPowerFloor,
}

/// Vertical sampling of the height uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum HeightScanPolicy {
    /// Declared height only
    Fixed,
    /// Bottom and top of the uncertainty interval
    MinMax,
    /// Bottom, declared and top
    MinMidMax,
    /// Every `step_m` from bottom to top, top always included
    Step { step_m: f64 },
}

impl Default for HeightScanPolicy {
    fn default() -> Self {
        HeightScanPolicy::MinMidMax
    }
}

/// What to do with scan points below the minimum height above ground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BelowMinHeightPolicy {
    Clamp,
    Discard,
}

impl Default for BelowMinHeightPolicy {
    fn default() -> Self {
        BelowMinHeightPolicy::Clamp
    }
}

/// Which repeater of a chain is evaluated as an interference entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeaterConvention {
    /// Repeater geometrically nearest to the scan point
    NearestToAp,
    /// Repeater adjacent to the receiver
    LastInChain,
}

impl Default for RepeaterConvention {
    fn default() -> Self {
        RepeaterConvention::NearestToAp
    }
}

/// Line-of-sight decision for the statistical model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LosMode {
    AlwaysLos,
    AlwaysNlos,
    /// Decide from the surface model; LOS-probability blend where it has gaps
    SurfaceData,
}

impl Default for LosMode {
    fn default() -> Self {
        LosMode::SurfaceData
    }
}

/// Broad reference pattern for directional FS antennas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadPattern {
    #[serde(rename = "F.1245")]
    F1245,
    #[serde(rename = "F.699")]
    F699,
}

impl Default for BroadPattern {
    fn default() -> Self {
        BroadPattern::F1245
    }
}

/// Wave polarisation for the smooth-earth diffraction term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarization {
    Horizontal,
    Vertical,
}

impl Default for Polarization {
    fn default() -> Self {
        Polarization::Vertical
    }
}

/// ITU-R P.2109 building class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    Traditional,
    ThermallyEfficient,
}

/// Building entry loss applied to indoor APs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum BuildingLossModel {
    Fixed { loss_db: f64 },
    P2109 { building_type: BuildingType, probability_pct: f64 },
}

impl Default for BuildingLossModel {
    fn default() -> Self {
        BuildingLossModel::Fixed { loss_db: 20.5 }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// FS receiver noise PSD for a sub-band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseBand {
    pub low_mhz: f64,
    pub high_mhz: f64,
    pub noise_dbm_per_mhz: f64,
}

/// Regulatory limits and link-budget constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegulatoryConfig {
    /// Maximum permitted I/N at an incumbent receiver (dB)
    pub in_threshold_db: f64,
    pub max_eirp_dbm: f64,
    pub max_psd_dbm_per_mhz: f64,
    /// Units solving below these floors are dropped from the response
    pub min_eirp_dbm: f64,
    pub min_psd_dbm_per_mhz: f64,
    pub power_accounting: PowerAccounting,
    pub inside_volume: InsideVolumePolicy,
    /// FS noise PSD by sub-band, first match wins
    pub noise_bands: Vec<NoiseBand>,
    pub default_noise_dbm_per_mhz: f64,
    pub polarization_loss_db: f64,
    pub body_loss_indoor_db: f64,
    pub body_loss_outdoor_db: f64,
    pub building_loss: BuildingLossModel,
    /// Feeder loss for links that do not declare one
    pub default_feeder_loss_db: f64,
    /// Integrate the 802.11ax emission mask over the FS band for channels
    pub emission_mask: bool,
}

impl Default for RegulatoryConfig {
    fn default() -> Self {
        Self {
            in_threshold_db: -6.0,
            max_eirp_dbm: 36.0,
            max_psd_dbm_per_mhz: 23.0,
            min_eirp_dbm: 21.0,
            min_psd_dbm_per_mhz: 8.0,
            power_accounting: PowerAccounting::Eirp,
            inside_volume: InsideVolumePolicy::Block,
            noise_bands: vec![
                NoiseBand { low_mhz: 5925.0, high_mhz: 6425.0, noise_dbm_per_mhz: -110.0 },
                NoiseBand { low_mhz: 6425.0, high_mhz: 6525.0, noise_dbm_per_mhz: -109.5 },
                NoiseBand { low_mhz: 6525.0, high_mhz: 6875.0, noise_dbm_per_mhz: -109.5 },
                NoiseBand { low_mhz: 6875.0, high_mhz: 7125.0, noise_dbm_per_mhz: -109.5 },
            ],
            default_noise_dbm_per_mhz: -110.0,
            polarization_loss_db: 3.0,
            body_loss_indoor_db: 0.0,
            body_loss_outdoor_db: 0.0,
            building_loss: BuildingLossModel::default(),
            default_feeder_loss_db: 3.0,
            emission_mask: false,
        }
    }
}

impl RegulatoryConfig {
    /// Noise PSD for a receiver centred at `center_mhz`
    pub fn noise_psd_dbm_per_mhz(&self, center_mhz: f64) -> f64 {
        self.noise_bands
            .iter()
            .find(|b| center_mhz >= b.low_mhz && center_mhz < b.high_mhz)
            .map(|b| b.noise_dbm_per_mhz)
            .unwrap_or(self.default_noise_dbm_per_mhz)
    }

    /// Body loss for the AP's deployment
    pub fn body_loss_db(&self, indoor: bool) -> f64 {
        if indoor {
            self.body_loss_indoor_db
        } else {
            self.body_loss_outdoor_db
        }
    }
}

/// Scan-point generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub height_policy: HeightScanPolicy,
    pub below_min_height: BelowMinHeightPolicy,
    /// Minimum AP height above ground (m)
    pub min_agl_m: f64,
    /// Overrides the terrain source's native grid when set
    pub resolution_arcsec: Option<f64>,
    /// Upper bound on generated scan points
    pub max_points: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            height_policy: HeightScanPolicy::MinMidMax,
            below_min_height: BelowMinHeightPolicy::Clamp,
            min_agl_m: 1.5,
            resolution_arcsec: None,
            max_points: 50_000,
        }
    }
}

/// Incumbent search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IncumbentConfig {
    /// Links farther than this from a scan point are ignored (m)
    pub max_link_distance_m: f64,
    /// Receivers closer than this to a scan point count as inside the volume (m)
    pub min_separation_m: f64,
    pub repeater_convention: RepeaterConvention,
}

impl Default for IncumbentConfig {
    fn default() -> Self {
        Self {
            max_link_distance_m: 130_000.0,
            min_separation_m: 1.0,
            repeater_convention: RepeaterConvention::NearestToAp,
        }
    }
}

/// Terrain diffraction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffractionConfig {
    pub polarization: Polarization,
    /// Relative ground permittivity
    pub ground_permittivity: f64,
    /// Ground conductivity (S/m)
    pub ground_conductivity: f64,
    /// Surface refractivity when the terrain source has none (N-units)
    pub default_refractivity: f64,
    /// Time percentile of the variability term
    pub reliability_pct: f64,
    /// Location percentile of the variability term
    pub confidence_pct: f64,
    /// Maximum spacing between profile samples (m)
    pub profile_step_m: f64,
}

impl Default for DiffractionConfig {
    fn default() -> Self {
        Self {
            polarization: Polarization::Vertical,
            ground_permittivity: 15.0,
            ground_conductivity: 0.005,
            default_refractivity: 301.0,
            reliability_pct: 20.0,
            confidence_pct: 50.0,
            profile_step_m: 30.0,
        }
    }
}

/// Clutter contribution at one end of a path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClutterConfig {
    pub enabled: bool,
    /// Applies only when the endpoint is at or below this height AGL (m)
    pub max_height_m: f64,
    /// Applies only when the path is at least this long (m)
    pub min_distance_m: f64,
    /// Location percentile for the statistical clutter loss
    pub percentile: f64,
}

impl Default for ClutterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_height_m: 10.0,
            min_distance_m: 1_000.0,
            percentile: 10.0,
        }
    }
}

impl ClutterConfig {
    fn fs_default() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Propagation model dispatch and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Below this distance, free space only (m)
    pub free_space_max_m: f64,
    /// Below this distance, the statistical model (m)
    pub statistical_max_m: f64,
    pub los_mode: LosMode,
    /// APs at or above this height AGL are treated as LOS
    pub los_switch_height_m: Option<f64>,
    /// Percentile for the statistical model's shadowing term
    pub statistical_percentile: f64,
    pub diffraction: DiffractionConfig,
    /// P.2108 terrestrial clutter at the AP end
    pub ap_clutter: ClutterConfig,
    /// P.452 height-gain clutter at the FS end
    #[serde(default = "ClutterConfig::fs_default")]
    pub fs_clutter: ClutterConfig,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            free_space_max_m: 30.0,
            statistical_max_m: 1_000.0,
            los_mode: LosMode::SurfaceData,
            los_switch_height_m: None,
            statistical_percentile: 20.0,
            diffraction: DiffractionConfig::default(),
            ap_clutter: ClutterConfig::default(),
            fs_clutter: ClutterConfig::fs_default(),
        }
    }
}

/// Near-field adjustment switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NearFieldConfig {
    pub enabled: bool,
    /// Adjustment only applies within this angle off boresight (deg)
    pub max_off_axis_deg: f64,
    /// Aperture efficiency for antennas that do not declare one
    pub default_efficiency: f64,
}

impl Default for NearFieldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_off_axis_deg: 90.0,
            default_efficiency: 0.55,
        }
    }
}

/// Antenna pattern selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AntennaConfig {
    /// FS antennas below this peak gain are treated as omni (dBi)
    pub omni_gain_threshold_dbi: f64,
    pub broad_pattern: BroadPattern,
    /// Category A/B envelope applies at or above this peak gain (dBi)
    pub low_angle_gain_threshold_dbi: f64,
    pub near_field: NearFieldConfig,
}

impl Default for AntennaConfig {
    fn default() -> Self {
        Self {
            omni_gain_threshold_dbi: 10.0,
            broad_pattern: BroadPattern::F1245,
            low_angle_gain_threshold_dbi: 38.0,
            near_field: NearFieldConfig::default(),
        }
    }
}

/// Device deny-list entry; unset identity fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceDenyRule {
    pub serial_number: Option<String>,
    pub certification_id: Option<String>,
    /// Denied spectrum; empty means the whole band
    pub frequencies: Vec<FrequencyRange>,
}

impl DeviceDenyRule {
    pub fn matches_device(&self, serial_number: &str, certification_id: &str) -> bool {
        let serial_ok = self.serial_number.as_deref().map_or(true, |s| s == serial_number);
        let cert_ok = self.certification_id.as_deref().map_or(true, |c| c == certification_id);
        serial_ok && cert_ok && (self.serial_number.is_some() || self.certification_id.is_some())
    }

    pub fn covers(&self, range: &FrequencyRange) -> bool {
        self.frequencies.is_empty() || self.frequencies.iter().any(|f| f.overlaps(range))
    }
}

/// Response assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Ruleset boundary; empty means unrestricted
    pub boundary: Vec<GeoPolygon>,
    pub deny_regions: Vec<GeoPolygon>,
    pub deny_devices: Vec<DeviceDenyRule>,
    /// Incumbent diagnostics with worst I/N below this are suppressed (dB)
    pub visibility_threshold_db: f64,
    /// Incumbents closer than this are always reported (m)
    pub visibility_exemption_m: f64,
    pub include_diagnostics: bool,
    pub post_solve_order: Vec<PostSolveStep>,
    /// Merge adjacent frequency slices with identical availability
    pub merge_frequency_slices: bool,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            boundary: Vec::new(),
            deny_regions: Vec::new(),
            deny_devices: Vec::new(),
            visibility_threshold_db: -18.0,
            visibility_exemption_m: 1_000.0,
            include_diagnostics: false,
            post_solve_order: vec![PostSolveStep::InsideVolume, PostSolveStep::MinimumPowerFloor],
            merge_frequency_slices: true,
        }
    }
}

/// Complete per-ruleset configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AfcConfig {
    pub ruleset_id: String,
    pub regulatory: RegulatoryConfig,
    pub scan: ScanConfig,
    pub incumbents: IncumbentConfig,
    pub propagation: PropagationConfig,
    pub antenna: AntennaConfig,
    pub assembly: AssemblyConfig,
    pub logging: LogConfig,
}

impl Default for AfcConfig {
    fn default() -> Self {
        Self {
            ruleset_id: "US_47_CFR_PART_15_SUBPART_E".to_string(),
            regulatory: RegulatoryConfig::default(),
            scan: ScanConfig::default(),
            incumbents: IncumbentConfig::default(),
            propagation: PropagationConfig::default(),
            antenna: AntennaConfig::default(),
            assembly: AssemblyConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl AfcConfig {
    /// First file on [`AfcConfig::config_search_paths`] wins.
    ///
    /// Search order:
    /// 1. `AFC_CONFIG` environment variable
    /// 2. `./afc.yaml`
    /// 3. `~/.config/afc/config.yaml`
    /// 4. `/etc/afc/config.yaml`
    ///
    /// Built-in defaults when none exists.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("AFC_CONFIG") {
            if Path::new(&path).exists() {
                return Self::load_from(Path::new(&path));
            }
        }

        for path in &Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok(Self::default())
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let config = Self::from_yaml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document; missing keys take defaults
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Write the configuration as YAML
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_yaml()?;
        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// `./afc.yaml`, the per-user config dir, then `/etc/afc`
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./afc.yaml")];

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "afc") {
            paths.push(config_dir.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/afc/config.yaml"));

        paths
    }

    /// Reject values that would make limits meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

        if self.ruleset_id.trim().is_empty() {
            return invalid("ruleset_id must not be empty");
        }

        let reg = &self.regulatory;
        let finite = [
            reg.in_threshold_db,
            reg.max_eirp_dbm,
            reg.max_psd_dbm_per_mhz,
            reg.min_eirp_dbm,
            reg.min_psd_dbm_per_mhz,
            reg.default_noise_dbm_per_mhz,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return invalid("regulatory limits must be finite");
        }
        if reg.min_eirp_dbm > reg.max_eirp_dbm || reg.min_psd_dbm_per_mhz > reg.max_psd_dbm_per_mhz {
            return invalid("regulatory floors must not exceed ceilings");
        }
        if reg.noise_bands.iter().any(|b| !(b.high_mhz > b.low_mhz) || !b.noise_dbm_per_mhz.is_finite()) {
            return invalid("noise bands must have low_mhz < high_mhz and finite noise");
        }
        if reg.polarization_loss_db < 0.0 || reg.default_feeder_loss_db < 0.0 {
            return invalid("losses must be non-negative");
        }
        if let BuildingLossModel::P2109 { probability_pct, .. } = reg.building_loss {
            if !(probability_pct > 0.0 && probability_pct < 100.0) {
                return invalid("P.2109 probability_pct must be in (0, 100)");
            }
        }

        if !(self.scan.min_agl_m > 0.0) {
            return invalid("scan.min_agl_m must be positive");
        }
        if let HeightScanPolicy::Step { step_m } = self.scan.height_policy {
            if !(step_m > 0.0) {
                return invalid("scan.height_policy.step_m must be positive");
            }
        }
        if matches!(self.scan.resolution_arcsec, Some(r) if !(r > 0.0)) {
            return invalid("scan.resolution_arcsec must be positive");
        }
        if self.scan.max_points == 0 {
            return invalid("scan.max_points must be > 0");
        }

        if !(self.incumbents.max_link_distance_m > 0.0) || self.incumbents.min_separation_m < 0.0 {
            return invalid("incumbent search distances must be positive");
        }

        let prop = &self.propagation;
        if !(prop.free_space_max_m >= 0.0 && prop.statistical_max_m >= prop.free_space_max_m) {
            return invalid("propagation thresholds must satisfy 0 <= free_space_max_m <= statistical_max_m");
        }
        let percentiles = [
            prop.statistical_percentile,
            prop.diffraction.reliability_pct,
            prop.diffraction.confidence_pct,
            prop.ap_clutter.percentile,
            prop.fs_clutter.percentile,
        ];
        if percentiles.iter().any(|p| !(*p > 0.0 && *p < 100.0)) {
            return invalid("percentiles must be in (0, 100)");
        }
        if !(prop.diffraction.ground_permittivity > 0.0 && prop.diffraction.ground_conductivity > 0.0) {
            return invalid("ground constants must be positive");
        }
        if !(prop.diffraction.profile_step_m > 0.0) {
            return invalid("diffraction.profile_step_m must be positive");
        }

        let nf = &self.antenna.near_field;
        if !(nf.default_efficiency > 0.0 && nf.default_efficiency <= 1.0) {
            return invalid("near_field.default_efficiency must be in (0, 1]");
        }

        let order = &self.assembly.post_solve_order;
        let has = |step| order.iter().filter(|s| **s == step).count() == 1;
        if order.len() != 2 || !has(PostSolveStep::InsideVolume) || !has(PostSolveStep::MinimumPowerFloor) {
            return invalid("assembly.post_solve_order must list inside_volume and minimum_power_floor once each");
        }
        if self
            .assembly
            .boundary
            .iter()
            .chain(self.assembly.deny_regions.iter())
            .any(|p| p.vertices.len() < 3)
        {
            return invalid("boundary and deny-region polygons need at least 3 vertices");
        }

        Ok(())
    }

    /// Annotated starting point for a ruleset file
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AfcConfig::default();
        assert_eq!(config.regulatory.in_threshold_db, -6.0);
        assert_eq!(config.incumbents.max_link_distance_m, 130_000.0);
        assert!(config.propagation.ap_clutter.enabled);
        assert!(!config.propagation.fs_clutter.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
ruleset_id: CA_RES_DBS-06
regulatory:
  in_threshold_db: -9.0
  power_accounting: psd
  inside_volume:
    policy: low_power_ceiling
    eirp_dbm: 24.0
    psd_dbm_per_mhz: 11.0
  building_loss:
    model: p2109
    building_type: thermally_efficient
    probability_pct: 50.0
scan:
  height_policy:
    policy: step
    step_m: 2.5
  below_min_height: discard
antenna:
  broad_pattern: F.699
assembly:
  post_solve_order: [minimum_power_floor, inside_volume]
"#;

        let config = AfcConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.ruleset_id, "CA_RES_DBS-06");
        assert_eq!(config.regulatory.in_threshold_db, -9.0);
        assert_eq!(config.regulatory.power_accounting, PowerAccounting::Psd);
        assert_eq!(
            config.regulatory.inside_volume,
            InsideVolumePolicy::LowPowerCeiling { eirp_dbm: 24.0, psd_dbm_per_mhz: 11.0 }
        );
        assert_eq!(
            config.regulatory.building_loss,
            BuildingLossModel::P2109 {
                building_type: BuildingType::ThermallyEfficient,
                probability_pct: 50.0
            }
        );
        assert_eq!(config.scan.height_policy, HeightScanPolicy::Step { step_m: 2.5 });
        assert_eq!(config.scan.below_min_height, BelowMinHeightPolicy::Discard);
        assert_eq!(config.antenna.broad_pattern, BroadPattern::F699);
        assert_eq!(config.assembly.post_solve_order[0], PostSolveStep::MinimumPowerFloor);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
propagation:
  los_mode: always_nlos
  fs_clutter:
    enabled: true
"#;

        let config = AfcConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.propagation.los_mode, LosMode::AlwaysNlos);
        assert!(config.propagation.fs_clutter.enabled);
        // Defaults should be applied
        assert_eq!(config.propagation.free_space_max_m, 30.0);
        assert_eq!(config.regulatory.max_eirp_dbm, 36.0);
    }

    #[test]
    fn test_validation() {
        let mut config = AfcConfig::default();
        config.regulatory.min_eirp_dbm = 40.0;
        assert!(config.validate().is_err());

        let mut config = AfcConfig::default();
        config.propagation.statistical_max_m = 10.0;
        assert!(config.validate().is_err());

        let mut config = AfcConfig::default();
        config.assembly.post_solve_order = vec![PostSolveStep::InsideVolume, PostSolveStep::InsideVolume];
        assert!(config.validate().is_err());

        let mut config = AfcConfig::default();
        config.scan.height_policy = HeightScanPolicy::Step { step_m: 0.0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_noise_table() {
        let reg = RegulatoryConfig::default();
        assert_eq!(reg.noise_psd_dbm_per_mhz(6000.0), -110.0);
        assert_eq!(reg.noise_psd_dbm_per_mhz(6700.0), -109.5);
        assert_eq!(reg.noise_psd_dbm_per_mhz(5000.0), -110.0);
    }

    #[test]
    fn test_device_deny_rule() {
        let rule = DeviceDenyRule {
            certification_id: Some("FCC-ABC".to_string()),
            ..Default::default()
        };
        assert!(rule.matches_device("SN1", "FCC-ABC"));
        assert!(!rule.matches_device("SN1", "FCC-XYZ"));
        assert!(rule.covers(&FrequencyRange::new(6000.0, 6020.0)));
        assert!(!DeviceDenyRule::default().matches_device("SN1", "FCC-ABC"));
    }

    #[test]
    fn test_example_yaml_roundtrip() {
        let yaml = AfcConfig::example_yaml();
        assert!(yaml.contains("regulatory:"));
        let parsed = AfcConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.incumbents.max_link_distance_m, 130_000.0);
        assert_eq!(parsed.regulatory.inside_volume, InsideVolumePolicy::Block);
    }

    #[test]
    fn test_config_search_paths() {
        let paths = AfcConfig::config_search_paths();
        assert!(!paths.is_empty());
        assert!(paths[0].ends_with("afc.yaml"));
    }
}
