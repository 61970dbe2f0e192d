//! Availability response

use serde::{Deserialize, Serialize};

use afc_core::channel_plan::FrequencyRange;
use afc_core::observe::DataQualityReport;
use afc_core::propagation::ModelTag;

/// Why a unit is unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnavailableReason {
    /// AP inside a radio-astronomy exclusion zone protecting this spectrum
    ExclusionZone,
    /// Device identity is on the deny list for this spectrum
    DeniedDevice,
    /// An incumbent receiver lies inside the AP's uncertainty volume
    InsideVolume,
}

/// Outcome for one channel or frequency range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Availability {
    MaxEirp { dbm: f64 },
    MaxPsd { dbm_per_mhz: f64 },
    Unavailable { reason: UnavailableReason },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        !matches!(self, Availability::Unavailable { .. })
    }

    /// Power value, whatever the unit
    pub fn power(&self) -> Option<f64> {
        match *self {
            Availability::MaxEirp { dbm } => Some(dbm),
            Availability::MaxPsd { dbm_per_mhz } => Some(dbm_per_mhz),
            Availability::Unavailable { .. } => None,
        }
    }
}

/// Result for one operating channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAvailability {
    pub op_class: u8,
    pub channel: u8,
    pub center_mhz: f64,
    pub bandwidth_mhz: f64,
    pub availability: Availability,
}

/// Result for a frequency range (merged 1 MHz slices)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyAvailability {
    pub range: FrequencyRange,
    pub availability: Availability,
}

/// Which path to an incumbent a diagnostic describes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VictimPath {
    Direct,
    Repeater { repeater_id: String },
}

/// Worst case seen for one incumbent across all scan points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncumbentDiagnostic {
    pub link_id: String,
    pub path: VictimPath,
    /// Closest approach of any scan point (m)
    pub min_distance_m: f64,
    /// Highest I/N at the PSD ceiling over the full receive band; absent
    /// when the receiver lies inside the uncertainty volume
    pub worst_in_db: Option<f64>,
    pub inside_volume: bool,
    /// Model of the path that produced the worst I/N
    pub model: Option<ModelTag>,
    pub path_loss_db: Option<f64>,
    pub rx_gain_dbi: Option<f64>,
}

/// Which incumbent and scan point governed a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitConstraint {
    pub unit: String,
    pub link_id: Option<String>,
    pub scan_point: Option<usize>,
}

/// Optional detail for reconstructing a decision
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub scan_points: usize,
    pub incumbents: Vec<IncumbentDiagnostic>,
    /// Incumbents left out by the visibility threshold
    pub suppressed_incumbents: usize,
    pub constraints: Vec<UnitConstraint>,
}

/// Complete answer to one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub request_id: String,
    pub ruleset_id: String,
    pub channels: Vec<ChannelAvailability>,
    pub frequencies: Vec<FrequencyAvailability>,
    pub data_quality: DataQualityReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

impl AvailabilityResponse {
    /// Result for a channel, if present in the response
    pub fn channel(&self, op_class: u8, channel: u8) -> Option<&ChannelAvailability> {
        self.channels
            .iter()
            .find(|c| c.op_class == op_class && c.channel == channel)
    }

    /// Result covering a frequency, if present in the response
    pub fn frequency_at(&self, mhz: f64) -> Option<&FrequencyAvailability> {
        self.frequencies
            .iter()
            .find(|f| mhz >= f.range.low_mhz && mhz < f.range.high_mhz)
    }
}
