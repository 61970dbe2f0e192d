//! Evaluation units, power limits and the post-solve policy pipeline

use afc_core::channel_plan::{Channel, FrequencyRange};
use afc_core::config::{InsideVolumePolicy, PostSolveStep, PowerAccounting, RegulatoryConfig};
use afc_core::error::ComputationError;
use afc_core::link_budget::{eirp_to_psd, psd_to_eirp, EmissionMask};

use crate::response::{Availability, UnavailableReason};

/// Tolerance on `EIRP - (PSD + 10·log10(bw))`
const ACCOUNTING_TOLERANCE_DB: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitKind {
    Channel(Channel),
    /// 1 MHz slice of an inquired frequency range
    Slice,
}

/// One channel or frequency slice solved independently
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub kind: UnitKind,
    pub range: FrequencyRange,
    mask: EmissionMask,
}

impl Unit {
    /// Operating channel; the 802.11ax mask applies when `emission_mask` is set
    pub fn channel(channel: Channel, emission_mask: bool) -> Self {
        let mask = if emission_mask {
            EmissionMask::ieee80211ax(channel.bandwidth_mhz)
        } else {
            EmissionMask::rectangular(channel.bandwidth_mhz)
        };
        Self {
            kind: UnitKind::Channel(channel),
            range: channel.range(),
            mask,
        }
    }

    pub fn slice(range: FrequencyRange) -> Self {
        Self {
            kind: UnitKind::Slice,
            range,
            mask: EmissionMask::rectangular(range.width_mhz()),
        }
    }

    pub fn is_channel(&self) -> bool {
        matches!(self.kind, UnitKind::Channel(_))
    }

    pub fn bandwidth_mhz(&self) -> f64 {
        self.range.width_mhz()
    }

    /// Short label used in diagnostics and errors
    pub fn label(&self) -> String {
        match self.kind {
            UnitKind::Channel(ch) => ch.to_string(),
            UnitKind::Slice => format!("{}-{} MHz", self.range.low_mhz, self.range.high_mhz),
        }
    }

    /// Mask-weighted overlap with a victim band, in MHz of in-band PSD
    pub fn weighted_overlap_mhz(&self, victim: &FrequencyRange) -> f64 {
        self.mask.weighted_overlap_mhz(self.range.center_mhz(), victim)
    }

    /// Spectrum reached by the emission, mask skirts included
    pub fn reach(&self) -> FrequencyRange {
        let extent = self
            .mask
            .breakpoints
            .last()
            .map(|(offset, _)| *offset)
            .unwrap_or(self.bandwidth_mhz() / 2.0);
        FrequencyRange::centered(self.range.center_mhz(), 2.0 * extent)
    }
}

/// Units for a request: channels in request order, then frequency slices
pub fn build_units(channels: &[Channel], frequencies: &[FrequencyRange], emission_mask: bool) -> Vec<Unit> {
    let mut units: Vec<Unit> = channels.iter().map(|ch| Unit::channel(*ch, emission_mask)).collect();
    let mut slices: Vec<FrequencyRange> = Vec::new();
    for range in frequencies {
        for slice in range.unit_slices() {
            if !slices.contains(&slice) {
                slices.push(slice);
            }
        }
    }
    slices.sort_by(|a, b| a.low_mhz.total_cmp(&b.low_mhz));
    units.extend(slices.into_iter().map(Unit::slice));
    units
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Permissible power of one unit in both accountings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitLimit {
    pub psd_dbm_per_mhz: f64,
    pub eirp_dbm: f64,
}

impl UnitLimit {
    pub fn from_psd(psd_dbm_per_mhz: f64, bandwidth_mhz: f64) -> Self {
        Self {
            psd_dbm_per_mhz,
            eirp_dbm: psd_to_eirp(psd_dbm_per_mhz, bandwidth_mhz),
        }
    }

    /// Tighter of an EIRP and a PSD cap over `bandwidth_mhz`
    pub fn cap(eirp_dbm: f64, psd_dbm_per_mhz: f64, bandwidth_mhz: f64) -> Self {
        Self::from_psd(psd_dbm_per_mhz.min(eirp_to_psd(eirp_dbm, bandwidth_mhz)), bandwidth_mhz)
    }

    /// Regulatory ceiling for a unit
    pub fn ceiling(regulatory: &RegulatoryConfig, bandwidth_mhz: f64) -> Self {
        Self::cap(regulatory.max_eirp_dbm, regulatory.max_psd_dbm_per_mhz, bandwidth_mhz)
    }

    pub fn min(self, other: UnitLimit) -> UnitLimit {
        if other.psd_dbm_per_mhz < self.psd_dbm_per_mhz {
            other
        } else {
            self
        }
    }

    /// Both accountings must describe the same power
    pub fn verify(&self, unit: &Unit) -> Result<(), ComputationError> {
        let expected = psd_to_eirp(self.psd_dbm_per_mhz, unit.bandwidth_mhz());
        if !self.eirp_dbm.is_finite() || (self.eirp_dbm - expected).abs() > ACCOUNTING_TOLERANCE_DB {
            return Err(ComputationError::InconsistentAccounting {
                unit: unit.label(),
                eirp_dbm: self.eirp_dbm,
                psd_dbm_per_mhz: self.psd_dbm_per_mhz,
                bandwidth_mhz: unit.bandwidth_mhz(),
            });
        }
        Ok(())
    }

    /// Value in the unit's output accounting; slices always report PSD
    pub fn availability(&self, unit: &Unit, accounting: PowerAccounting) -> Availability {
        match (unit.is_channel(), accounting) {
            (true, PowerAccounting::Eirp) => Availability::MaxEirp { dbm: self.eirp_dbm },
            _ => Availability::MaxPsd {
                dbm_per_mhz: self.psd_dbm_per_mhz,
            },
        }
    }

    /// Whether the limit falls below the configured floor
    pub fn below_floor(&self, unit: &Unit, regulatory: &RegulatoryConfig) -> bool {
        match (unit.is_channel(), regulatory.power_accounting) {
            (true, PowerAccounting::Eirp) => self.eirp_dbm < regulatory.min_eirp_dbm,
            _ => self.psd_dbm_per_mhz < regulatory.min_psd_dbm_per_mhz,
        }
    }
}

// ---------------------------------------------------------------------------
// Post-solve pipeline
// ---------------------------------------------------------------------------

/// Outcome of one unit after the policy pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitDecision {
    Limit(UnitLimit),
    Unavailable(UnavailableReason),
    /// Omitted from the response
    Dropped,
}

/// Apply the post-solve steps in configured order to a ceiling-bounded limit
pub fn apply_post_solve(
    steps: &[PostSolveStep],
    regulatory: &RegulatoryConfig,
    unit: &Unit,
    limit: UnitLimit,
    inside_volume: bool,
) -> UnitDecision {
    let mut decision = UnitDecision::Limit(limit);
    for step in steps {
        let UnitDecision::Limit(current) = decision else {
            break;
        };
        decision = match step {
            PostSolveStep::InsideVolume if inside_volume => match regulatory.inside_volume {
                InsideVolumePolicy::Block => UnitDecision::Unavailable(UnavailableReason::InsideVolume),
                InsideVolumePolicy::Ignore => decision,
                InsideVolumePolicy::LowPowerCeiling {
                    eirp_dbm,
                    psd_dbm_per_mhz,
                } => UnitDecision::Limit(current.min(UnitLimit::cap(eirp_dbm, psd_dbm_per_mhz, unit.bandwidth_mhz()))),
            },
            PostSolveStep::InsideVolume => decision,
            PostSolveStep::MinimumPowerFloor => {
                if current.below_floor(unit, regulatory) {
                    UnitDecision::Dropped
                } else {
                    decision
                }
            }
        };
    }
    decision
}
