//! Interference Link Budget
//!
//! Couples an AP transmitter to a protected receiver and solves the
//! regulatory I/N constraint for the maximum transmit power. The relation is
//! linear in dB, so the solve is closed form:
//!
//! ```text
//! I   = PSD + 10·log10(W) + C          (dBm in the victim band)
//! I/N = I - N <= T
//! PSD_max  = T + N - C - 10·log10(W)   (dBm/MHz)
//! EIRP_max = PSD_max + 10·log10(BW)    (dBm)
//! ```
//!
//! where `C` is the net coupling (receiver gain minus all losses), `W` the
//! mask-weighted overlap of the AP emission with the victim band in MHz and
//! `BW` the AP channel bandwidth.
//!
//! ## Example
//!
//! ```rust
//! use afc_core::link_budget::{CouplingBudget, solve_psd_limit, psd_to_eirp};
//!
//! let coupling = CouplingBudget::new()
//!     .rx_gain_dbi(38.0)
//!     .path_loss_db(140.0)
//!     .feeder_loss_db(3.0)
//!     .polarization_loss_db(3.0)
//!     .net_coupling_db();
//! assert_eq!(coupling, -108.0);
//!
//! // -6 dB I/N, -110 dBm/MHz noise over a 30 MHz receiver
//! let noise_dbm = -110.0 + 10.0 * 30.0_f64.log10();
//! let psd = solve_psd_limit(-6.0, noise_dbm, coupling, 20.0).unwrap();
//! let eirp = psd_to_eirp(psd, 20.0);
//! assert!(eirp > psd);
//! ```

use serde::{Deserialize, Serialize};

use crate::channel_plan::FrequencyRange;

/// Convert dB to a linear power ratio
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 10.0)
}

/// Convert a linear power ratio to dB
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        return f64::NEG_INFINITY;
    }
    10.0 * linear.log10()
}

/// Thermal noise floor in dBm.
///
/// N = 10*log10(k*T*B) + 30  (convert from dBW to dBm)
/// At 290K: N ≈ -174 + 10*log10(BW_hz) dBm
pub fn thermal_noise_floor_dbm(bandwidth_hz: f64, temperature_k: f64) -> f64 {
    const K_BOLTZMANN: f64 = 1.380649e-23; // J/K
    if bandwidth_hz <= 0.0 {
        return f64::NEG_INFINITY;
    }
    10.0 * (K_BOLTZMANN * temperature_k * bandwidth_hz).log10() + 30.0
}

/// Convert a PSD (dBm/MHz) to total EIRP over `bandwidth_mhz`
pub fn psd_to_eirp(psd_dbm_per_mhz: f64, bandwidth_mhz: f64) -> f64 {
    psd_dbm_per_mhz + 10.0 * bandwidth_mhz.log10()
}

/// Convert an EIRP (dBm) to PSD over `bandwidth_mhz`
pub fn eirp_to_psd(eirp_dbm: f64, bandwidth_mhz: f64) -> f64 {
    eirp_dbm - 10.0 * bandwidth_mhz.log10()
}

/// Maximum PSD meeting `I/N <= threshold`.
///
/// Returns `None` when the weighted overlap is zero (the victim is not
/// reached by this emission).
pub fn solve_psd_limit(
    threshold_db: f64,
    noise_dbm: f64,
    net_coupling_db: f64,
    weighted_overlap_mhz: f64,
) -> Option<f64> {
    if weighted_overlap_mhz <= 0.0 {
        return None;
    }
    Some(threshold_db + noise_dbm - net_coupling_db - 10.0 * weighted_overlap_mhz.log10())
}

/// I/N produced by a given PSD
pub fn interference_to_noise_db(
    psd_dbm_per_mhz: f64,
    noise_dbm: f64,
    net_coupling_db: f64,
    weighted_overlap_mhz: f64,
) -> f64 {
    if weighted_overlap_mhz <= 0.0 {
        return f64::NEG_INFINITY;
    }
    psd_dbm_per_mhz + 10.0 * weighted_overlap_mhz.log10() + net_coupling_db - noise_dbm
}

/// Gains and losses between an AP and one victim receiver.
#[derive(Debug, Clone, Default)]
pub struct CouplingBudget {
    rx_gain_dbi: f64,
    near_field_adjustment_db: f64,
    ap_relative_gain_db: f64,
    path_loss_db: f64,
    repeater_gain_db: f64,
    feeder_loss_db: f64,
    polarization_loss_db: f64,
    body_loss_db: f64,
    building_loss_db: f64,
}

impl CouplingBudget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Victim antenna gain toward the AP (dBi)
    pub fn rx_gain_dbi(mut self, gain: f64) -> Self {
        self.rx_gain_dbi = gain;
        self
    }

    /// Near-field correction (always <= 0 dB)
    pub fn near_field_adjustment_db(mut self, adj: f64) -> Self {
        self.near_field_adjustment_db = adj.min(0.0);
        self
    }

    /// AP antenna gain toward the victim relative to its peak (<= 0 dB)
    pub fn ap_relative_gain_db(mut self, gain: f64) -> Self {
        self.ap_relative_gain_db = gain;
        self
    }

    pub fn path_loss_db(mut self, loss: f64) -> Self {
        self.path_loss_db = loss;
        self
    }

    /// Net passive-repeater gain along the chain
    pub fn repeater_gain_db(mut self, gain: f64) -> Self {
        self.repeater_gain_db = gain;
        self
    }

    pub fn feeder_loss_db(mut self, loss: f64) -> Self {
        self.feeder_loss_db = loss;
        self
    }

    pub fn polarization_loss_db(mut self, loss: f64) -> Self {
        self.polarization_loss_db = loss;
        self
    }

    pub fn body_loss_db(mut self, loss: f64) -> Self {
        self.body_loss_db = loss;
        self
    }

    pub fn building_loss_db(mut self, loss: f64) -> Self {
        self.building_loss_db = loss;
        self
    }

    pub fn path_loss(&self) -> f64 {
        self.path_loss_db
    }

    /// Net coupling from AP EIRP to power at the victim receiver input (dB)
    pub fn net_coupling_db(&self) -> f64 {
        self.rx_gain_dbi + self.near_field_adjustment_db + self.ap_relative_gain_db
            + self.repeater_gain_db
            - self.path_loss_db
            - self.feeder_loss_db
            - self.polarization_loss_db
            - self.body_loss_db
            - self.building_loss_db
    }
}

/// AP out-of-channel emission mask.
///
/// Breakpoints are `(offset from channel centre in MHz, level in dBr)`,
/// ascending in offset, mirrored for negative offsets. Levels are linear in
/// dB between breakpoints; nothing is emitted past the last breakpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionMask {
    pub breakpoints: Vec<(f64, f64)>,
}

impl EmissionMask {
    /// Rectangular in-band mask (no adjacent-channel emission)
    pub fn rectangular(bandwidth_mhz: f64) -> Self {
        let half = bandwidth_mhz / 2.0;
        Self {
            breakpoints: vec![(0.0, 0.0), (half, 0.0)],
        }
    }

    /// IEEE 802.11ax 6 GHz transmit spectrum mask
    pub fn ieee80211ax(bandwidth_mhz: f64) -> Self {
        let half = bandwidth_mhz / 2.0;
        Self {
            breakpoints: vec![
                (0.0, 0.0),
                (half - 0.5, 0.0),
                (half + 1.0, -20.0),
                (bandwidth_mhz, -28.0),
                (1.5 * bandwidth_mhz, -40.0),
            ],
        }
    }

    /// Integrate the mask (in linear power units) over `victim`, for an
    /// emission centred at `center_mhz`. Result is in MHz-equivalents of
    /// in-band PSD.
    pub fn weighted_overlap_mhz(&self, center_mhz: f64, victim: &FrequencyRange) -> f64 {
        let mut total = 0.0;
        for pair in self.breakpoints.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            // upper side
            total += segment_integral(center_mhz + x0, y0, center_mhz + x1, y1, victim);
            // lower side (mirrored)
            total += segment_integral(center_mhz - x1, y1, center_mhz - x0, y0, victim);
        }
        total
    }
}

/// Integral of 10^(dB/10) over [f0, f1] ∩ victim where dB is linear from y0 to y1
fn segment_integral(f0: f64, y0: f64, f1: f64, y1: f64, victim: &FrequencyRange) -> f64 {
    let lo = f0.max(victim.low_mhz);
    let hi = f1.min(victim.high_mhz);
    if hi <= lo || f1 <= f0 {
        return 0.0;
    }
    let slope = (y1 - y0) / (f1 - f0);
    let ya = y0 + slope * (lo - f0);
    let yb = y0 + slope * (hi - f0);
    if slope.abs() < 1e-12 {
        return (hi - lo) * db_to_linear(ya);
    }
    let k = std::f64::consts::LN_10 / 10.0;
    (db_to_linear(yb) - db_to_linear(ya)) / (slope * k)
}
