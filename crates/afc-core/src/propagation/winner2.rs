//! WINNER-II short-range statistical path loss (IST-4-027756 D1.1.2).
//!
//! Scenarios by AP morphology: C2 urban macro, C1 suburban, D1 rural.
//! Distances are in meters, heights in meters AGL, `fc` in GHz. The higher
//! endpoint is treated as the base station.

use serde::{Deserialize, Serialize};

use crate::coordinates::SPEED_OF_LIGHT;
use crate::terrain::Morphology;

/// WINNER-II scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner2Scenario {
    C1Suburban,
    C2Urban,
    D1Rural,
}

impl Winner2Scenario {
    pub fn for_morphology(morphology: Morphology) -> Self {
        match morphology {
            Morphology::Urban => Winner2Scenario::C2Urban,
            Morphology::Suburban => Winner2Scenario::C1Suburban,
            Morphology::Rural => Winner2Scenario::D1Rural,
        }
    }
}

/// Median loss and shadowing standard deviation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Winner2Loss {
    pub median_db: f64,
    pub sigma_db: f64,
}

impl Winner2Loss {
    /// Loss at a percentile given as a standard-normal quantile
    pub fn at_quantile(&self, z: f64) -> f64 {
        self.median_db + self.sigma_db * z
    }
}

/// Breakpoint distance `4·h_bs·h_ms·f/c`
fn breakpoint_m(h_bs: f64, h_ms: f64, fc_ghz: f64) -> f64 {
    4.0 * h_bs * h_ms * fc_ghz * 1e9 / SPEED_OF_LIGHT
}

/// Line-of-sight loss
pub fn los(scenario: Winner2Scenario, distance_m: f64, h_bs: f64, h_ms: f64, fc_ghz: f64) -> Winner2Loss {
    let d = distance_m.max(10.0);
    let f_term = (fc_ghz / 5.0).log10();
    match scenario {
        Winner2Scenario::C2Urban => {
            // effective heights above a 1 m environment
            let hb = (h_bs - 1.0).max(0.5);
            let hm = (h_ms - 1.0).max(0.5);
            if d < breakpoint_m(hb, hm, fc_ghz) {
                Winner2Loss { median_db: 26.0 * d.log10() + 39.0 + 20.0 * f_term, sigma_db: 4.0 }
            } else {
                Winner2Loss {
                    median_db: 40.0 * d.log10() + 13.47 - 14.0 * hb.log10() - 14.0 * hm.log10() + 6.0 * f_term,
                    sigma_db: 6.0,
                }
            }
        }
        Winner2Scenario::C1Suburban => {
            if d < breakpoint_m(h_bs, h_ms, fc_ghz) {
                Winner2Loss { median_db: 23.8 * d.log10() + 41.2 + 20.0 * f_term, sigma_db: 4.0 }
            } else {
                Winner2Loss {
                    median_db: 40.0 * d.log10() + 11.65 - 16.2 * h_bs.log10() - 16.2 * h_ms.log10() + 3.8 * f_term,
                    sigma_db: 6.0,
                }
            }
        }
        Winner2Scenario::D1Rural => {
            if d < breakpoint_m(h_bs, h_ms, fc_ghz) {
                Winner2Loss { median_db: 21.5 * d.log10() + 44.2 + 20.0 * f_term, sigma_db: 4.0 }
            } else {
                Winner2Loss {
                    median_db: 40.0 * d.log10() + 10.5 - 18.5 * h_bs.log10() - 18.5 * h_ms.log10() + 1.5 * f_term,
                    sigma_db: 6.0,
                }
            }
        }
    }
}

/// Non-line-of-sight loss
pub fn nlos(scenario: Winner2Scenario, distance_m: f64, h_bs: f64, h_ms: f64, fc_ghz: f64) -> Winner2Loss {
    let d = distance_m.max(10.0);
    let f_term = (fc_ghz / 5.0).log10();
    let median_db = match scenario {
        Winner2Scenario::C2Urban => {
            (44.9 - 6.55 * h_bs.log10()) * d.log10() + 34.46 + 5.83 * h_bs.log10() + 23.0 * f_term
        }
        Winner2Scenario::C1Suburban => {
            (44.9 - 6.55 * h_bs.log10()) * d.log10() + 31.46 + 5.83 * h_bs.log10() + 23.0 * f_term
        }
        Winner2Scenario::D1Rural => {
            25.1 * d.log10() + 55.4 - 0.13 * (h_bs - 25.0) * (d / 100.0).log10() - 0.9 * (h_ms - 1.5)
                + 21.3 * f_term
        }
    };
    Winner2Loss { median_db, sigma_db: 8.0 }
}

/// Probability of line of sight
pub fn los_probability(scenario: Winner2Scenario, distance_m: f64) -> f64 {
    let d = distance_m.max(0.0);
    let p = match scenario {
        Winner2Scenario::C2Urban => (18.0 / d.max(1e-3)).min(1.0) * (1.0 - (-d / 63.0).exp()) + (-d / 63.0).exp(),
        Winner2Scenario::C1Suburban => {
            if d <= 15.0 {
                1.0
            } else {
                (-(d - 15.0) / 200.0).exp()
            }
        }
        Winner2Scenario::D1Rural => (-d / 1000.0).exp(),
    };
    p.clamp(0.0, 1.0)
}

/// LOS/NLOS losses at a quantile, blended in the linear domain by `p_los`
pub fn combined_loss_db(los_db: f64, nlos_db: f64, p_los: f64) -> f64 {
    let p = p_los.clamp(0.0, 1.0);
    let linear = p * 10.0_f64.powf(-los_db / 10.0) + (1.0 - p) * 10.0_f64.powf(-nlos_db / 10.0);
    -10.0 * linear.log10()
}
