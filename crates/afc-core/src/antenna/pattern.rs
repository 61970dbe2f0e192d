//! Reference radiation patterns for FS dishes.
//!
//! All functions return absolute gain in dBi for an off-axis angle in
//! degrees (folded into [0, 180]).
//!
//! - [`f1245_gain_dbi`]: ITU-R F.1245 average pattern (interference studies)
//! - [`f699_gain_dbi`]: ITU-R F.699 reference (peak-envelope) pattern
//! - [`category_envelope_gain_dbi`]: FCC §101.115 category A/B suppression
//!   envelope with an F.1245 main beam

use serde::{Deserialize, Serialize};

/// FCC §101.115 antenna category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntennaCategory {
    A,
    B,
    /// Not declared in the license record
    Unknown,
}

impl Default for AntennaCategory {
    fn default() -> Self {
        AntennaCategory::Unknown
    }
}

/// Fold any angle into [0, 180] degrees
pub fn fold_angle_deg(angle_deg: f64) -> f64 {
    let a = angle_deg.abs() % 360.0;
    if a > 180.0 {
        360.0 - a
    } else {
        a
    }
}

/// D/λ estimated from peak gain: 20·log10(D/λ) ≈ G_max - 7.7
pub fn d_over_lambda(peak_gain_dbi: f64) -> f64 {
    10.0_f64.powf((peak_gain_dbi - 7.7) / 20.0)
}

/// Main-beam/first-sidelobe terms shared by F.1245 and F.699
fn main_beam(peak_gain_dbi: f64, dl: f64, phi: f64) -> (f64, f64, f64) {
    let g1 = 2.0 + 15.0 * dl.log10();
    let phi_m = 20.0 / dl * (peak_gain_dbi - g1).max(0.0).sqrt();
    let g_main = peak_gain_dbi - 2.5e-3 * (dl * phi).powi(2);
    (g1, phi_m, g_main)
}

/// ITU-R F.1245 average radiation pattern
pub fn f1245_gain_dbi(peak_gain_dbi: f64, off_axis_deg: f64) -> f64 {
    let phi = fold_angle_deg(off_axis_deg);
    let dl = d_over_lambda(peak_gain_dbi);
    let (g1, phi_m, g_main) = main_beam(peak_gain_dbi, dl, phi);

    if phi < phi_m {
        return g_main;
    }
    if dl > 100.0 {
        let phi_r = 12.02 * dl.powf(-0.6);
        if phi < phi_m.max(phi_r) {
            g1
        } else if phi < 48.0 {
            29.0 - 25.0 * phi.log10()
        } else {
            -13.0
        }
    } else if phi < 48.0 {
        (39.0 - 5.0 * dl.log10() - 25.0 * phi.log10()).min(g1)
    } else {
        -3.0 - 5.0 * dl.log10()
    }
}

/// ITU-R F.699 reference radiation pattern
pub fn f699_gain_dbi(peak_gain_dbi: f64, off_axis_deg: f64) -> f64 {
    let phi = fold_angle_deg(off_axis_deg);
    let dl = d_over_lambda(peak_gain_dbi);
    let (g1, phi_m, g_main) = main_beam(peak_gain_dbi, dl, phi);

    if phi < phi_m {
        return g_main;
    }
    if dl > 100.0 {
        let phi_r = 15.85 * dl.powf(-0.6);
        if phi < phi_m.max(phi_r) {
            g1
        } else if phi < 48.0 {
            32.0 - 25.0 * phi.log10()
        } else {
            -10.0
        }
    } else {
        let phi_s = 100.0 / dl;
        if phi < phi_m.max(phi_s) {
            g1
        } else if phi < 48.0 {
            52.0 - 10.0 * dl.log10() - 25.0 * phi.log10()
        } else {
            10.0 - 10.0 * dl.log10()
        }
    }
}

/// Minimum radiation suppression (dB below peak) by angle band, 6 GHz
/// common-carrier table. Rows are `(from_deg, cat_a_db, cat_b_db)`.
const CATEGORY_SUPPRESSION: [(f64, f64, f64); 7] = [
    (5.0, 25.0, 21.0),
    (10.0, 29.0, 25.0),
    (15.0, 33.0, 29.0),
    (20.0, 36.0, 32.0),
    (30.0, 42.0, 35.0),
    (100.0, 55.0, 39.0),
    (140.0, 55.0, 45.0),
];

/// FCC category A/B envelope; F.1245 main beam below 5°.
pub fn category_envelope_gain_dbi(peak_gain_dbi: f64, category: AntennaCategory, off_axis_deg: f64) -> f64 {
    let phi = fold_angle_deg(off_axis_deg);
    let column = |row: &(f64, f64, f64)| match category {
        AntennaCategory::B => row.2,
        _ => row.1,
    };

    let first_suppression = column(&CATEGORY_SUPPRESSION[0]);
    if phi < CATEGORY_SUPPRESSION[0].0 {
        let main = f1245_gain_dbi(peak_gain_dbi, phi);
        return main.max(peak_gain_dbi - first_suppression).min(peak_gain_dbi);
    }

    let suppression = CATEGORY_SUPPRESSION
        .iter()
        .rev()
        .find(|row| phi >= row.0)
        .map(column)
        .unwrap_or(first_suppression);
    peak_gain_dbi - suppression
}
