//! Clutter losses at path ends
//!
//! - ITU-R P.2108 §3.2 statistical terrestrial clutter loss, used at the AP
//!   end of long paths
//! - ITU-R P.452 §4.5.4 height-gain clutter correction, used at the FS end

use crate::stats::qerfi;
use crate::terrain::Morphology;

/// P.2108 terrestrial clutter loss (dB) not exceeded for `percentile`% of
/// locations. `frequency_mhz` in 2–67 GHz, `distance_m` ≥ 250 m.
pub fn p2108_terrestrial_db(frequency_mhz: f64, distance_m: f64, percentile: f64) -> f64 {
    let f_ghz = frequency_mhz / 1000.0;
    let d_km = (distance_m / 1000.0).max(0.25);
    let l_l = 23.5 + 9.6 * f_ghz.log10();
    let l_s = 32.98 + 23.9 * d_km.log10() + 3.0 * f_ghz.log10();
    let median = -5.0 * (10.0_f64.powf(-0.2 * l_l) + 10.0_f64.powf(-0.2 * l_s)).log10();
    (median - 6.0 * qerfi(percentile / 100.0)).max(0.0)
}

/// Nominal P.452 clutter height and distance `(h_a m, d_k km)`, `None`
/// for open terrain
pub fn nominal_clutter(morphology: Morphology) -> Option<(f64, f64)> {
    match morphology {
        Morphology::Urban => Some((20.0, 0.02)),
        Morphology::Suburban => Some((9.0, 0.025)),
        Morphology::Rural => None,
    }
}

/// P.452 height-gain correction (dB, ≥ 0) for a station `height_m` AGL
pub fn p452_height_gain_db(frequency_mhz: f64, height_m: f64, morphology: Morphology) -> f64 {
    let Some((h_a, d_k)) = nominal_clutter(morphology) else {
        return 0.0;
    };
    let f_ghz = frequency_mhz / 1000.0;
    let f_fc = 0.25 + 0.375 * (1.0 + (7.5 * (f_ghz - 0.5)).tanh());
    let a_h = 10.25 * f_fc * (-d_k).exp() * (1.0 - (6.0 * (height_m / h_a - 0.625)).tanh()) - 0.33;
    a_h.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_p2108_median() {
        // 6 GHz, 10 km: Ll = 30.97, Ls = 59.21 -> median ≈ 30.97
        let l = p2108_terrestrial_db(6000.0, 10_000.0, 50.0);
        assert_relative_eq!(l, 30.97, epsilon = 0.05);
    }

    #[test]
    fn test_p2108_percentile_ordering() {
        let lo = p2108_terrestrial_db(6000.0, 5_000.0, 10.0);
        let hi = p2108_terrestrial_db(6000.0, 5_000.0, 90.0);
        assert!(lo < hi);
        assert!(lo >= 0.0);
    }

    #[test]
    fn test_height_gain() {
        assert_eq!(p452_height_gain_db(6000.0, 5.0, Morphology::Rural), 0.0);
        let low = p452_height_gain_db(6000.0, 3.0, Morphology::Urban);
        let high = p452_height_gain_db(6000.0, 60.0, Morphology::Urban);
        assert!(low > 15.0, "low = {}", low);
        assert_eq!(high, 0.0);
    }
}
