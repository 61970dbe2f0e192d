//! Refractivity and ITM-style variability terms

use crate::terrain::RadioClimate;

/// Actual earth radius used with the refractivity correction (m)
pub const EARTH_RADIUS_ITM_M: f64 = 6_370_000.0;

/// Effective earth radius for a surface refractivity `ns` (N-units):
/// `a / (1 - 0.04665·exp(ns / 179.3))`
pub fn effective_earth_radius_m(ns: f64) -> f64 {
    let gamma = 1.0 - 0.04665 * (ns / 179.3).exp();
    EARTH_RADIUS_ITM_M / gamma.max(0.05)
}

/// Terrain irregularity at distance: `Δh(d) = Δh·(1 - 0.8·exp(-d / 50 km))`
pub fn terrain_irregularity_at_m(delta_h_m: f64, distance_m: f64) -> f64 {
    delta_h_m * (1.0 - 0.8 * (-distance_m / 50_000.0).exp())
}

/// Location variability standard deviation (dB): `10·kΔh / (kΔh + 13)`,
/// with `k` the wave number in rad/m
pub fn location_sigma_db(delta_h_m: f64, distance_m: f64, frequency_mhz: f64) -> f64 {
    let wave_number = frequency_mhz / 47.7;
    let q = wave_number * terrain_irregularity_at_m(delta_h_m, distance_m).max(0.0);
    10.0 * q / (q + 13.0)
}

/// Long-path time variability spread by climate (dB)
fn climate_time_sigma_db(climate: RadioClimate) -> f64 {
    match climate {
        RadioClimate::Equatorial => 4.1,
        RadioClimate::ContinentalSubtropical => 4.4,
        RadioClimate::MaritimeSubtropical => 5.9,
        RadioClimate::Desert => 9.6,
        RadioClimate::ContinentalTemperate => 5.6,
        RadioClimate::MaritimeTemperateOverLand => 4.2,
        RadioClimate::MaritimeTemperateOverSea => 4.8,
    }
}

/// Time variability standard deviation (dB), growing from 0 on short paths
/// to the climate's long-path value
pub fn time_sigma_db(climate: RadioClimate, distance_m: f64) -> f64 {
    climate_time_sigma_db(climate) * (1.0 - (-distance_m / 50_000.0).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_effective_radius_near_four_thirds() {
        let k = effective_earth_radius_m(301.0) / EARTH_RADIUS_ITM_M;
        assert!((k - 4.0 / 3.0).abs() < 0.02, "k = {}", k);
        assert!(effective_earth_radius_m(350.0) > effective_earth_radius_m(250.0));
    }

    #[test]
    fn test_location_sigma() {
        assert_eq!(location_sigma_db(0.0, 20_000.0, 6000.0), 0.0);
        let s = location_sigma_db(90.0, 50_000.0, 6000.0);
        assert!(s > 9.0 && s < 10.0, "s = {}", s);
    }

    #[test]
    fn test_time_sigma() {
        assert_relative_eq!(time_sigma_db(RadioClimate::Desert, 0.0), 0.0, epsilon = 1e-12);
        assert!(time_sigma_db(RadioClimate::Desert, 100_000.0) > time_sigma_db(RadioClimate::Equatorial, 100_000.0));
    }
}
