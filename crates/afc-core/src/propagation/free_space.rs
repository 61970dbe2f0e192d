//! Free-space path loss.

use std::f64::consts::PI;

use crate::coordinates::SPEED_OF_LIGHT;

/// Smallest distance used in the Friis equation (m)
pub const MIN_DISTANCE_M: f64 = 1.0;

/// Free-space path loss (Friis equation).
///
/// FSPL = 20 * log10(4 * pi * d * f / c)
///
/// Distances below [`MIN_DISTANCE_M`] are raised to it so the loss stays
/// finite and positive.
pub fn free_space_path_loss_db(distance_m: f64, frequency_mhz: f64) -> f64 {
    let d = distance_m.max(MIN_DISTANCE_M);
    20.0 * (4.0 * PI * d * frequency_mhz * 1e6 / SPEED_OF_LIGHT).log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fspl_1km_6ghz() {
        // 20log10(1000) + 20log10(6000) - 27.55
        assert_relative_eq!(free_space_path_loss_db(1000.0, 6000.0), 108.0, epsilon = 0.05);
    }

    #[test]
    fn test_fspl_doubling_adds_6db() {
        let a = free_space_path_loss_db(500.0, 6500.0);
        let b = free_space_path_loss_db(1000.0, 6500.0);
        assert_relative_eq!(b - a, 6.0206, epsilon = 1e-3);
    }

    #[test]
    fn test_fspl_clamps_tiny_distance() {
        let l = free_space_path_loss_db(0.0, 6000.0);
        assert!(l.is_finite() && l > 0.0);
    }
}
