//! Delta-Bullington terrain diffraction (ITU-R P.526 §4.5, P.452 §4.2)
//!
//! Heights are meters AMSL, distances meters along the profile. The loss
//! combines a Bullington knife-edge estimate over the real profile with a
//! smooth-earth correction:
//!
//! ```text
//! Ld = Lbull(actual) + max(Ldsph - Lbull(smooth), 0)
//! ```

use crate::config::Polarization;
use crate::terrain::TerrainProfile;

/// Ground electrical constants for the smooth-earth term
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundConstants {
    pub polarization: Polarization,
    pub permittivity: f64,
    /// Conductivity in S/m
    pub conductivity: f64,
}

/// Diffraction loss with its components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffractionLoss {
    pub total_db: f64,
    pub bullington_actual_db: f64,
    pub bullington_smooth_db: f64,
    pub spherical_db: f64,
}

// ---------------------------------------------------------------------------
// Knife-edge
// ---------------------------------------------------------------------------

/// Single knife-edge loss J(ν), 0 for ν ≤ -0.78
pub fn knife_edge_loss_db(nu: f64) -> f64 {
    if nu <= -0.78 {
        return 0.0;
    }
    let t = nu - 0.1;
    6.9 + 20.0 * (((t * t) + 1.0).sqrt() + t).log10()
}

/// Bullington loss for terminal heights `hts`/`hrs` over `heights`
/// sampled at `distances` (first and last samples are the terminals)
pub fn bullington_loss_db(
    distances: &[f64],
    heights: &[f64],
    hts: f64,
    hrs: f64,
    effective_radius_m: f64,
    wavelength_m: f64,
) -> f64 {
    let n = distances.len().min(heights.len());
    if n < 3 {
        return 0.0;
    }
    let d = distances[n - 1];
    if !(d > 0.0) {
        return 0.0;
    }
    let curvature = |di: f64| di * (d - di) / (2.0 * effective_radius_m);
    let interior = || (1..n - 1).filter(|&i| distances[i] > 0.0 && distances[i] < d);

    let s_tim = interior()
        .map(|i| (heights[i] + curvature(distances[i]) - hts) / distances[i])
        .fold(f64::NEG_INFINITY, f64::max);
    let s_tr = (hrs - hts) / d;

    let luc = if s_tim < s_tr {
        // line of sight: highest diffraction parameter along the path
        let nu_max = interior()
            .map(|i| {
                let di = distances[i];
                let clearance = heights[i] + curvature(di) - (hts * (d - di) + hrs * di) / d;
                clearance * (2.0 * d / (wavelength_m * di * (d - di))).sqrt()
            })
            .fold(f64::NEG_INFINITY, f64::max);
        knife_edge_loss_db(nu_max)
    } else {
        let s_rim = interior()
            .map(|i| (heights[i] + curvature(distances[i]) - hrs) / (d - distances[i]))
            .fold(f64::NEG_INFINITY, f64::max);
        let d_b = ((hrs - hts + s_rim * d) / (s_tim + s_rim)).clamp(1e-3, d - 1e-3);
        let nu_b = (hts + s_tim * d_b - (hts * (d - d_b) + hrs * d_b) / d)
            * (2.0 * d / (wavelength_m * d_b * (d - d_b))).sqrt();
        knife_edge_loss_db(nu_b)
    };

    luc + (1.0 - (-luc / 6.0).exp()) * (10.0 + 0.02 * d / 1000.0)
}

// ---------------------------------------------------------------------------
// Smooth earth
// ---------------------------------------------------------------------------

/// Least-squares smooth surface heights at the two terminals `(hst, hsr)`
pub fn smooth_surface_heights(distances: &[f64], heights: &[f64]) -> (f64, f64) {
    let n = distances.len().min(heights.len());
    if n < 2 {
        let h = heights.first().copied().unwrap_or(0.0);
        return (h, h);
    }
    let d = distances[n - 1];
    let (mut v1, mut v2) = (0.0, 0.0);
    for i in 1..n {
        let dd = distances[i] - distances[i - 1];
        v1 += dd * (heights[i] + heights[i - 1]);
        v2 += dd
            * (heights[i] * (2.0 * distances[i] + distances[i - 1])
                + heights[i - 1] * (distances[i] + 2.0 * distances[i - 1]));
    }
    let hst = (2.0 * v1 * d - v2) / (d * d);
    let hsr = (v2 - v1 * d) / (d * d);
    (hst, hsr)
}

fn surface_admittance_k(radius_m: f64, frequency_mhz: f64, ground: &GroundConstants) -> f64 {
    let a_km = radius_m / 1000.0;
    let s = 18_000.0 * ground.conductivity / frequency_mhz;
    let eps = ground.permittivity;
    let k_h = 0.036 * (a_km * frequency_mhz).powf(-1.0 / 3.0) * ((eps - 1.0).powi(2) + s * s).powf(-0.25);
    match ground.polarization {
        Polarization::Horizontal => k_h,
        Polarization::Vertical => k_h * (eps * eps + s * s).sqrt(),
    }
}

/// First-term spherical-earth diffraction loss over distance `d_m` for an
/// earth of radius `radius_m` with antenna heights above it
pub fn first_term_loss_db(
    d_m: f64,
    h1_m: f64,
    h2_m: f64,
    radius_m: f64,
    frequency_mhz: f64,
    ground: &GroundConstants,
) -> f64 {
    let k = surface_admittance_k(radius_m, frequency_mhz, ground);
    let k2 = k * k;
    let beta = (1.0 + 1.6 * k2 + 0.67 * k2 * k2) / (1.0 + 4.5 * k2 + 1.53 * k2 * k2);
    let a_km = radius_m / 1000.0;

    let x = 2.188 * beta * frequency_mhz.powf(1.0 / 3.0) * a_km.powf(-2.0 / 3.0) * (d_m / 1000.0);
    let y = |h: f64| 9.575e-3 * beta * frequency_mhz.powf(2.0 / 3.0) * a_km.powf(-1.0 / 3.0) * h;

    let f_x = if x >= 1.6 {
        11.0 + 10.0 * x.log10() - 17.6 * x
    } else {
        -20.0 * x.log10() - 5.6488 * x.powf(1.425)
    };
    let g_y = |yy: f64| {
        let b = beta * yy;
        let g = if b > 2.0 {
            17.6 * (b - 1.1).sqrt() - 5.0 * (b - 1.1).log10() - 8.0
        } else {
            20.0 * (b + 0.1 * b.powi(3)).log10()
        };
        g.max(2.0 + 20.0 * k.log10())
    };

    -f_x - g_y(y(h1_m)) - g_y(y(h2_m))
}

/// Spherical-earth diffraction loss Ldsph for heights above the smooth surface
pub fn spherical_earth_loss_db(
    d_m: f64,
    hte_m: f64,
    hre_m: f64,
    effective_radius_m: f64,
    frequency_mhz: f64,
    wavelength_m: f64,
    ground: &GroundConstants,
) -> f64 {
    let (hte, hre) = (hte_m.max(1.0), hre_m.max(1.0));
    let d_los = (2.0 * effective_radius_m).sqrt() * (hte.sqrt() + hre.sqrt());
    if d_m >= d_los {
        return first_term_loss_db(d_m, hte, hre, effective_radius_m, frequency_mhz, ground);
    }

    let c = (hte - hre) / (hte + hre);
    let m = d_m * d_m / (4.0 * effective_radius_m * (hte + hre));
    let b = 2.0
        * ((m + 1.0) / (3.0 * m)).sqrt()
        * (std::f64::consts::PI / 3.0
            + ((1.5 * c * (3.0 * m / (m + 1.0).powi(3)).sqrt()).clamp(-1.0, 1.0)).acos() / 3.0)
            .cos();
    let dse1 = d_m / 2.0 * (1.0 + b);
    let dse2 = d_m - dse1;
    let hse = ((hte - dse1 * dse1 / (2.0 * effective_radius_m)) * dse2
        + (hre - dse2 * dse2 / (2.0 * effective_radius_m)) * dse1)
        / d_m;
    let hreq = 0.552 * (dse1 * dse2 * wavelength_m / d_m).max(0.0).sqrt();
    if hse > hreq {
        return 0.0;
    }

    let aem = 0.5 * (d_m / (hte.sqrt() + hre.sqrt())).powi(2);
    let adft = first_term_loss_db(d_m, hte, hre, aem, frequency_mhz, ground);
    if adft < 0.0 {
        0.0
    } else {
        (1.0 - hse / hreq.max(f64::MIN_POSITIVE)) * adft
    }
}

// ---------------------------------------------------------------------------
// Combined
// ---------------------------------------------------------------------------

/// Delta-Bullington loss over `profile` between antennas at `h_tx_amsl`
/// (profile start) and `h_rx_amsl` (profile end)
pub fn delta_bullington(
    profile: &TerrainProfile,
    h_tx_amsl: f64,
    h_rx_amsl: f64,
    frequency_mhz: f64,
    effective_radius_m: f64,
    ground: &GroundConstants,
) -> DiffractionLoss {
    let wavelength_m = crate::coordinates::SPEED_OF_LIGHT / (frequency_mhz * 1e6);
    let distances = &profile.distances_m;
    let heights = &profile.terrain_m;
    let d = profile.total_distance_m();

    let bullington_actual_db =
        bullington_loss_db(distances, heights, h_tx_amsl, h_rx_amsl, effective_radius_m, wavelength_m);

    let (hst, hsr) = smooth_surface_heights(distances, heights);
    let h_first = heights.first().copied().unwrap_or(0.0);
    let h_last = heights.last().copied().unwrap_or(0.0);
    // smooth surface may not sit above the ground at either terminal
    let hte = h_tx_amsl - hst.min(h_first);
    let hre = h_rx_amsl - hsr.min(h_last);

    let flat = vec![0.0; heights.len()];
    let bullington_smooth_db = bullington_loss_db(distances, &flat, hte, hre, effective_radius_m, wavelength_m);

    let spherical_db = if d > 0.0 {
        spherical_earth_loss_db(d, hte, hre, effective_radius_m, frequency_mhz, wavelength_m, ground)
    } else {
        0.0
    };

    DiffractionLoss {
        total_db: bullington_actual_db + (spherical_db - bullington_smooth_db).max(0.0),
        bullington_actual_db,
        bullington_smooth_db,
        spherical_db,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ground() -> GroundConstants {
        GroundConstants {
            polarization: Polarization::Vertical,
            permittivity: 15.0,
            conductivity: 0.005,
        }
    }

    fn flat_profile(length_m: f64, points: usize, height: f64) -> TerrainProfile {
        let distances_m: Vec<f64> = (0..points).map(|i| length_m * i as f64 / (points - 1) as f64).collect();
        TerrainProfile {
            terrain_m: vec![height; points],
            building_m: vec![None; points],
            distances_m,
        }
    }

    #[test]
    fn test_knife_edge() {
        assert_eq!(knife_edge_loss_db(-1.0), 0.0);
        // grazing incidence ≈ 6 dB
        assert_relative_eq!(knife_edge_loss_db(0.0), 6.0, epsilon = 0.1);
        assert!(knife_edge_loss_db(2.0) > knife_edge_loss_db(1.0));
    }

    #[test]
    fn test_smooth_surface_of_line() {
        let distances = vec![0.0, 100.0, 200.0, 300.0];
        let heights = vec![10.0, 20.0, 30.0, 40.0];
        let (hst, hsr) = smooth_surface_heights(&distances, &heights);
        assert_relative_eq!(hst, 10.0, epsilon = 1e-9);
        assert_relative_eq!(hsr, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clear_short_path_has_no_loss() {
        let profile = flat_profile(2_000.0, 41, 0.0);
        let loss = delta_bullington(&profile, 50.0, 50.0, 6000.0, 8_500_000.0, &ground());
        assert_relative_eq!(loss.total_db, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_ridge_adds_loss() {
        let mut profile = flat_profile(10_000.0, 101, 0.0);
        profile.terrain_m[50] = 120.0;
        let loss = delta_bullington(&profile, 20.0, 20.0, 6000.0, 8_500_000.0, &ground());
        assert!(loss.bullington_actual_db > 20.0, "{:?}", loss);
        assert!(loss.total_db >= loss.bullington_actual_db);
    }

    #[test]
    fn test_beyond_horizon_spherical_loss() {
        // 60 km over flat ground with 10 m antennas is well beyond the radio horizon
        let profile = flat_profile(60_000.0, 201, 0.0);
        let loss = delta_bullington(&profile, 10.0, 10.0, 6000.0, 8_500_000.0, &ground());
        assert!(loss.spherical_db > 30.0, "{:?}", loss);
        assert!(loss.total_db > 0.0);
    }

    #[test]
    fn test_higher_antennas_lose_less() {
        let profile = flat_profile(40_000.0, 201, 0.0);
        let low = delta_bullington(&profile, 10.0, 10.0, 6000.0, 8_500_000.0, &ground());
        let high = delta_bullington(&profile, 60.0, 60.0, 6000.0, 8_500_000.0, &ground());
        assert!(high.total_db < low.total_db);
    }
}
