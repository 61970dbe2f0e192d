//! Near-field gain adjustment
//!
//! When an interferer sits closer to a dish than its far-field (Fraunhofer)
//! distance `2·D²/λ`, the aperture cannot realise its far-field gain. The
//! reduction is tabulated against the normalised distance
//! `Δ = d / (2·D²/λ)` for several aperture efficiencies and interpolated
//! bilinearly. Every entry is ≤ 0 dB and the last column (`Δ = 1`) is
//! exactly 0, so the adjustment can only remove gain and vanishes at the
//! far-field boundary.

use serde::{Deserialize, Serialize};

/// Sorted 2-D table of near-field gain adjustments (dB)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearFieldTable {
    /// Normalised distances, strictly ascending, last entry 1.0
    pub distances: Vec<f64>,
    /// Aperture efficiencies, strictly ascending
    pub efficiencies: Vec<f64>,
    /// `values[e][d]`: adjustment at efficiency `e` and distance `d`
    pub values: Vec<Vec<f64>>,
}

impl Default for NearFieldTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl NearFieldTable {
    /// Adjustments for circular parabolic apertures with tapered
    /// illumination. Heavier taper (lower efficiency) keeps more gain.
    pub fn standard() -> Self {
        let distances = vec![0.05, 0.10, 0.15, 0.20, 0.30, 0.40, 0.50, 0.60, 0.80, 1.00];
        let efficiencies = vec![0.40, 0.50, 0.60, 0.70];
        let values = vec![
            vec![-7.6, -4.4, -2.7, -1.8, -0.9, -0.5, -0.3, -0.2, -0.1, 0.0],
            vec![-8.5, -5.2, -3.3, -2.2, -1.1, -0.6, -0.4, -0.2, -0.1, 0.0],
            vec![-9.4, -6.0, -3.9, -2.6, -1.3, -0.8, -0.5, -0.3, -0.1, 0.0],
            vec![-10.3, -6.8, -4.5, -3.1, -1.6, -0.9, -0.6, -0.4, -0.1, 0.0],
        ];
        Self {
            distances,
            efficiencies,
            values,
        }
    }

    /// Build a table, checking shape, ordering and sign
    pub fn new(distances: Vec<f64>, efficiencies: Vec<f64>, values: Vec<Vec<f64>>) -> Option<Self> {
        let ascending = |v: &[f64]| v.windows(2).all(|w| w[0] < w[1]);
        let shape_ok = !distances.is_empty()
            && !efficiencies.is_empty()
            && values.len() == efficiencies.len()
            && values.iter().all(|row| row.len() == distances.len());
        let values_ok = values.iter().flatten().all(|v| v.is_finite() && *v <= 0.0);
        if !shape_ok || !values_ok || !ascending(&distances) || !ascending(&efficiencies) {
            return None;
        }
        Some(Self {
            distances,
            efficiencies,
            values,
        })
    }

    /// Adjustment (dB, ≤ 0) at normalised distance `delta` and efficiency `eta`.
    ///
    /// Zero at or beyond `Δ = 1`; clamped to the table edges otherwise.
    pub fn adjustment_db(&self, delta: f64, eta: f64) -> f64 {
        if !(delta < 1.0) {
            return 0.0;
        }
        let (d0, d1, td) = bracket(&self.distances, delta);
        let (e0, e1, te) = bracket(&self.efficiencies, eta);
        let v = |e: usize, d: usize| self.values[e][d];
        let low = v(e0, d0) + (v(e0, d1) - v(e0, d0)) * td;
        let high = v(e1, d0) + (v(e1, d1) - v(e1, d0)) * td;
        (low + (high - low) * te).min(0.0)
    }
}

/// Far-field (Fraunhofer) distance `2·D²/λ` in meters
pub fn far_field_distance_m(diameter_m: f64, wavelength_m: f64) -> f64 {
    2.0 * diameter_m * diameter_m / wavelength_m
}

/// Indices and fraction bracketing `x` in an ascending axis, clamped
fn bracket(axis: &[f64], x: f64) -> (usize, usize, f64) {
    let last = axis.len() - 1;
    if axis.len() == 1 || x <= axis[0] {
        return (0, 0, 0.0);
    }
    if x >= axis[last] {
        return (last, last, 0.0);
    }
    let hi = axis.partition_point(|a| *a <= x).min(last);
    let lo = hi - 1;
    let t = (x - axis[lo]) / (axis[hi] - axis[lo]);
    (lo, hi, t)
}
