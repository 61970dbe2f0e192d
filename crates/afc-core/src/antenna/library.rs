//! Measured antenna patterns
//!
//! [`PatternTable`] is an immutable, angle-sorted table of relative gain
//! (dB below peak) built once and shared behind an `Arc`.
//! [`AntennaLibrary`] maps antenna model names to tables and carries the
//! near-field adjustment table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::near_field::NearFieldTable;
use super::pattern::fold_angle_deg;

/// Relative gain versus off-axis angle, sorted by angle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(f64, f64)>", into = "Vec<(f64, f64)>")]
pub struct PatternTable {
    points: Vec<(f64, f64)>,
}

impl PatternTable {
    /// Build from `(off_axis_deg, relative_gain_db)` pairs in any order.
    ///
    /// Angles are folded into [0, 180]; duplicate angles keep the highest
    /// gain. Returns `None` if no finite point remains.
    pub fn new(points: Vec<(f64, f64)>) -> Option<Self> {
        let mut points: Vec<(f64, f64)> = points
            .into_iter()
            .filter(|(a, g)| a.is_finite() && g.is_finite())
            .map(|(a, g)| (fold_angle_deg(a), g))
            .collect();
        if points.is_empty() {
            return None;
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0).then(b.1.total_cmp(&a.1)));
        points.dedup_by(|later, earlier| later.0 == earlier.0);
        Some(Self { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Linearly interpolated relative gain (dB); held constant past the
    /// ends and never above the peak
    pub fn relative_gain_db(&self, off_axis_deg: f64) -> f64 {
        self.interpolate(off_axis_deg).min(0.0)
    }

    fn interpolate(&self, off_axis_deg: f64) -> f64 {
        let phi = fold_angle_deg(off_axis_deg);
        let pts = &self.points;
        let first = pts[0];
        let last = pts[pts.len() - 1];
        if phi <= first.0 {
            return first.1;
        }
        if phi >= last.0 {
            return last.1;
        }
        let hi = pts.partition_point(|p| p.0 <= phi);
        let (a0, g0) = pts[hi - 1];
        let (a1, g1) = pts[hi];
        g0 + (g1 - g0) * (phi - a0) / (a1 - a0)
    }
}

impl TryFrom<Vec<(f64, f64)>> for PatternTable {
    type Error = String;

    fn try_from(points: Vec<(f64, f64)>) -> Result<Self, Self::Error> {
        PatternTable::new(points).ok_or_else(|| "pattern has no finite points".to_string())
    }
}

impl From<PatternTable> for Vec<(f64, f64)> {
    fn from(table: PatternTable) -> Self {
        table.points
    }
}

/// Measured patterns by model name, plus the near-field table
#[derive(Debug, Clone, Default)]
pub struct AntennaLibrary {
    patterns: HashMap<String, Arc<PatternTable>>,
    near_field: NearFieldTable,
}

impl AntennaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_near_field(mut self, table: NearFieldTable) -> Self {
        self.near_field = table;
        self
    }

    /// Register a measured pattern; model names are matched case-insensitively
    pub fn insert(&mut self, model: &str, table: PatternTable) {
        self.patterns.insert(normalize_model(model), Arc::new(table));
    }

    pub fn with_pattern(mut self, model: &str, table: PatternTable) -> Self {
        self.insert(model, table);
        self
    }

    pub fn pattern(&self, model: &str) -> Option<&Arc<PatternTable>> {
        self.patterns.get(&normalize_model(model))
    }

    pub fn near_field(&self) -> &NearFieldTable {
        &self.near_field
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn normalize_model(model: &str) -> String {
    model.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sorted_interpolation() {
        let t = PatternTable::new(vec![(10.0, -30.0), (0.0, 0.0), (5.0, -20.0), (180.0, -50.0)]).unwrap();
        assert_eq!(t.points()[0], (0.0, 0.0));
        assert_relative_eq!(t.relative_gain_db(2.5), -10.0, epsilon = 1e-12);
        assert_relative_eq!(t.relative_gain_db(-7.5), -25.0, epsilon = 1e-12);
        assert_relative_eq!(t.relative_gain_db(200.0), t.relative_gain_db(160.0), epsilon = 1e-12);
    }

    #[test]
    fn test_duplicates_keep_highest() {
        let t = PatternTable::new(vec![(5.0, -25.0), (5.0, -20.0), (-5.0, -22.0)]).unwrap();
        assert_eq!(t.points().len(), 1);
        assert_eq!(t.relative_gain_db(5.0), -20.0);
    }

    #[test]
    fn test_positive_entries_capped_at_peak() {
        let t = PatternTable::new(vec![(0.0, 1.5), (4.0, 2.0), (20.0, -30.0)]).unwrap();
        assert_eq!(t.relative_gain_db(0.0), 0.0);
        assert_eq!(t.relative_gain_db(4.0), 0.0);
        assert_relative_eq!(t.relative_gain_db(12.0), -14.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_rejected() {
        assert!(PatternTable::new(vec![]).is_none());
        assert!(PatternTable::new(vec![(f64::NAN, 0.0)]).is_none());
    }

    #[test]
    fn test_library_lookup() {
        let t = PatternTable::new(vec![(0.0, 0.0), (90.0, -40.0)]).unwrap();
        let lib = AntennaLibrary::new().with_pattern("uhx10-59", t);
        assert!(lib.pattern("UHX10-59").is_some());
        assert!(lib.pattern(" uhx10-59 ").is_some());
        assert!(lib.pattern("PAR8-65").is_none());
        assert_eq!(lib.len(), 1);
    }
}
