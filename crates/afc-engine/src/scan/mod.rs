//! # Scan-Point Generator
//!
//! Expands an AP's uncertainty volume into an ordered, finite set of 3-D
//! evaluation points:
//!
//! 1. The horizontal shape is rasterised onto the terrain grid: every cell
//!    centre inside or on the outline is kept, north to south, then west to
//!    east. A shape smaller than a cell yields its centre.
//! 2. Each horizontal point gets the heights of the configured
//!    [`HeightScanPolicy`], converted to AGL with the terrain height there.
//! 3. Points under `scan.min_agl_m` are clamped or discarded.
//!
//! The result depends only on the request, the configuration and the
//! terrain snapshot.

pub mod shapes;

pub use shapes::HorizontalShape;

use serde::{Deserialize, Serialize};

use afc_core::config::{BelowMinHeightPolicy, HeightScanPolicy, ScanConfig};
use afc_core::coordinates::{GeoPoint, LlaPosition};
use afc_core::error::GeometryError;
use afc_core::propagation::PathEndpoint;
use afc_core::terrain::{Morphology, TerrainQuery};

use crate::request::{ApHeight, ApRequest, HeightReference};

/// Bounding boxes this many times larger than the point budget are refused
/// before rasterising
const BOUNDING_BOX_FACTOR: usize = 16;

/// One evaluation point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub height_amsl_m: f64,
    pub height_agl_m: f64,
    pub terrain_m: f64,
    pub morphology: Morphology,
    /// Grid row (latitude index) of the cell centre
    pub row: i64,
    /// Grid column (longitude index) of the cell centre
    pub col: i64,
    /// Position in the height list of this horizontal point
    pub height_index: usize,
}

impl ScanPoint {
    pub fn geo(&self) -> GeoPoint {
        GeoPoint::new(self.lat_deg, self.lon_deg)
    }

    pub fn lla(&self) -> LlaPosition {
        LlaPosition::new(self.lat_deg, self.lon_deg, self.height_amsl_m)
    }

    pub fn endpoint(&self) -> PathEndpoint {
        PathEndpoint::new(self.geo(), self.height_agl_m)
    }
}

/// Heights (in the request's reference) sampled by a policy, ascending and
/// without duplicates. A step policy needing more than `limit` samples, or
/// with a non-positive step, is refused before anything is allocated.
pub fn height_samples(height: &ApHeight, policy: &HeightScanPolicy, limit: usize) -> Result<Vec<f64>, GeometryError> {
    let h = height.height_m;
    let u = height.vertical_uncertainty_m.max(0.0);
    let mut samples = match *policy {
        HeightScanPolicy::Fixed => vec![h],
        HeightScanPolicy::MinMax => vec![h - u, h + u],
        HeightScanPolicy::MinMidMax => vec![h - u, h, h + u],
        HeightScanPolicy::Step { step_m } => {
            let (lo, hi) = (h - u, h + u);
            let steps = if step_m > 0.0 { ((hi - lo) / step_m).ceil() } else { f64::INFINITY };
            if !(steps < limit as f64) {
                return Err(GeometryError::TooManyPoints {
                    count: if steps.is_finite() { steps as usize + 1 } else { usize::MAX },
                    limit,
                });
            }
            let mut v: Vec<f64> = (0..steps as usize)
                .map(|i| lo + i as f64 * step_m)
                .take_while(|z| *z < hi - 1e-9)
                .collect();
            v.push(hi);
            v
        }
    };
    samples.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
    Ok(samples)
}

/// Rasterises uncertainty volumes against one terrain snapshot
pub struct ScanPointGenerator<'a> {
    config: &'a ScanConfig,
    terrain: TerrainQuery<'a>,
}

impl<'a> ScanPointGenerator<'a> {
    pub fn new(config: &'a ScanConfig, terrain: TerrainQuery<'a>) -> Self {
        Self { config, terrain }
    }

    /// Grid cell size `(lat, lon)` in degrees and the grid origin
    fn grid(&self) -> ((f64, f64), GeoPoint) {
        match self.config.resolution_arcsec {
            Some(arcsec) => ((arcsec / 3600.0, arcsec / 3600.0), GeoPoint::new(0.0, 0.0)),
            None => (self.terrain.source().resolution_deg(), self.terrain.source().grid_origin()),
        }
    }

    /// Horizontal cell centres inside the shape, north to south then west to east
    pub fn horizontal_points(&self, shape: &HorizontalShape) -> Result<Vec<(GeoPoint, i64, i64)>, GeometryError> {
        let ((dlat, dlon), origin) = self.grid();
        let (sw, ne) = shape.bounds();

        let row_lo = ((sw.lat_deg - origin.lat_deg) / dlat - 0.5).floor() as i64;
        let row_hi = ((ne.lat_deg - origin.lat_deg) / dlat - 0.5).ceil() as i64;
        let col_lo = ((sw.lon_deg - origin.lon_deg) / dlon - 0.5).floor() as i64;
        let col_hi = ((ne.lon_deg - origin.lon_deg) / dlon - 0.5).ceil() as i64;

        let cells = ((row_hi - row_lo + 1).max(0) as usize).saturating_mul((col_hi - col_lo + 1).max(0) as usize);
        let limit = self.config.max_points;
        if cells > limit.saturating_mul(BOUNDING_BOX_FACTOR) {
            return Err(GeometryError::TooManyPoints { count: cells, limit });
        }

        let center = shape.center();
        let mut points = Vec::new();
        for row in (row_lo..=row_hi).rev() {
            let lat = origin.lat_deg + (row as f64 + 0.5) * dlat;
            for col in col_lo..=col_hi {
                let lon = origin.lon_deg + (col as f64 + 0.5) * dlon;
                let p = GeoPoint::new(lat, lon);
                let (east, north) = center.local_offset_m(&p);
                if shape.contains_local(east, north) {
                    points.push((p, row, col));
                }
            }
        }

        if points.is_empty() {
            let row = ((center.lat_deg - origin.lat_deg) / dlat).floor() as i64;
            let col = ((center.lon_deg - origin.lon_deg) / dlon).floor() as i64;
            points.push((center, row, col));
        }
        Ok(points)
    }

    /// Generate all scan points for a request
    pub fn generate(&self, request: &ApRequest) -> Result<Vec<ScanPoint>, GeometryError> {
        if !request.height.vertical_uncertainty_m.is_finite() || request.height.vertical_uncertainty_m < 0.0 {
            return Err(GeometryError::NegativeUncertainty(request.height.vertical_uncertainty_m));
        }
        let shape = HorizontalShape::from_location(&request.location)?;
        let horizontal = self.horizontal_points(&shape)?;
        let heights = height_samples(&request.height, &self.config.height_policy, self.config.max_points)?;

        let total = horizontal.len() * heights.len();
        if total > self.config.max_points {
            return Err(GeometryError::TooManyPoints {
                count: total,
                limit: self.config.max_points,
            });
        }

        let min_agl = self.config.min_agl_m;
        let mut points = Vec::with_capacity(total);
        let mut discarded = 0usize;

        for (p, row, col) in horizontal {
            let sample = self.terrain.point(&p);
            let mut agl_heights: Vec<f64> = Vec::with_capacity(heights.len());
            for h in &heights {
                let agl = match request.height.reference {
                    HeightReference::Agl => *h,
                    HeightReference::Amsl => *h - sample.terrain_m,
                };
                if agl < min_agl {
                    match self.config.below_min_height {
                        BelowMinHeightPolicy::Clamp => agl_heights.push(min_agl),
                        BelowMinHeightPolicy::Discard => discarded += 1,
                    }
                } else {
                    agl_heights.push(agl);
                }
            }
            agl_heights.dedup_by(|a, b| (*a - *b).abs() < 1e-9);

            for (height_index, agl) in agl_heights.into_iter().enumerate() {
                points.push(ScanPoint {
                    lat_deg: p.lat_deg,
                    lon_deg: p.lon_deg,
                    height_amsl_m: sample.terrain_m + agl,
                    height_agl_m: agl,
                    terrain_m: sample.terrain_m,
                    morphology: sample.morphology,
                    row,
                    col,
                    height_index,
                });
            }
        }

        if points.is_empty() {
            return Err(GeometryError::NoValidPoints {
                discarded,
                min_agl_m: min_agl,
            });
        }

        tracing::debug!(
            request_id = %request.request_id,
            points = points.len(),
            discarded,
            "generated scan points"
        );
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_request;
    use crate::request::LocationUncertainty;
    use afc_core::observe::DataQuality;
    use afc_core::terrain::FlatTerrain;

    fn terrain(height: f64) -> FlatTerrain {
        let mut t = FlatTerrain::new(height, Morphology::Suburban);
        t.resolution_arcsec = 1.0;
        t
    }

    #[test]
    fn test_height_policies() {
        let h = ApHeight {
            height_m: 10.0,
            vertical_uncertainty_m: 2.0,
            reference: HeightReference::Agl,
        };
        let samples = |policy: HeightScanPolicy| height_samples(&h, &policy, 100).unwrap();
        assert_eq!(samples(HeightScanPolicy::Fixed), vec![10.0]);
        assert_eq!(samples(HeightScanPolicy::MinMax), vec![8.0, 12.0]);
        assert_eq!(samples(HeightScanPolicy::MinMidMax), vec![8.0, 10.0, 12.0]);
        assert_eq!(samples(HeightScanPolicy::Step { step_m: 1.5 }), vec![8.0, 9.5, 11.0, 12.0]);
        assert_eq!(samples(HeightScanPolicy::Step { step_m: 2.0 }), vec![8.0, 10.0, 12.0]);
        let exact = ApHeight {
            vertical_uncertainty_m: 0.0,
            ..h
        };
        assert_eq!(height_samples(&exact, &HeightScanPolicy::MinMidMax, 100).unwrap(), vec![10.0]);
    }

    #[test]
    fn test_step_policy_refused_before_sampling() {
        let h = ApHeight {
            height_m: 10.0,
            vertical_uncertainty_m: 5.0,
            reference: HeightReference::Agl,
        };
        for step_m in [0.0, -1.0, f64::NAN, 1e-9] {
            let err = height_samples(&h, &HeightScanPolicy::Step { step_m }, 1_000).unwrap_err();
            assert!(matches!(err, GeometryError::TooManyPoints { limit: 1_000, .. }), "step {}", step_m);
        }
        assert_eq!(height_samples(&h, &HeightScanPolicy::Step { step_m: 5.0 }, 3).unwrap(), vec![5.0, 10.0, 15.0]);
    }

    #[test]
    fn test_points_inside_and_ordered() {
        let t = terrain(1000.0);
        let quality = DataQuality::new();
        let config = ScanConfig::default();
        let gen = ScanPointGenerator::new(&config, TerrainQuery::new(&t, &quality));
        let req = sample_request();
        let points = gen.generate(&req).unwrap();
        assert!(!points.is_empty());

        let shape = HorizontalShape::from_location(&req.location).unwrap();
        for p in &points {
            assert!(shape.contains(&p.geo()));
            assert_eq!(p.terrain_m, 1000.0);
            assert!((p.height_amsl_m - p.terrain_m - p.height_agl_m).abs() < 1e-9);
        }
        for w in points.windows(2) {
            let (a, b) = (&w[0], &w[1]);
            assert!(a.row > b.row || (a.row == b.row && (a.col, a.height_index) < (b.col, b.height_index)));
        }
    }

    #[test]
    fn test_deterministic() {
        let t = terrain(0.0);
        let quality = DataQuality::new();
        let config = ScanConfig::default();
        let gen = ScanPointGenerator::new(&config, TerrainQuery::new(&t, &quality));
        let req = sample_request();
        assert_eq!(gen.generate(&req).unwrap(), gen.generate(&req).unwrap());
    }

    #[test]
    fn test_tiny_shape_uses_centre() {
        let t = terrain(0.0);
        let quality = DataQuality::new();
        let config = ScanConfig {
            resolution_arcsec: Some(30.0),
            height_policy: HeightScanPolicy::Fixed,
            ..ScanConfig::default()
        };
        let gen = ScanPointGenerator::new(&config, TerrainQuery::new(&t, &quality));
        let mut req = sample_request();
        let center = GeoPoint::new(40.00011, -105.00013);
        req.location = LocationUncertainty::Ellipse {
            center,
            semi_major_m: 1.0,
            semi_minor_m: 1.0,
            orientation_deg: 0.0,
        };
        let points = gen.generate(&req).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].geo(), center);
    }

    #[test]
    fn test_amsl_below_ground_clamped_or_discarded() {
        let t = terrain(1600.0);
        let quality = DataQuality::new();
        let mut req = sample_request();
        req.height = ApHeight {
            height_m: 1500.0,
            vertical_uncertainty_m: 0.0,
            reference: HeightReference::Amsl,
        };

        let clamp = ScanConfig::default();
        let points = ScanPointGenerator::new(&clamp, TerrainQuery::new(&t, &quality))
            .generate(&req)
            .unwrap();
        assert!(points.iter().all(|p| p.height_agl_m == clamp.min_agl_m));

        let discard = ScanConfig {
            below_min_height: BelowMinHeightPolicy::Discard,
            ..ScanConfig::default()
        };
        let err = ScanPointGenerator::new(&discard, TerrainQuery::new(&t, &quality))
            .generate(&req)
            .unwrap_err();
        assert!(matches!(err, GeometryError::NoValidPoints { .. }));
    }

    #[test]
    fn test_point_budget() {
        let t = terrain(0.0);
        let quality = DataQuality::new();
        let config = ScanConfig {
            max_points: 3,
            ..ScanConfig::default()
        };
        let gen = ScanPointGenerator::new(&config, TerrainQuery::new(&t, &quality));
        let err = gen.generate(&sample_request()).unwrap_err();
        assert!(matches!(err, GeometryError::TooManyPoints { .. }));
    }
}
