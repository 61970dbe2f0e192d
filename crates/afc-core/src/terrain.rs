//! Terrain and clutter provider
//!
//! The engine treats terrain, building (surface) heights, land-cover
//! morphology and radio-climate maps as a read-only oracle behind the
//! [`TerrainSource`] trait. [`TerrainQuery`] wraps a source with the
//! documented fallbacks: a point with no tile is flat (0 m), rural, and
//! counted as a data-quality event instead of failing the request.

use serde::{Deserialize, Serialize};

use crate::coordinates::GeoPoint;
use crate::observe::DataQuality;

/// Land-cover morphology class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Morphology {
    Urban,
    Suburban,
    Rural,
}

impl Default for Morphology {
    fn default() -> Self {
        Morphology::Rural
    }
}

/// ITM radio climate, ordered by climate code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadioClimate {
    Equatorial = 1,
    ContinentalSubtropical = 2,
    MaritimeSubtropical = 3,
    Desert = 4,
    ContinentalTemperate = 5,
    MaritimeTemperateOverLand = 6,
    MaritimeTemperateOverSea = 7,
}

impl Default for RadioClimate {
    fn default() -> Self {
        RadioClimate::ContinentalTemperate
    }
}

impl RadioClimate {
    /// Less favourable of two endpoint climates (lower climate code)
    pub fn less_favorable(self, other: RadioClimate) -> RadioClimate {
        self.min(other)
    }
}

/// One terrain lookup result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainSample {
    /// Bare-earth height in meters AMSL
    pub terrain_m: f64,
    /// Building / surface height above terrain, if a surface model covers the point
    pub building_m: Option<f64>,
    pub morphology: Morphology,
}

impl TerrainSample {
    /// Flat rural fallback for points with no data
    pub fn fallback() -> Self {
        Self {
            terrain_m: 0.0,
            building_m: None,
            morphology: Morphology::Rural,
        }
    }

    /// Top-of-surface height (terrain + building)
    pub fn surface_m(&self) -> f64 {
        self.terrain_m + self.building_m.unwrap_or(0.0)
    }
}

/// Read-only terrain/clutter oracle
pub trait TerrainSource: Send + Sync {
    /// Terrain sample at a point; `None` when no tile covers it
    fn sample(&self, point: &GeoPoint) -> Option<TerrainSample>;

    /// Native raster cell size in degrees `(lat, lon)`
    fn resolution_deg(&self) -> (f64, f64);

    /// Grid origin; cell centres sit at `origin + (i + 0.5) * resolution`
    fn grid_origin(&self) -> GeoPoint {
        GeoPoint::new(0.0, 0.0)
    }

    /// ITM radio climate at a point
    fn radio_climate(&self, _point: &GeoPoint) -> Option<RadioClimate> {
        None
    }

    /// Surface refractivity (N-units) at a point
    fn surface_refractivity(&self, _point: &GeoPoint) -> Option<f64> {
        None
    }

    /// Human-readable identifier
    fn name(&self) -> &str;
}

/// Elevation profile between two points
#[derive(Debug, Clone)]
pub struct TerrainProfile {
    /// Distance of each sample from the start, meters
    pub distances_m: Vec<f64>,
    /// Terrain height of each sample, meters AMSL
    pub terrain_m: Vec<f64>,
    /// Building height above terrain at each sample, if surface data covers it
    pub building_m: Vec<Option<f64>>,
}

impl TerrainProfile {
    pub fn total_distance_m(&self) -> f64 {
        self.distances_m.last().copied().unwrap_or(0.0)
    }

    /// Whether a surface model covers every sample
    pub fn has_full_surface_coverage(&self) -> bool {
        !self.building_m.is_empty() && self.building_m.iter().all(|b| b.is_some())
    }

    /// Interdecile range of the terrain heights (terrain irregularity Δh)
    pub fn interdecile_range_m(&self) -> f64 {
        if self.terrain_m.len() < 3 {
            return 0.0;
        }
        let mut sorted = self.terrain_m.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len() - 1;
        let lo = sorted[(0.1 * n as f64).round() as usize];
        let hi = sorted[(0.9 * n as f64).round() as usize];
        hi - lo
    }
}

/// A terrain source paired with the per-request data-quality counters
#[derive(Clone, Copy)]
pub struct TerrainQuery<'a> {
    source: &'a dyn TerrainSource,
    quality: &'a DataQuality,
}

impl<'a> TerrainQuery<'a> {
    pub fn new(source: &'a dyn TerrainSource, quality: &'a DataQuality) -> Self {
        Self { source, quality }
    }

    pub fn source(&self) -> &'a dyn TerrainSource {
        self.source
    }

    pub fn quality(&self) -> &'a DataQuality {
        self.quality
    }

    /// Sample with the flat/rural fallback
    pub fn point(&self, point: &GeoPoint) -> TerrainSample {
        match self.source.sample(point) {
            Some(sample) if sample.terrain_m.is_finite() => sample,
            _ => {
                self.quality.missing_terrain.inc();
                tracing::trace!(
                    lat = point.lat_deg,
                    lon = point.lon_deg,
                    source = self.source.name(),
                    "no terrain tile, assuming flat rural"
                );
                TerrainSample::fallback()
            }
        }
    }

    /// Radio climate with the continental-temperate fallback
    pub fn radio_climate(&self, point: &GeoPoint) -> RadioClimate {
        self.source.radio_climate(point).unwrap_or_else(|| {
            self.quality.missing_climate_data.inc();
            RadioClimate::default()
        })
    }

    /// Surface refractivity with a fallback value
    pub fn surface_refractivity(&self, point: &GeoPoint, fallback: f64) -> f64 {
        self.source
            .surface_refractivity(point)
            .filter(|n| n.is_finite() && *n > 0.0)
            .unwrap_or_else(|| {
                self.quality.missing_climate_data.inc();
                fallback
            })
    }

    /// Sample a profile with at most `step_m` between samples
    pub fn profile(&self, start: &GeoPoint, end: &GeoPoint, step_m: f64) -> TerrainProfile {
        let distance = start.distance_to(end);
        let intervals = ((distance / step_m.max(1.0)).ceil() as usize).max(1);
        let mut profile = TerrainProfile {
            distances_m: Vec::with_capacity(intervals + 1),
            terrain_m: Vec::with_capacity(intervals + 1),
            building_m: Vec::with_capacity(intervals + 1),
        };
        for i in 0..=intervals {
            let t = i as f64 / intervals as f64;
            let p = start.interpolate(end, t);
            let sample = self.point(&p);
            profile.distances_m.push(distance * t);
            profile.terrain_m.push(sample.terrain_m);
            profile.building_m.push(sample.building_m);
        }
        profile
    }
}

/// Constant-height terrain, mostly for tests and coarse studies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatTerrain {
    pub height_m: f64,
    pub morphology: Morphology,
    /// Building height reported everywhere (simulates full surface coverage)
    pub building_m: Option<f64>,
    pub resolution_arcsec: f64,
    pub climate: RadioClimate,
    pub refractivity: Option<f64>,
}

impl Default for FlatTerrain {
    fn default() -> Self {
        Self {
            height_m: 0.0,
            morphology: Morphology::Rural,
            building_m: None,
            resolution_arcsec: 1.0,
            climate: RadioClimate::ContinentalTemperate,
            refractivity: Some(301.0),
        }
    }
}

impl FlatTerrain {
    pub fn new(height_m: f64, morphology: Morphology) -> Self {
        Self {
            height_m,
            morphology,
            ..Default::default()
        }
    }
}

impl TerrainSource for FlatTerrain {
    fn sample(&self, _point: &GeoPoint) -> Option<TerrainSample> {
        Some(TerrainSample {
            terrain_m: self.height_m,
            building_m: self.building_m,
            morphology: self.morphology,
        })
    }

    fn resolution_deg(&self) -> (f64, f64) {
        let deg = self.resolution_arcsec / 3600.0;
        (deg, deg)
    }

    fn radio_climate(&self, _point: &GeoPoint) -> Option<RadioClimate> {
        Some(self.climate)
    }

    fn surface_refractivity(&self, _point: &GeoPoint) -> Option<f64> {
        self.refractivity
    }

    fn name(&self) -> &str {
        "flat"
    }
}

/// In-memory elevation raster with optional building and morphology layers.
///
/// Row 0 is the southernmost row; values are row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterTerrain {
    pub south_west: GeoPoint,
    pub rows: usize,
    pub cols: usize,
    pub cell_deg: (f64, f64),
    pub heights_m: Vec<f32>,
    /// Building heights above terrain (NaN = no surface data)
    #[serde(default)]
    pub buildings_m: Option<Vec<f32>>,
    #[serde(default)]
    pub morphology: Option<Vec<Morphology>>,
    #[serde(default)]
    pub default_morphology: Morphology,
}

impl RasterTerrain {
    pub fn new(south_west: GeoPoint, rows: usize, cols: usize, cell_deg: (f64, f64), heights_m: Vec<f32>) -> Self {
        Self {
            south_west,
            rows,
            cols,
            cell_deg,
            heights_m,
            buildings_m: None,
            morphology: None,
            default_morphology: Morphology::Rural,
        }
    }

    pub fn with_buildings(mut self, buildings_m: Vec<f32>) -> Self {
        self.buildings_m = Some(buildings_m);
        self
    }

    pub fn with_morphology(mut self, morphology: Vec<Morphology>) -> Self {
        self.morphology = Some(morphology);
        self
    }

    /// Fractional cell coordinates (row, col) measured between cell centres
    fn fractional_index(&self, point: &GeoPoint) -> Option<(f64, f64)> {
        let r = (point.lat_deg - self.south_west.lat_deg) / self.cell_deg.0 - 0.5;
        let c = (point.lon_deg - self.south_west.lon_deg) / self.cell_deg.1 - 0.5;
        let inside = r >= -0.5
            && c >= -0.5
            && r <= self.rows as f64 - 0.5
            && c <= self.cols as f64 - 0.5;
        inside.then_some((r, c))
    }

    fn at(&self, row: usize, col: usize) -> f64 {
        self.heights_m[row * self.cols + col] as f64
    }

    fn nearest_index(&self, r: f64, c: f64) -> usize {
        let row = (r.round().max(0.0) as usize).min(self.rows - 1);
        let col = (c.round().max(0.0) as usize).min(self.cols - 1);
        row * self.cols + col
    }
}

impl TerrainSource for RasterTerrain {
    fn sample(&self, point: &GeoPoint) -> Option<TerrainSample> {
        if self.rows == 0 || self.cols == 0 || self.heights_m.len() != self.rows * self.cols {
            return None;
        }
        let (r, c) = self.fractional_index(point)?;

        // bilinear between surrounding cell centres, clamped at the edges
        let r0 = r.floor().clamp(0.0, (self.rows - 1) as f64) as usize;
        let c0 = c.floor().clamp(0.0, (self.cols - 1) as f64) as usize;
        let r1 = (r0 + 1).min(self.rows - 1);
        let c1 = (c0 + 1).min(self.cols - 1);
        let fr = (r - r0 as f64).clamp(0.0, 1.0);
        let fc = (c - c0 as f64).clamp(0.0, 1.0);
        let h = self.at(r0, c0) * (1.0 - fr) * (1.0 - fc)
            + self.at(r0, c1) * (1.0 - fr) * fc
            + self.at(r1, c0) * fr * (1.0 - fc)
            + self.at(r1, c1) * fr * fc;

        let idx = self.nearest_index(r, c);
        let building_m = self
            .buildings_m
            .as_ref()
            .and_then(|b| b.get(idx).copied())
            .filter(|b| !b.is_nan())
            .map(|b| b as f64);
        let morphology = self
            .morphology
            .as_ref()
            .and_then(|m| m.get(idx).copied())
            .unwrap_or(self.default_morphology);

        Some(TerrainSample {
            terrain_m: h,
            building_m,
            morphology,
        })
    }

    fn resolution_deg(&self) -> (f64, f64) {
        self.cell_deg
    }

    fn grid_origin(&self) -> GeoPoint {
        self.south_west
    }

    fn name(&self) -> &str {
        "raster"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp() -> RasterTerrain {
        // 3x3 grid, 0.01 deg cells, height increases eastward by 10 m per cell
        let heights = vec![0.0, 10.0, 20.0, 0.0, 10.0, 20.0, 0.0, 10.0, 20.0];
        RasterTerrain::new(GeoPoint::new(40.0, -105.0), 3, 3, (0.01, 0.01), heights)
    }

    #[test]
    fn test_raster_cell_centre() {
        let t = ramp();
        let s = t.sample(&GeoPoint::new(40.015, -104.985)).unwrap();
        assert_relative_eq!(s.terrain_m, 10.0, epsilon = 1e-6);
    }

    #[test]
    fn test_raster_bilinear() {
        let t = ramp();
        let s = t.sample(&GeoPoint::new(40.015, -104.98)).unwrap();
        assert_relative_eq!(s.terrain_m, 15.0, epsilon = 1e-6);
    }

    #[test]
    fn test_raster_outside() {
        let t = ramp();
        assert!(t.sample(&GeoPoint::new(41.0, -105.0)).is_none());
    }

    #[test]
    fn test_fallback_counts_missing() {
        let t = ramp();
        let quality = DataQuality::new();
        let query = TerrainQuery::new(&t, &quality);
        let s = query.point(&GeoPoint::new(50.0, 0.0));
        assert_eq!(s, TerrainSample::fallback());
        assert_eq!(quality.snapshot().missing_terrain, 1);
    }

    #[test]
    fn test_profile_sampling() {
        let t = FlatTerrain::new(100.0, Morphology::Suburban);
        let quality = DataQuality::new();
        let query = TerrainQuery::new(&t, &quality);
        let a = GeoPoint::new(40.0, -105.0);
        let b = a.offset(1000.0, 90.0);
        let p = query.profile(&a, &b, 150.0);
        assert_eq!(p.distances_m.len(), 8);
        assert_relative_eq!(p.total_distance_m(), 1000.0, epsilon = 1e-3);
        assert!(p.terrain_m.iter().all(|h| *h == 100.0));
        assert!(!p.has_full_surface_coverage());
        assert_eq!(p.interdecile_range_m(), 0.0);
    }

    #[test]
    fn test_less_favorable_climate() {
        assert_eq!(
            RadioClimate::Desert.less_favorable(RadioClimate::ContinentalTemperate),
            RadioClimate::Desert
        );
    }
}
