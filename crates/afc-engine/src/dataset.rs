//! JSON dataset loading
//!
//! A dataset bundles everything a [`DataSnapshot`] holds:
//!
//! ```json
//! {
//!   "terrain": { "type": "flat", "height_m": 1600.0, "morphology": "suburban" },
//!   "links": [ ... ],
//!   "exclusion_zones": [ ... ],
//!   "antenna_patterns": [ { "model": "UHX10-59", "pattern": [[0, 0], [10, -35]] } ]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use afc_core::antenna::{AntennaLibrary, PatternTable};
use afc_core::terrain::{FlatTerrain, Morphology, RasterTerrain, TerrainSource};

use crate::error::{DataError, DataResult};
use crate::incumbent::{ExclusionZone, FsLink, IncumbentIndex};
use crate::snapshot::DataSnapshot;

/// Terrain source description
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerrainSpec {
    Flat {
        height_m: f64,
        #[serde(default)]
        morphology: Morphology,
        #[serde(default)]
        building_m: Option<f64>,
        #[serde(default)]
        resolution_arcsec: Option<f64>,
    },
    Raster(RasterTerrain),
}

impl Default for TerrainSpec {
    fn default() -> Self {
        TerrainSpec::Flat {
            height_m: 0.0,
            morphology: Morphology::Rural,
            building_m: None,
            resolution_arcsec: None,
        }
    }
}

impl TerrainSpec {
    pub fn build(self) -> DataResult<Arc<dyn TerrainSource>> {
        match self {
            TerrainSpec::Flat {
                height_m,
                morphology,
                building_m,
                resolution_arcsec,
            } => {
                let mut flat = FlatTerrain::new(height_m, morphology);
                flat.building_m = building_m;
                if let Some(arcsec) = resolution_arcsec {
                    if !(arcsec > 0.0) {
                        return Err(DataError::InvalidTerrain(format!("resolution {} arcsec", arcsec)));
                    }
                    flat.resolution_arcsec = arcsec;
                }
                Ok(Arc::new(flat))
            }
            TerrainSpec::Raster(raster) => {
                let cells = raster.rows * raster.cols;
                if cells == 0 || raster.heights_m.len() != cells {
                    return Err(DataError::InvalidTerrain(format!(
                        "{}x{} grid with {} heights",
                        raster.rows,
                        raster.cols,
                        raster.heights_m.len()
                    )));
                }
                if !(raster.cell_deg.0 > 0.0 && raster.cell_deg.1 > 0.0) {
                    return Err(DataError::InvalidTerrain("non-positive cell size".into()));
                }
                Ok(Arc::new(raster))
            }
        }
    }
}

/// Measured pattern for one antenna model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternEntry {
    pub model: String,
    pub pattern: PatternTable,
}

/// On-disk dataset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub terrain: TerrainSpec,
    pub links: Vec<FsLink>,
    pub exclusion_zones: Vec<ExclusionZone>,
    pub antenna_patterns: Vec<PatternEntry>,
}

impl Dataset {
    pub fn from_json(json: &str) -> DataResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> DataResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Validate, index and freeze
    pub fn into_snapshot(self) -> DataResult<DataSnapshot> {
        let terrain = self.terrain.build()?;
        let mut antennas = AntennaLibrary::new();
        for entry in self.antenna_patterns {
            antennas.insert(&entry.model, entry.pattern);
        }
        let index = IncumbentIndex::new(self.links, self.exclusion_zones)?;
        tracing::debug!(
            terrain = terrain.name(),
            links = index.len(),
            patterns = antennas.len(),
            "dataset loaded"
        );
        Ok(DataSnapshot::new(terrain, index, antennas))
    }
}
