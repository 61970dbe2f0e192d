//! Read-only data shared by concurrent evaluations

use std::sync::Arc;

use afc_core::antenna::AntennaLibrary;
use afc_core::terrain::TerrainSource;

use crate::incumbent::IncumbentIndex;

/// Terrain, incumbents and antenna patterns frozen for the lifetime of a
/// request. Cloning is cheap; refreshed data is installed by building a new
/// snapshot between requests.
#[derive(Clone)]
pub struct DataSnapshot {
    pub terrain: Arc<dyn TerrainSource>,
    pub incumbents: Arc<IncumbentIndex>,
    pub antennas: Arc<AntennaLibrary>,
}

impl DataSnapshot {
    pub fn new(terrain: Arc<dyn TerrainSource>, incumbents: IncumbentIndex, antennas: AntennaLibrary) -> Self {
        Self {
            terrain,
            incumbents: Arc::new(incumbents),
            antennas: Arc::new(antennas),
        }
    }
}

impl std::fmt::Debug for DataSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSnapshot")
            .field("terrain", &self.terrain.name())
            .field("links", &self.incumbents.len())
            .field("zones", &self.incumbents.zones().len())
            .field("antenna_patterns", &self.antennas.len())
            .finish()
    }
}
