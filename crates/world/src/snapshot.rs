//! The persisted world state.
//!
//! Intentionally omits the height field and the destruction ledger: terrain
//! is regenerated from the seed on load and tornado damage does not survive a
//! reload. The tree list is optional so saves written before tree persistence
//! existed still load (the grid regenerates trees instead).

use crate::buildings::BuildingRecord;
use crate::tile::TileKind;
use crate::trees::TreeRecord;
use serde::{Deserialize, Serialize};

/// Serializable world state: dimensions, seed, tile kinds, registries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Tile grid width.
    pub width: usize,
    /// Tile grid depth.
    pub depth: usize,
    /// World seed the terrain regenerates from.
    pub seed: i64,
    /// Row-major flat array of tile kinds, length `width * depth`.
    pub tiles: Vec<TileKind>,
    /// Tree records; `None` in legacy saves, triggering regeneration.
    #[serde(default)]
    pub trees: Option<Vec<TreeRecord>>,
    /// Building records.
    pub buildings: Vec<BuildingRecord>,
}

impl WorldSnapshot {
    /// Count tiles of a given kind.
    pub fn count_kind(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|&&k| k == kind).count()
    }
}
