//! Tile data model: the atomic unit of terrain classification and occupancy.

use serde::{Deserialize, Serialize};
use stormvale_core::{BuildingId, TreeId};

/// Terrain classification of a tile. Mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Open ground; the only kind that can carry a tree.
    #[default]
    Grass,
    /// Player-placed road surface.
    Road,
    /// Part of a building footprint.
    Foundation,
    /// Stream water.
    Water,
}

/// One grid cell.
///
/// Invariants (maintained by `WorldGrid`'s mutation paths, never by direct
/// field writes from outside the crate):
/// - `occupant.is_some()` implies `kind == Foundation`
/// - `tree.is_some()` implies `kind == Grass` and `occupant.is_none()`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Terrain classification.
    pub kind: TileKind,
    /// Terrain elevation sampled at the cell center (mean of corner vertices).
    pub height: f32,
    /// Building owning this tile, if any.
    pub occupant: Option<BuildingId>,
    /// Tree standing on this tile, if any.
    pub tree: Option<TreeId>,
}

impl Tile {
    /// A fresh tile of the given kind and height with no occupants.
    pub fn new(kind: TileKind, height: f32) -> Self {
        Self {
            kind,
            height,
            occupant: None,
            tree: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_kind_is_grass() {
        assert_eq!(TileKind::default(), TileKind::Grass);
    }

    #[test]
    fn new_tile_is_unoccupied() {
        let tile = Tile::new(TileKind::Water, -0.3);
        assert_eq!(tile.kind, TileKind::Water);
        assert!(tile.occupant.is_none());
        assert!(tile.tree.is_none());
    }

    #[test]
    fn tile_kind_serializes_snake_case() {
        let json = serde_json::to_string(&TileKind::Foundation).unwrap();
        assert_eq!(json, "\"foundation\"");
    }
}
