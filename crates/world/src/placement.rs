//! Build-mode mutations: house, road, erase.
//!
//! All validation happens inside [`PlacementController::apply`]; callers pass
//! raw click coordinates and get back a `changed` flag plus an optional
//! user-facing message. Invalid input never panics or throws.

use crate::buildings::BuildingRecord;
use crate::grid::WorldGrid;
use crate::tile::TileKind;
use serde::{Deserialize, Serialize};
use stormvale_core::{BuildingId, SeededRng};
use tracing::debug;

/// Build tools exposed to the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Place a house with a procedurally sized footprint.
    House,
    /// Lay a road tile.
    Road,
    /// Remove a building or road.
    Erase,
}

/// Result of a placement attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementOutcome {
    /// Whether the world changed.
    pub changed: bool,
    /// Short user-facing explanation when a placement is rejected.
    pub message: Option<String>,
}

impl PlacementOutcome {
    fn changed() -> Self {
        Self {
            changed: true,
            message: None,
        }
    }

    fn unchanged() -> Self {
        Self {
            changed: false,
            message: None,
        }
    }

    fn rejected(message: &str) -> Self {
        Self {
            changed: false,
            message: Some(message.to_string()),
        }
    }
}

/// Validates and applies build-mode mutations against the grid invariants.
#[derive(Debug, Clone, Default)]
pub struct PlacementController {
    /// Monotonically increasing counter folded into each placement seed so
    /// repeated clicks on the same tile roll different footprints.
    counter: i64,
}

impl PlacementController {
    /// New controller with a zeroed placement counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Single entry point for the input collaborator.
    pub fn apply(&mut self, grid: &mut WorldGrid, tool: Tool, x: i32, z: i32) -> PlacementOutcome {
        if !grid.in_bounds(x, z) {
            return PlacementOutcome::unchanged();
        }
        match tool {
            Tool::House => self.place_house(grid, x, z),
            Tool::Road => self.place_road(grid, x, z),
            Tool::Erase => self.erase(grid, x, z),
        }
    }

    fn place_house(&mut self, grid: &mut WorldGrid, x: i32, z: i32) -> PlacementOutcome {
        let counter = self.counter;
        self.counter += 1;

        let mut rng =
            SeededRng::from_parts(&[grid.seed(), x as i64, z as i64, counter]);
        let width = rng.int(1, 3);
        let depth = rng.int(1, 3);

        // Try origins that keep the clicked tile inside the footprint.
        for _ in 0..8 {
            let ox = x - rng.int(0, width - 1);
            let oz = z - rng.int(0, depth - 1);
            if grid.footprint_clear(ox, oz, width, depth) {
                self.commit_house(grid, ox, oz, width, depth, counter);
                return PlacementOutcome::changed();
            }
        }

        // Fall back to the smallest footprint on the clicked tile.
        if grid.footprint_clear(x, z, 1, 1) {
            self.commit_house(grid, x, z, 1, 1, counter);
            return PlacementOutcome::changed();
        }

        PlacementOutcome::rejected("No room for a house here")
    }

    fn commit_house(
        &self,
        grid: &mut WorldGrid,
        x: i32,
        z: i32,
        width: i32,
        depth: i32,
        counter: i64,
    ) {
        let id = BuildingId::derive(&[grid.seed(), x as i64, z as i64, counter]);
        let record = BuildingRecord::generate(id, grid.seed(), x, z, width, depth);
        debug!(id = id.0, x, z, width, depth, "house placed");
        grid.place_building(record);
    }

    fn place_road(&mut self, grid: &mut WorldGrid, x: i32, z: i32) -> PlacementOutcome {
        let Some(tile) = grid.tile(x, z).copied() else {
            return PlacementOutcome::unchanged();
        };
        if tile.kind == TileKind::Road {
            return PlacementOutcome::unchanged();
        }
        if tile.kind != TileKind::Grass || tile.occupant.is_some() {
            return PlacementOutcome::rejected("Road requires an empty grass tile");
        }
        grid.set_tile_kind(x, z, TileKind::Road);
        PlacementOutcome::changed()
    }

    fn erase(&mut self, grid: &mut WorldGrid, x: i32, z: i32) -> PlacementOutcome {
        let Some(tile) = grid.tile(x, z).copied() else {
            return PlacementOutcome::unchanged();
        };
        if let Some(id) = tile.occupant {
            grid.destroy_building(id);
            return PlacementOutcome::changed();
        }
        if tile.kind == TileKind::Road {
            grid.set_tile_kind(x, z, TileKind::Grass);
            return PlacementOutcome::changed();
        }
        PlacementOutcome::unchanged()
    }
}
