//! Tree records and the dense arena that owns them.
//!
//! The arena keeps a reverse index from tile index to record slot so radius
//! queries and removals stay O(1) per tile. All mutation goes through the
//! arena; tiles never point at a tree the arena does not know about.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use stormvale_core::TreeId;

/// One procedurally placed tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeRecord {
    /// Stable id, unique within one world.
    pub id: TreeId,
    /// Tile x coordinate.
    pub x: i32,
    /// Tile z coordinate.
    pub z: i32,
    /// Trunk height in world units.
    pub trunk_height: f32,
    /// Trunk radius in world units.
    pub trunk_radius: f32,
    /// Crown (canopy) height.
    pub crown_height: f32,
    /// Crown radius.
    pub crown_radius: f32,
    /// Foliage hue offset in `[-0.09, 0.09]`.
    pub hue_shift: f32,
}

/// Dense tree storage with a tile-index reverse map.
#[derive(Debug, Clone, Default)]
pub struct TreeArena {
    records: Vec<TreeRecord>,
    /// Tile key per record slot, aligned with `records`.
    tiles: Vec<usize>,
    by_tile: HashMap<usize, usize>,
    next_id: u32,
}

impl TreeArena {
    /// Empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next tree id.
    pub fn allocate_id(&mut self) -> TreeId {
        let id = TreeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert a record keyed by its tile index. Replaces any existing tree on
    /// the same tile (one tree per tile).
    pub fn insert(&mut self, tile_index: usize, record: TreeRecord) {
        if let Some(&slot) = self.by_tile.get(&tile_index) {
            self.records[slot] = record;
            return;
        }
        self.by_tile.insert(tile_index, self.records.len());
        self.records.push(record);
        self.tiles.push(tile_index);
        self.next_id = self.next_id.max(record.id.0 + 1);
    }

    /// Remove and return the tree on a tile, if present.
    pub fn remove_at(&mut self, tile_index: usize) -> Option<TreeRecord> {
        let slot = self.by_tile.remove(&tile_index)?;
        let record = self.records.swap_remove(slot);
        self.tiles.swap_remove(slot);
        // The swapped-in record (if any) changed slots; its tile key sits in
        // the same slot of the parallel vector.
        if slot < self.records.len() {
            self.by_tile.insert(self.tiles[slot], slot);
        }
        Some(record)
    }

    /// Record on a tile, if any.
    pub fn get_at(&self, tile_index: usize) -> Option<&TreeRecord> {
        self.by_tile.get(&tile_index).map(|&slot| &self.records[slot])
    }

    /// Iterate all records.
    pub fn iter(&self) -> impl Iterator<Item = &TreeRecord> {
        self.records.iter()
    }

    /// Number of trees.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop all trees, keeping the id counter monotonic.
    pub fn clear(&mut self) {
        self.records.clear();
        self.tiles.clear();
        self.by_tile.clear();
    }
}
