//! Building records and the dense arena that owns them.
//!
//! A building owns every tile in its footprint rectangle; destruction is
//! atomic at the grid level (clear occupancy, then remove the record here).
//! Visual attributes are chosen once from an id-scoped RNG and stored in the
//! record so they survive snapshot round-trips.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use stormvale_core::{BuildingId, SeededRng};

/// Roof silhouette variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofStyle {
    /// Two sloped faces meeting at a ridge.
    Gabled,
    /// Four sloped faces.
    Hip,
}

/// Wall color choices (linear RGB).
const WALL_PALETTE: [[f32; 3]; 6] = [
    [0.89, 0.84, 0.74],
    [0.82, 0.71, 0.55],
    [0.76, 0.80, 0.78],
    [0.70, 0.60, 0.52],
    [0.85, 0.77, 0.81],
    [0.64, 0.69, 0.58],
];

/// Roof color choices (linear RGB).
const ROOF_PALETTE: [[f32; 3]; 4] = [
    [0.48, 0.26, 0.21],
    [0.35, 0.35, 0.40],
    [0.55, 0.42, 0.30],
    [0.30, 0.38, 0.33],
];

/// One placed building.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    /// Stable id, derived from the placement seed.
    pub id: BuildingId,
    /// Footprint origin tile x.
    pub x: i32,
    /// Footprint origin tile z.
    pub z: i32,
    /// Footprint width in tiles.
    pub width: i32,
    /// Footprint depth in tiles.
    pub depth: i32,
    /// Wall height from foundation to eaves.
    pub base_height: f32,
    /// Roof height above the eaves.
    pub roof_height: f32,
    /// Roof silhouette.
    pub roof_style: RoofStyle,
    /// Wall color (linear RGB).
    pub wall_color: [f32; 3],
    /// Roof color (linear RGB).
    pub roof_color: [f32; 3],
    /// Whether the roof carries a chimney.
    pub chimney: bool,
}

impl BuildingRecord {
    /// Roll the procedural attributes for a building from its id and the
    /// world seed. Same id + seed always yields the same house.
    pub fn generate(id: BuildingId, world_seed: i64, x: i32, z: i32, width: i32, depth: i32) -> Self {
        let mut rng = SeededRng::from_parts(&[world_seed, id.0 as i64]);
        Self {
            id,
            x,
            z,
            width,
            depth,
            base_height: rng.range(0.5, 0.9) as f32,
            roof_height: rng.range(0.25, 0.45) as f32,
            roof_style: if rng.chance(0.5) {
                RoofStyle::Gabled
            } else {
                RoofStyle::Hip
            },
            wall_color: WALL_PALETTE[rng.int(0, WALL_PALETTE.len() as i32 - 1) as usize],
            roof_color: ROOF_PALETTE[rng.int(0, ROOF_PALETTE.len() as i32 - 1) as usize],
            chimney: rng.chance(0.45),
        }
    }

    /// Footprint center in tile-space coordinates.
    pub fn footprint_center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 * 0.5,
            self.z as f32 + self.depth as f32 * 0.5,
        )
    }

    /// Iterate every tile coordinate in the footprint rectangle.
    pub fn footprint_tiles(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let (x0, z0, w, d) = (self.x, self.z, self.width, self.depth);
        (z0..z0 + d).flat_map(move |tz| (x0..x0 + w).map(move |tx| (tx, tz)))
    }
}

/// Dense building storage with an id reverse map.
#[derive(Debug, Clone, Default)]
pub struct BuildingArena {
    records: Vec<BuildingRecord>,
    by_id: HashMap<BuildingId, usize>,
}

impl BuildingArena {
    /// Empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. Replaces any record with the same id.
    pub fn insert(&mut self, record: BuildingRecord) {
        if let Some(&slot) = self.by_id.get(&record.id) {
            self.records[slot] = record;
            return;
        }
        self.by_id.insert(record.id, self.records.len());
        self.records.push(record);
    }

    /// Remove and return a record by id.
    pub fn remove(&mut self, id: BuildingId) -> Option<BuildingRecord> {
        let slot = self.by_id.remove(&id)?;
        let record = self.records.swap_remove(slot);
        if slot < self.records.len() {
            let moved_id = self.records[slot].id;
            self.by_id.insert(moved_id, slot);
        }
        Some(record)
    }

    /// Record by id, if present.
    pub fn get(&self, id: BuildingId) -> Option<&BuildingRecord> {
        self.by_id.get(&id).map(|&slot| &self.records[slot])
    }

    /// Iterate all records.
    pub fn iter(&self) -> impl Iterator<Item = &BuildingRecord> {
        self.records.iter()
    }

    /// Number of buildings.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.by_id.clear();
    }
}
