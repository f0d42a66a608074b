//! The tile-based world: terrain-derived tiles, tree and building registries,
//! spatial queries, and snapshot/restore.
//!
//! All registry mutation flows through `WorldGrid` methods so the tile fields
//! and the arena reverse indices can never desynchronize. Out-of-bounds
//! queries return `None`/`false`; nothing in here panics on bad coordinates.

use crate::buildings::{BuildingArena, BuildingRecord};
use crate::snapshot::WorldSnapshot;
use crate::terrain::{TerrainField, TILE_SIZE, WATER_LEVEL};
use crate::tile::{Tile, TileKind};
use crate::trees::{TreeArena, TreeRecord};
use stormvale_core::{BuildingId, SeededRng};
use tracing::{debug, instrument};

/// Salt for per-tile water jitter streams.
const WATER_SALT: i64 = 0x5741_5452; // "WATR"
/// Salt for per-tile tree placement streams.
const TREE_SALT: i64 = 0x5452_4545; // "TREE"

/// Water jitter bound added to the stream half-width, in tiles.
const WATER_JITTER: f64 = 0.34;
/// Water only forms below `WATER_LEVEL + WATER_MARGIN`.
const WATER_MARGIN: f32 = 0.22;

/// Trees keep this margin beyond the stream half-width.
const TREE_STREAM_MARGIN: f64 = 1.4;
/// Maximum tile slope that still accepts a tree.
const TREE_MAX_SLOPE: f32 = 0.34;

/// The simulated town world.
#[derive(Debug, Clone)]
pub struct WorldGrid {
    width: usize,
    depth: usize,
    seed: i64,
    terrain: TerrainField,
    tiles: Vec<Tile>,
    /// Tile kinds as freshly generated, before any mutation. Used by
    /// `reset_tiles` and the legacy water-repair rule on restore.
    base_kinds: Vec<TileKind>,
    trees: TreeArena,
    buildings: BuildingArena,
}

impl WorldGrid {
    /// Generate a fresh world from a seed.
    #[instrument(skip_all, fields(seed, width, depth))]
    pub fn new(width: usize, depth: usize, seed: i64) -> Self {
        let terrain = TerrainField::generate(seed, width, depth);

        let mut tiles = Vec::with_capacity(width * depth);
        for z in 0..depth {
            for x in 0..width {
                tiles.push(Tile::new(
                    TileKind::Grass,
                    terrain.tile_height(x as i32, z as i32),
                ));
            }
        }

        let mut grid = Self {
            width,
            depth,
            seed,
            terrain,
            tiles,
            base_kinds: Vec::new(),
            trees: TreeArena::new(),
            buildings: BuildingArena::new(),
        };
        grid.generate_water();
        grid.base_kinds = grid.tiles.iter().map(|t| t.kind).collect();
        grid.generate_trees();
        debug!(
            water = grid.tiles.iter().filter(|t| t.kind == TileKind::Water).count(),
            trees = grid.trees.len(),
            "world generated"
        );
        grid
    }

    /// Rebuild a world from a snapshot: terrain and base state regenerate
    /// from the snapshot's own seed and dimensions, then the saved mutable
    /// state is applied on top. Heights are not persisted, so a loaded save
    /// must use the seed it was written with.
    pub fn from_snapshot(snapshot: &WorldSnapshot) -> Self {
        let mut grid = Self::new(snapshot.width, snapshot.depth, snapshot.seed);
        // Dimensions match by construction, so this cannot be rejected.
        grid.apply_snapshot(snapshot);
        grid
    }

    /// Tile grid width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Tile grid depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// World seed.
    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// The immutable terrain field.
    pub fn terrain(&self) -> &TerrainField {
        &self.terrain
    }

    /// Tree registry (read-only; mutate through grid methods).
    pub fn trees(&self) -> &TreeArena {
        &self.trees
    }

    /// Building registry (read-only; mutate through grid methods).
    pub fn buildings(&self) -> &BuildingArena {
        &self.buildings
    }

    /// Whether tile coordinates are inside the grid.
    pub fn in_bounds(&self, x: i32, z: i32) -> bool {
        x >= 0 && z >= 0 && (x as usize) < self.width && (z as usize) < self.depth
    }

    /// Flat index for in-bounds tile coordinates.
    fn tile_index(&self, x: i32, z: i32) -> usize {
        z as usize * self.width + x as usize
    }

    /// Tile at coordinates, or `None` when out of bounds.
    pub fn tile(&self, x: i32, z: i32) -> Option<&Tile> {
        self.in_bounds(x, z)
            .then(|| &self.tiles[self.tile_index(x, z)])
    }

    /// Vertex height at lattice coordinates (clamped to the lattice).
    pub fn vertex_height(&self, vx: i32, vz: i32) -> f32 {
        self.terrain.vertex(vx, vz)
    }

    /// Half of the world extent along x, in world units.
    pub fn half_extent_x(&self) -> f32 {
        self.width as f32 * TILE_SIZE * 0.5
    }

    /// Half of the world extent along z, in world units.
    pub fn half_extent_z(&self) -> f32 {
        self.depth as f32 * TILE_SIZE * 0.5
    }

    /// World-space center of a tile.
    pub fn tile_center_world(&self, x: i32, z: i32) -> (f32, f32) {
        (
            (x as f32 + 0.5) * TILE_SIZE - self.half_extent_x(),
            (z as f32 + 0.5) * TILE_SIZE - self.half_extent_z(),
        )
    }

    /// Tile coordinates containing a world-space position.
    pub fn world_to_tile(&self, wx: f32, wz: f32) -> (i32, i32) {
        (
            ((wx + self.half_extent_x()) / TILE_SIZE).floor() as i32,
            ((wz + self.half_extent_z()) / TILE_SIZE).floor() as i32,
        )
    }

    /// Bilinear terrain height at an arbitrary world position, clamped to the
    /// grid extent. Used for ground-following behavior (rain splash
    /// placement, tornado ground contact).
    pub fn sample_height_at_world(&self, wx: f32, wz: f32) -> f32 {
        let gx = ((wx + self.half_extent_x()) / TILE_SIZE).clamp(0.0, self.width as f32);
        let gz = ((wz + self.half_extent_z()) / TILE_SIZE).clamp(0.0, self.depth as f32);
        let x0 = (gx.floor() as i32).min(self.width as i32 - 1).max(0);
        let z0 = (gz.floor() as i32).min(self.depth as i32 - 1).max(0);
        let fx = gx - x0 as f32;
        let fz = gz - z0 as f32;

        let h00 = self.vertex_height(x0, z0);
        let h10 = self.vertex_height(x0 + 1, z0);
        let h01 = self.vertex_height(x0, z0 + 1);
        let h11 = self.vertex_height(x0 + 1, z0 + 1);
        let top = h00 + (h10 - h00) * fx;
        let bottom = h01 + (h11 - h01) * fx;
        top + (bottom - top) * fz
    }

    /// Remove the tree on a tile. Returns whether a removal occurred.
    pub fn remove_tree_at(&mut self, x: i32, z: i32) -> bool {
        if !self.in_bounds(x, z) {
            return false;
        }
        let index = self.tile_index(x, z);
        if self.trees.remove_at(index).is_some() {
            self.tiles[index].tree = None;
            true
        } else {
            false
        }
    }

    /// Clear every tile owned by a building and revert foundations to grass.
    ///
    /// Leaves the building record in place so callers can compose atomic
    /// destroy semantics (`clear_occupant` + registry removal).
    pub fn clear_occupant(&mut self, id: BuildingId) {
        for tile in &mut self.tiles {
            if tile.occupant == Some(id) {
                tile.occupant = None;
                if tile.kind == TileKind::Foundation {
                    tile.kind = TileKind::Grass;
                }
            }
        }
    }

    /// Atomically destroy a building: clear its tiles and drop the record.
    pub fn destroy_building(&mut self, id: BuildingId) -> bool {
        if self.buildings.get(id).is_none() {
            return false;
        }
        self.clear_occupant(id);
        self.buildings.remove(id);
        debug!(id = id.0, "building destroyed");
        true
    }

    /// Whether a footprint rectangle is entirely buildable grass.
    pub fn footprint_clear(&self, x: i32, z: i32, width: i32, depth: i32) -> bool {
        for tz in z..z + depth {
            for tx in x..x + width {
                match self.tile(tx, tz) {
                    Some(tile) if tile.kind == TileKind::Grass && tile.occupant.is_none() => {}
                    _ => return false,
                }
            }
        }
        true
    }

    /// Claim a footprint for a building: removes trees, marks every tile as
    /// foundation owned by the record, and registers it.
    ///
    /// Callers must have validated the footprint with [`footprint_clear`].
    pub fn place_building(&mut self, record: BuildingRecord) {
        let footprint: Vec<(i32, i32)> = record.footprint_tiles().collect();
        for (tx, tz) in footprint {
            self.remove_tree_at(tx, tz);
            let index = self.tile_index(tx, tz);
            self.tiles[index].kind = TileKind::Foundation;
            self.tiles[index].occupant = Some(record.id);
        }
        self.buildings.insert(record);
    }

    /// Set a tile's kind through the single mutation path. Only valid for
    /// road/grass flips; trees are removed when the tile stops being grass.
    pub(crate) fn set_tile_kind(&mut self, x: i32, z: i32, kind: TileKind) {
        if !self.in_bounds(x, z) {
            return;
        }
        if kind != TileKind::Grass {
            self.remove_tree_at(x, z);
        }
        let index = self.tile_index(x, z);
        self.tiles[index].kind = kind;
    }

    /// Serialize the mutable world state.
    pub fn to_snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            width: self.width,
            depth: self.depth,
            seed: self.seed,
            tiles: self.tiles.iter().map(|t| t.kind).collect(),
            trees: Some(self.trees.iter().copied().collect()),
            buildings: self.buildings.iter().copied().collect(),
        }
    }

    /// Restore from a snapshot. Returns `false` (and changes nothing) when
    /// the snapshot dimensions do not match this grid.
    ///
    /// A snapshot with no tree list regenerates trees procedurally. A
    /// snapshot with zero water tiles gets the stream restored on tiles that
    /// are water in the freshly generated base state and grass in the
    /// snapshot; this repairs saves written before water generation existed
    /// without discarding other edits.
    pub fn apply_snapshot(&mut self, snapshot: &WorldSnapshot) -> bool {
        if snapshot.width != self.width
            || snapshot.depth != self.depth
            || snapshot.tiles.len() != self.tiles.len()
        {
            debug!(
                snapshot_width = snapshot.width,
                snapshot_depth = snapshot.depth,
                "snapshot dimensions do not match grid; ignoring"
            );
            return false;
        }

        for (tile, &kind) in self.tiles.iter_mut().zip(snapshot.tiles.iter()) {
            tile.kind = kind;
            tile.occupant = None;
            tile.tree = None;
        }

        self.buildings.clear();
        for record in &snapshot.buildings {
            let record = *record;
            for (tx, tz) in record.footprint_tiles() {
                if !self.in_bounds(tx, tz) {
                    continue;
                }
                let index = self.tile_index(tx, tz);
                self.tiles[index].kind = TileKind::Foundation;
                self.tiles[index].occupant = Some(record.id);
            }
            self.buildings.insert(record);
        }

        if snapshot.count_kind(TileKind::Water) == 0 {
            let repaired = self.repair_missing_water();
            if repaired > 0 {
                debug!(repaired, "restored water tiles missing from legacy snapshot");
            }
        }

        match &snapshot.trees {
            Some(records) => {
                self.trees.clear();
                for record in records {
                    if !self.in_bounds(record.x, record.z) {
                        continue;
                    }
                    let index = self.tile_index(record.x, record.z);
                    let tile = self.tiles[index];
                    // Only attach trees where the invariant holds.
                    if tile.kind == TileKind::Grass && tile.occupant.is_none() {
                        self.trees.insert(index, *record);
                        self.tiles[index].tree = Some(record.id);
                    }
                }
            }
            None => {
                // Fresh arena so regenerated ids match original generation.
                self.trees = TreeArena::new();
                self.generate_trees();
            }
        }

        true
    }

    /// Restore the freshly generated state: base tile kinds, base trees,
    /// empty building set. Terrain and heights are untouched.
    pub fn reset_tiles(&mut self) {
        for (tile, &kind) in self.tiles.iter_mut().zip(self.base_kinds.iter()) {
            tile.kind = kind;
            tile.occupant = None;
            tile.tree = None;
        }
        self.buildings.clear();
        self.trees = TreeArena::new();
        self.generate_trees();
    }

    /// Mark water tiles where the jittered stream channel crosses low ground.
    fn generate_water(&mut self) {
        for z in 0..self.depth as i32 {
            for x in 0..self.width as i32 {
                let index = self.tile_index(x, z);
                let height = self.tiles[index].height;
                // Elevated terrain stays dry even when the stream geometry
                // crosses it.
                if height >= WATER_LEVEL + WATER_MARGIN {
                    continue;
                }
                let jitter = SeededRng::from_parts(&[self.seed, x as i64, z as i64, WATER_SALT])
                    .next()
                    * WATER_JITTER;
                let d = self
                    .terrain
                    .stream()
                    .distance(x as f64 + 0.5, z as f64 + 0.5);
                if d <= self.terrain.stream().half_width() + jitter {
                    self.tiles[index].kind = TileKind::Water;
                }
            }
        }
    }

    /// Populate trees on flat grass away from the stream, biased toward
    /// higher ground.
    fn generate_trees(&mut self) {
        let stream_margin = self.terrain.stream().half_width() + TREE_STREAM_MARGIN;
        for z in 0..self.depth as i32 {
            for x in 0..self.width as i32 {
                let index = self.tile_index(x, z);
                let tile = self.tiles[index];
                if tile.kind != TileKind::Grass || tile.occupant.is_some() || tile.tree.is_some() {
                    continue;
                }
                let d = self
                    .terrain
                    .stream()
                    .distance(x as f64 + 0.5, z as f64 + 0.5);
                if d < stream_margin {
                    continue;
                }
                let slope = self.tile_slope(x, z);
                if slope > TREE_MAX_SLOPE {
                    continue;
                }
                let p = 0.075 + (tile.height + 0.08).max(0.0) as f64 * 0.12
                    - slope as f64 * 0.11;
                let mut rng = SeededRng::from_parts(&[self.seed, x as i64, z as i64, TREE_SALT]);
                if !rng.chance(p) {
                    continue;
                }
                let id = self.trees.allocate_id();
                let record = TreeRecord {
                    id,
                    x,
                    z,
                    trunk_height: rng.range(0.5, 0.95) as f32,
                    trunk_radius: rng.range(0.05, 0.1) as f32,
                    crown_height: rng.range(0.45, 0.85) as f32,
                    crown_radius: rng.range(0.3, 0.55) as f32,
                    hue_shift: rng.range(-0.09, 0.09) as f32,
                };
                self.trees.insert(index, record);
                self.tiles[index].tree = Some(id);
            }
        }
    }

    /// Local slope: maximum absolute height difference to the four orthogonal
    /// neighbors.
    fn tile_slope(&self, x: i32, z: i32) -> f32 {
        let here = self.tiles[self.tile_index(x, z)].height;
        let mut slope = 0.0f32;
        for (nx, nz) in [(x - 1, z), (x + 1, z), (x, z - 1), (x, z + 1)] {
            if let Some(neighbor) = self.tile(nx, nz) {
                slope = slope.max((neighbor.height - here).abs());
            }
        }
        slope
    }

    /// Restore water on tiles that are water in the base state but grass in
    /// the current state. Returns the number of repaired tiles.
    fn repair_missing_water(&mut self) -> usize {
        let mut repaired = 0;
        for (&base, tile) in self.base_kinds.iter().zip(self.tiles.iter_mut()) {
            if base == TileKind::Water && tile.kind == TileKind::Grass {
                tile.kind = TileKind::Water;
                repaired += 1;
            }
        }
        repaired
    }
}
