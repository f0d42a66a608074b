//! Tornado entity lifecycle and destruction footprints.
//!
//! Entities live exclusively in the simulator's active list; consumers only
//! ever see per-frame copies of position and radius. Motion is a bounded
//! random walk in heading with edge reflection, not a physical vortex model.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use stormvale_core::{BuildingId, SeededRng, TornadoId};
use stormvale_world::{WorldGrid, TILE_SIZE};
use tracing::debug;

/// Salt for the tornado parameter stream.
const TORNADO_SALT: i64 = 0x544F_524E; // "TORN"

/// Per-second auto-spawn probability at intensity 1.0.
const AUTO_SPAWN_RATE: f64 = 0.006;
/// Destruction scan half-size factor (tiles per unit radius).
const SCAN_FACTOR: f32 = 0.72;
/// Destruction reach factor applied to the tornado radius.
const REACH_FACTOR: f32 = 0.78;
/// Maximum steering deflection in radians per unit of `dt * 0.2`.
const STEER_LIMIT: f64 = 0.6;

/// One active tornado.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TornadoEntity {
    /// Stable id for the entity's lifetime.
    pub id: TornadoId,
    /// World-space position.
    pub position: Vec2,
    /// World-space velocity in units per second.
    pub velocity: Vec2,
    /// Destruction radius in world units.
    pub radius: f32,
    /// Remaining lifetime in seconds.
    pub lifetime: f32,
}

/// Read-only per-frame view of a tornado, for rendering/audio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TornadoView {
    /// World x.
    pub x: f32,
    /// Ground height under the funnel.
    pub y: f32,
    /// World z.
    pub z: f32,
    /// Funnel radius.
    pub radius: f32,
}

/// Monotonic record of tiles ever destroyed by a tornado.
///
/// Tiles are never un-destroyed except by a full world reset. The ordered
/// coordinate list preserves destruction order for consumers that animate
/// damage incrementally.
#[derive(Debug, Clone, Default)]
pub struct DestructionLedger {
    seen: HashSet<usize>,
    order: Vec<(i32, i32)>,
}

impl DestructionLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a destroyed tile. Returns `true` when the tile is new.
    pub fn insert(&mut self, tile_index: usize, x: i32, z: i32) -> bool {
        if self.seen.insert(tile_index) {
            self.order.push((x, z));
            true
        } else {
            false
        }
    }

    /// Whether a tile has been destroyed.
    pub fn contains(&self, tile_index: usize) -> bool {
        self.seen.contains(&tile_index)
    }

    /// Destroyed tile coordinates in destruction order.
    pub fn tiles(&self) -> &[(i32, i32)] {
        &self.order
    }

    /// Number of destroyed tiles.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing has been destroyed yet.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Forget everything (full world reset only).
    pub fn clear(&mut self) {
        self.seen.clear();
        self.order.clear();
    }
}

/// What a simulation step changed, for render-invalidation flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TornadoStepReport {
    /// A new tile entered the destruction ledger.
    pub destruction_changed: bool,
    /// At least one tree was removed.
    pub trees_changed: bool,
    /// At least one building was destroyed.
    pub buildings_changed: bool,
    /// Tornadoes spawned this tick.
    pub spawned: usize,
    /// Tornadoes expired this tick.
    pub expired: usize,
}

/// Spawns, steers and retires tornado entities; computes destruction
/// footprints against the world grid.
#[derive(Debug, Clone)]
pub struct TornadoSimulator {
    entities: Vec<TornadoEntity>,
    rng: SeededRng,
    next_id: u32,
    auto_spawn: bool,
}

impl TornadoSimulator {
    /// New simulator with its parameter stream derived from the world seed.
    pub fn new(seed: i64) -> Self {
        Self {
            entities: Vec::new(),
            rng: SeededRng::from_parts(&[seed, TORNADO_SALT]),
            next_id: 0,
            auto_spawn: false,
        }
    }

    /// Enable or disable probabilistic auto-spawn.
    pub fn set_auto_spawn(&mut self, enabled: bool) {
        self.auto_spawn = enabled;
    }

    /// Whether auto-spawn is enabled.
    pub fn auto_spawn(&self) -> bool {
        self.auto_spawn
    }

    /// Active entities (read-only).
    pub fn entities(&self) -> &[TornadoEntity] {
        &self.entities
    }

    /// Spawn a tornado at a caller-specified or random in-bounds position.
    pub fn spawn(&mut self, grid: &WorldGrid, position: Option<Vec2>) -> TornadoId {
        let position = position.unwrap_or_else(|| {
            Vec2::new(
                self.rng
                    .range(-grid.half_extent_x() as f64, grid.half_extent_x() as f64)
                    as f32,
                self.rng
                    .range(-grid.half_extent_z() as f64, grid.half_extent_z() as f64)
                    as f32,
            )
        });
        let radius = self.rng.range(3.0, 4.8) as f32;
        let lifetime = self.rng.range(20.0, 90.0) as f32;
        self.spawn_with(position, radius, lifetime)
    }

    /// Spawn with explicit parameters (scripted scenarios, tests).
    pub fn spawn_with(&mut self, position: Vec2, radius: f32, lifetime: f32) -> TornadoId {
        let id = TornadoId(self.next_id);
        self.next_id += 1;
        let heading = self.rng.range(0.0, std::f64::consts::TAU);
        let speed = self.rng.range(0.4, 1.1);
        let velocity = Vec2::new(
            (heading.cos() * speed) as f32,
            (heading.sin() * speed) as f32,
        );
        debug!(id = id.0, ?position, radius, lifetime, "tornado spawned");
        self.entities.push(TornadoEntity {
            id,
            position,
            velocity,
            radius,
            lifetime,
        });
        id
    }

    /// Advance every tornado one tick and apply destruction to the grid.
    pub fn step(
        &mut self,
        dt: f32,
        grid: &mut WorldGrid,
        intensity: f32,
        ledger: &mut DestructionLedger,
    ) -> TornadoStepReport {
        let mut report = TornadoStepReport::default();

        if self.auto_spawn {
            let p = intensity as f64 * dt as f64 * AUTO_SPAWN_RATE;
            if self.rng.chance(p) {
                self.spawn(grid, None);
                report.spawned += 1;
            }
        }

        // Lifetime and motion. Expiry happens in the tick the lifetime first
        // reaches zero, before the entity moves again.
        let half_x = grid.half_extent_x();
        let half_z = grid.half_extent_z();
        let mut expired = 0;
        let rng = &mut self.rng;
        self.entities.retain_mut(|tornado| {
            tornado.lifetime -= dt;
            if tornado.lifetime <= 0.0 {
                debug!(id = tornado.id.0, "tornado expired");
                expired += 1;
                return false;
            }

            let turn = rng.range(-STEER_LIMIT, STEER_LIMIT) * dt as f64 * 0.2;
            tornado.velocity = rotate(tornado.velocity, turn as f32);
            tornado.position += tornado.velocity * dt;

            // Reflect off the world edges instead of tunneling out.
            if tornado.position.x.abs() > half_x {
                tornado.position.x = tornado.position.x.clamp(-half_x, half_x);
                tornado.velocity.x = -tornado.velocity.x;
            }
            if tornado.position.y.abs() > half_z {
                tornado.position.y = tornado.position.y.clamp(-half_z, half_z);
                tornado.velocity.y = -tornado.velocity.y;
            }
            true
        });
        report.expired = expired;

        // Destruction pass: collect building ids across all tornadoes, then
        // destroy each exactly once.
        let mut doomed: HashSet<BuildingId> = HashSet::new();
        for tornado in &self.entities {
            let (tx, tz) = grid.world_to_tile(tornado.position.x, tornado.position.y);
            let span = (tornado.radius * SCAN_FACTOR / TILE_SIZE).ceil() as i32;
            let reach = tornado.radius * REACH_FACTOR;
            for dz in -span..=span {
                for dx in -span..=span {
                    let (x, z) = (tx + dx, tz + dz);
                    let Some(tile) = grid.tile(x, z) else {
                        continue;
                    };
                    let (cx, cz) = grid.tile_center_world(x, z);
                    let dist = (Vec2::new(cx, cz) - tornado.position).length();
                    if dist > reach {
                        continue;
                    }
                    let occupant = tile.occupant;
                    let index = z as usize * grid.width() + x as usize;
                    if ledger.insert(index, x, z) {
                        report.destruction_changed = true;
                    }
                    if grid.remove_tree_at(x, z) {
                        report.trees_changed = true;
                    }
                    if let Some(id) = occupant {
                        doomed.insert(id);
                    }
                }
            }
        }
        for id in doomed {
            if grid.destroy_building(id) {
                report.buildings_changed = true;
            }
        }

        report
    }

    /// Whether any tornado is near the town: within `siren_radius_tiles`
    /// (plus its own radius) of any building's footprint center.
    pub fn any_near_town(&self, grid: &WorldGrid, siren_radius_tiles: f32) -> bool {
        let reach_base = siren_radius_tiles * TILE_SIZE;
        self.entities.iter().any(|tornado| {
            grid.buildings().iter().any(|building| {
                let (cx, cz) = building.footprint_center();
                let center = Vec2::new(
                    cx * TILE_SIZE - grid.half_extent_x(),
                    cz * TILE_SIZE - grid.half_extent_z(),
                );
                (center - tornado.position).length() <= reach_base + tornado.radius
            })
        })
    }

    /// Per-frame read-only views with ground height resolved from the grid.
    pub fn views(&self, grid: &WorldGrid) -> Vec<TornadoView> {
        self.entities
            .iter()
            .map(|tornado| TornadoView {
                x: tornado.position.x,
                y: grid.sample_height_at_world(tornado.position.x, tornado.position.y),
                z: tornado.position.y,
                radius: tornado.radius,
            })
            .collect()
    }

    /// Remove every active tornado (full world reset).
    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

/// Rotate a vector by an angle in radians.
fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}
