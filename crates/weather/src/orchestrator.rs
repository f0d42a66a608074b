//! Per-frame weather orchestration.
//!
//! Owns the sky clock, rain and lightning processes, the tornado simulator
//! and the destruction ledger, and steps them in a fixed order each frame.
//! The caller supplies the raw frame delta; clamping and time scaling happen
//! here so every subsystem sees the same effective `dt`.

use serde::{Deserialize, Serialize};
use stormvale_core::{SeededRng, TornadoId};
use stormvale_world::WorldGrid;
use tracing::instrument;

use crate::clock::SkyClock;
use crate::lightning::{FlashEvent, LightningState};
use crate::rain::RainState;
use crate::tornado::{DestructionLedger, TornadoSimulator, TornadoView};

/// Salt for the rain/lightning parameter stream.
const WEATHER_SALT: i64 = 0x5745_4154; // "WEAT"

/// Longest frame delta the simulation will integrate, in seconds. Longer
/// frames (debugger pauses, window drags) are truncated, not caught up.
const MAX_FRAME_DT: f32 = 0.05;

/// Seconds the siren keeps sounding after the last near-town contact.
const SIREN_HOLD: f32 = 3.0;

/// Caller-controlled knobs for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimSettings {
    /// When false, weather processes freeze; only the clock advances.
    pub playing: bool,
    /// Multiplier applied to the clamped frame delta.
    pub time_scale: f32,
    /// Storm intensity in `[0, 1]`; drives rain target, lightning rate and
    /// tornado auto-spawn probability.
    pub storm_intensity: f32,
    /// Siren trigger distance from any building center, in tiles.
    pub siren_radius_tiles: f32,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            playing: true,
            time_scale: 1.0,
            storm_intensity: 0.0,
            siren_radius_tiles: 9.0,
        }
    }
}

/// Everything a frame's consumers need from the weather pass.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Active tornado positions and radii.
    pub tornadoes: Vec<TornadoView>,
    /// Whether the town siren should be sounding.
    pub siren_active: bool,
    /// Sky clock hour in `[0, 24)`.
    pub clock_hour: f32,
    /// Rain intensity in `[0, 1]`.
    pub rain_intensity: f32,
    /// Lightning flashes triggered this frame.
    pub flashes: Vec<FlashEvent>,
    /// A tile entered the destruction ledger this frame.
    pub destruction_changed: bool,
    /// Trees were removed this frame.
    pub trees_changed: bool,
    /// Buildings were destroyed this frame.
    pub buildings_changed: bool,
    /// Tornadoes spawned this frame.
    pub tornadoes_spawned: usize,
    /// Tornadoes expired this frame.
    pub tornadoes_expired: usize,
}

/// Steps all weather subsystems against the world once per frame.
#[derive(Debug, Clone)]
pub struct WeatherOrchestrator {
    clock: SkyClock,
    rain: RainState,
    lightning: LightningState,
    tornadoes: TornadoSimulator,
    ledger: DestructionLedger,
    siren_hold: f32,
    rng: SeededRng,
}

impl WeatherOrchestrator {
    /// New orchestrator with weather streams derived from the world seed.
    pub fn new(seed: i64) -> Self {
        Self {
            clock: SkyClock::default(),
            rain: RainState::new(),
            lightning: LightningState::new(),
            tornadoes: TornadoSimulator::new(seed),
            ledger: DestructionLedger::new(),
            siren_hold: 0.0,
            rng: SeededRng::from_parts(&[seed, WEATHER_SALT]),
        }
    }

    /// Advance one frame and apply tornado destruction to the grid.
    #[instrument(level = "trace", skip(self, grid))]
    pub fn update(&mut self, grid: &mut WorldGrid, frame_dt: f32, settings: SimSettings) -> FrameReport {
        let dt = frame_dt.clamp(0.0, MAX_FRAME_DT) * settings.time_scale.max(0.0);

        // The sky clock runs even while paused so day/night keeps drifting.
        self.clock.advance(dt);

        let mut report = FrameReport {
            clock_hour: self.clock.hour(),
            rain_intensity: self.rain.intensity(),
            ..FrameReport::default()
        };

        if settings.playing {
            let storm = settings.storm_intensity.clamp(0.0, 1.0);
            self.rain.step(dt, storm, &mut self.rng);
            report.rain_intensity = self.rain.intensity();

            if let Some(flash) =
                self.lightning
                    .step(dt, self.rain.intensity(), storm, &mut self.rng)
            {
                report.flashes.push(flash);
            }

            let tornado = self.tornadoes.step(dt, grid, storm, &mut self.ledger);
            report.destruction_changed = tornado.destruction_changed;
            report.trees_changed = tornado.trees_changed;
            report.buildings_changed = tornado.buildings_changed;
            report.tornadoes_spawned = tornado.spawned;
            report.tornadoes_expired = tornado.expired;
        }

        // The siren latches: contact refreshes the hold, which then decays
        // in real (scaled) time even after the tornado moves off.
        if self
            .tornadoes
            .any_near_town(grid, settings.siren_radius_tiles)
        {
            self.siren_hold = SIREN_HOLD;
        } else {
            self.siren_hold = (self.siren_hold - dt).max(0.0);
        }
        report.siren_active = self.siren_hold > 0.0;

        report.tornadoes = self.tornadoes.views(grid);
        report
    }

    /// Spawn a tornado immediately, at a random spot unless one is given.
    pub fn spawn_tornado(&mut self, grid: &WorldGrid, position: Option<glam::Vec2>) -> TornadoId {
        self.tornadoes.spawn(grid, position)
    }

    /// Enable or disable storm-driven tornado auto-spawn.
    pub fn set_auto_spawn(&mut self, enabled: bool) {
        self.tornadoes.set_auto_spawn(enabled);
    }

    /// Tiles destroyed so far, in destruction order.
    pub fn destroyed_tiles(&self) -> &[(i32, i32)] {
        self.ledger.tiles()
    }

    /// Current sky clock.
    pub fn clock(&self) -> &SkyClock {
        &self.clock
    }

    /// Number of active tornadoes.
    pub fn tornado_count(&self) -> usize {
        self.tornadoes.entities().len()
    }

    /// Drop all tornadoes and forget destruction (full world reset).
    pub fn reset(&mut self) {
        self.tornadoes.clear();
        self.ledger.clear();
        self.siren_hold = 0.0;
    }
}
