//! Stylized rain intensity process.
//!
//! A bounded random walk pulled toward the configured storm intensity. Not a
//! precipitation model; the scalar feeds the audio mix and the renderer's
//! particle budget.

use stormvale_core::SeededRng;

/// Rain intensity in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RainState {
    intensity: f32,
}

impl RainState {
    /// Start with no rain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Step the envelope toward `target` with a little deterministic jitter.
    pub fn step(&mut self, dt: f32, target: f32, rng: &mut SeededRng) {
        let pull = (target.clamp(0.0, 1.0) - self.intensity) * (dt * 0.6).min(1.0);
        let jitter = rng.range(-0.25, 0.25) as f32 * dt;
        self.intensity = (self.intensity + pull + jitter).clamp(0.0, 1.0);
    }

    /// Current intensity in `[0, 1]`.
    pub fn intensity(&self) -> f32 {
        self.intensity
    }
}
