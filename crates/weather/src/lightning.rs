//! Discrete lightning flash events.
//!
//! Flashes are Bernoulli trials gated on rain and storm intensity with a
//! short cooldown so two flashes never land in back-to-back frames. Each
//! event carries a strength scalar and a thunder delay proportional to a
//! randomized strike distance; interpretation (flash brightness, thunder
//! sample) belongs to the rendering/audio collaborators.

use serde::{Deserialize, Serialize};
use stormvale_core::SeededRng;

/// Seconds between flashes at minimum.
const FLASH_COOLDOWN: f32 = 2.0;
/// Per-second flash rate at full rain and full storm intensity.
const FLASH_RATE: f64 = 0.12;

/// One lightning strike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlashEvent {
    /// Flash strength in `[0.4, 1.0]`.
    pub strength: f32,
    /// Seconds until the thunder clap for this flash.
    pub thunder_delay: f32,
}

/// Lightning trigger state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightningState {
    cooldown: f32,
}

impl LightningState {
    /// Fresh state, ready to flash.
    pub fn new() -> Self {
        Self::default()
    }

    /// Step one tick; returns a flash event when one triggers.
    pub fn step(
        &mut self,
        dt: f32,
        rain_intensity: f32,
        storm_intensity: f32,
        rng: &mut SeededRng,
    ) -> Option<FlashEvent> {
        if self.cooldown > 0.0 {
            self.cooldown -= dt;
            return None;
        }
        let p = (rain_intensity as f64 * storm_intensity as f64) * dt as f64 * FLASH_RATE;
        if !rng.chance(p) {
            return None;
        }
        self.cooldown = FLASH_COOLDOWN;
        Some(FlashEvent {
            strength: rng.range(0.4, 1.0) as f32,
            // Thunder lags by distance: roughly 0.3-3 seconds out.
            thunder_delay: rng.range(0.3, 3.0) as f32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flashes_without_rain() {
        let mut lightning = LightningState::new();
        let mut rng = SeededRng::new(3);
        for _ in 0..10_000 {
            assert!(lightning.step(0.016, 0.0, 1.0, &mut rng).is_none());
        }
    }

    #[test]
    fn flashes_eventually_under_full_storm() {
        let mut lightning = LightningState::new();
        let mut rng = SeededRng::new(4);
        let mut flashes = 0;
        for _ in 0..100_000 {
            if lightning.step(0.016, 1.0, 1.0, &mut rng).is_some() {
                flashes += 1;
            }
        }
        assert!(flashes > 0, "expected at least one flash");
    }

    #[test]
    fn flash_fields_are_in_range() {
        let mut lightning = LightningState::new();
        let mut rng = SeededRng::new(5);
        let mut seen = 0;
        for _ in 0..200_000 {
            if let Some(flash) = lightning.step(0.016, 1.0, 1.0, &mut rng) {
                assert!((0.4..=1.0).contains(&flash.strength));
                assert!((0.3..=3.0).contains(&flash.thunder_delay));
                seen += 1;
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn cooldown_spaces_out_flashes() {
        let mut lightning = LightningState::new();
        let mut rng = SeededRng::new(6);
        let dt = 0.016f32;
        let mut last_flash_tick: Option<i64> = None;
        for tick in 0..500_000i64 {
            if lightning.step(dt, 1.0, 1.0, &mut rng).is_some() {
                if let Some(last) = last_flash_tick {
                    let gap = (tick - last) as f32 * dt;
                    assert!(gap >= FLASH_COOLDOWN, "flashes {}s apart", gap);
                }
                last_flash_tick = Some(tick);
            }
        }
    }
}
