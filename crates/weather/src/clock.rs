//! Wrapping 24-hour simulated sky clock.
//!
//! Advances at a fixed rate of simulated hours per real second; the
//! orchestrator feeds it the already-clamped, time-scaled frame delta.

use serde::{Deserialize, Serialize};

/// Simulated hours advanced per real second (before time scaling).
pub const HOURS_PER_SECOND: f32 = 0.35;

/// Time-of-day state in `[0, 24)` hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyClock {
    hour: f32,
}

impl SkyClock {
    /// Start the day at the given hour (wrapped into range).
    pub fn new(start_hour: f32) -> Self {
        Self {
            hour: start_hour.rem_euclid(24.0),
        }
    }

    /// Advance by a scaled frame delta in seconds.
    pub fn advance(&mut self, dt: f32) {
        self.hour = (self.hour + dt * HOURS_PER_SECOND).rem_euclid(24.0);
    }

    /// Current hour in `[0, 24)`.
    pub fn hour(&self) -> f32 {
        self.hour
    }

    /// Whether the sun is down (before 6:00 or after 20:00).
    pub fn is_night(&self) -> bool {
        self.hour < 6.0 || self.hour >= 20.0
    }
}

impl Default for SkyClock {
    fn default() -> Self {
        Self::new(8.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_at_fixed_rate() {
        let mut clock = SkyClock::new(8.0);
        clock.advance(2.0);
        assert!((clock.hour() - 8.7).abs() < 1e-5);
    }

    #[test]
    fn wraps_at_midnight() {
        let mut clock = SkyClock::new(23.9);
        // 0.35 h/s: one second pushes past 24.
        clock.advance(1.0);
        assert!(clock.hour() < 1.0);
        assert!(clock.hour() >= 0.0);
    }

    #[test]
    fn start_hour_is_wrapped() {
        let clock = SkyClock::new(26.5);
        assert!((clock.hour() - 2.5).abs() < 1e-5);
    }

    #[test]
    fn night_detection() {
        assert!(SkyClock::new(3.0).is_night());
        assert!(!SkyClock::new(12.0).is_night());
        assert!(SkyClock::new(21.0).is_night());
    }
}
