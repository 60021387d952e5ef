//! Simulation clock - clamps frame deltas and tracks simulated time.

use serde::{Deserialize, Serialize};

/// Clamped tick driver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    elapsed: f32,
    max_step: f32,
}

impl SimClock {
    pub fn new(max_step: f32) -> Self {
        Self {
            elapsed: 0.0,
            max_step,
        }
    }

    /// Clamp a raw frame delta into `[0, max_step]`. Non-finite deltas count as zero.
    pub fn clamp_step(&self, raw_dt: f32) -> f32 {
        if raw_dt.is_finite() {
            raw_dt.clamp(0.0, self.max_step)
        } else {
            0.0
        }
    }

    /// Clamp and accumulate a frame delta, returning the step to integrate.
    pub fn advance(&mut self, raw_dt: f32) -> f32 {
        let dt = self.clamp_step(raw_dt);
        self.elapsed += dt;
        dt
    }

    /// Simulated seconds since the session started
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn max_step(&self) -> f32 {
        self.max_step
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hitches_are_clamped() {
        let mut clock = SimClock::new(0.033);
        assert_eq!(clock.advance(0.5), 0.033);
        assert_eq!(clock.advance(0.01), 0.01);
        assert!((clock.elapsed() - 0.043).abs() < 1e-6);
    }

    #[test]
    fn test_bad_deltas_are_zero() {
        let mut clock = SimClock::new(0.033);
        assert_eq!(clock.advance(-1.0), 0.0);
        assert_eq!(clock.advance(f32::NAN), 0.0);
        assert_eq!(clock.advance(f32::INFINITY), 0.0);
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut clock = SimClock::new(0.033);
        clock.advance(0.02);
        clock.reset();
        assert_eq!(clock.elapsed(), 0.0);
        assert_eq!(clock.max_step(), 0.033);
    }
}
