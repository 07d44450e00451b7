//! Per-frame stepping
//!
//! One rendered frame is one simulation step. The frame delta is clamped to
//! `max_delta` so a stalled frame cannot inject a huge timestep; there is no
//! sub-stepping and no accumulator.

use crate::manager::PhysicsWorldManager;
use crate::world::PhysicsConfig;

/// Clamps frame deltas and advances the managed world
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stepper {
    max_delta: f32,
}

impl Stepper {
    pub fn new(max_delta: f32) -> Self {
        Self {
            max_delta: max_delta.max(0.0),
        }
    }

    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self::new(config.max_delta)
    }

    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }

    /// The timestep a frame of `dt` seconds turns into
    ///
    /// Negative and non-finite deltas become zero.
    pub fn clamp_delta(&self, dt: f32) -> f32 {
        if dt.is_nan() || dt <= 0.0 {
            return 0.0;
        }
        dt.min(self.max_delta)
    }

    /// Advance the world by the clamped delta
    ///
    /// Returns the applied timestep, or `None` if there is no world yet or the
    /// clamped delta is zero.
    pub fn advance(&self, manager: &mut PhysicsWorldManager, dt: f32) -> Option<f32> {
        let step = self.clamp_delta(dt);
        if step <= 0.0 {
            return None;
        }

        manager.get_mut()?.step(step);
        manager.refresh_debug();
        Some(step)
    }
}

impl Default for Stepper {
    fn default() -> Self {
        Self::from_config(&PhysicsConfig::default())
    }
}
