//! Game simulation system
//!
//! Manages the per-frame simulation including:
//! - Delta time calculation
//! - Input → player movement
//! - Physics stepping

use std::time::Instant;

use nalgebra::Vector3;
use streetlevel_physics::{PhysicsWorldManager, Stepper};

/// Player input gathered for one frame
#[derive(Clone, Copy, Debug, Default)]
pub struct PlayerInput {
    /// Desired horizontal velocity (Y is ignored)
    pub movement: Vector3<f32>,
    pub jump: bool,
}

/// Result of a simulation update
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationResult {
    /// Timestep actually simulated, `None` if the world was not stepped
    pub stepped: Option<f32>,
    /// Player position after the step
    pub player_position: Option<Vector3<f32>>,
}

/// Manages the game simulation loop
pub struct SimulationSystem {
    last_frame: Instant,
    stepper: Stepper,
}

impl SimulationSystem {
    /// Create a new simulation system
    pub fn new(stepper: Stepper) -> Self {
        Self {
            last_frame: Instant::now(),
            stepper,
        }
    }

    /// Run one simulation frame using wall-clock delta time
    pub fn update(&mut self, manager: &mut PhysicsWorldManager, input: PlayerInput) -> SimulationResult {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.update_with_delta(manager, input, dt)
    }

    /// Run one simulation frame with an explicit delta time
    ///
    /// The stepper caps `dt`; a frame with no live world does nothing.
    pub fn update_with_delta(
        &mut self,
        manager: &mut PhysicsWorldManager,
        input: PlayerInput,
        dt: f32,
    ) -> SimulationResult {
        if let Some(world) = manager.get_mut() {
            world.apply_player_movement(input.movement);
            if input.jump {
                world.player_jump();
            }
        }

        let stepped = self.stepper.advance(manager, dt);

        SimulationResult {
            stepped,
            player_position: manager.player_position(),
        }
    }

    pub fn stepper(&self) -> &Stepper {
        &self.stepper
    }
}

impl Default for SimulationSystem {
    fn default() -> Self {
        Self::new(Stepper::default())
    }
}
