//! Read/write surface for HUD, input and scene-load collaborators
//!
//! Every call is guarded on the world existing. Reads return `None` before
//! the first `acquire(true)` or for an unknown vehicle; writes are no-ops.

use nalgebra::{UnitQuaternion, Vector3};

use crate::error::PhysicsError;
use crate::manager::PhysicsWorldManager;
use crate::vehicle::{VehicleControls, VehicleState};

impl PhysicsWorldManager {
    /// Relocate the player with zeroed velocity; false if there is no world or player
    pub fn teleport_player(&mut self, position: Vector3<f32>, rotation: UnitQuaternion<f32>) -> bool {
        self.get_mut()
            .map(|world| world.teleport_player(position, rotation))
            .unwrap_or(false)
    }

    pub fn player_position(&self) -> Option<Vector3<f32>> {
        self.get()?.player_position()
    }

    pub fn player_rotation(&self) -> Option<UnitQuaternion<f32>> {
        self.get()?.player_rotation()
    }

    /// Full telemetry for a vehicle
    pub fn try_get_vehicle(&self, id: &str) -> Option<VehicleState> {
        self.get()?.try_get_vehicle(id)
    }

    /// -1 reverse, 0 neutral, 1..N forward
    pub fn gear(&self, id: &str) -> Option<i32> {
        self.try_get_vehicle(id).map(|state| state.gear)
    }

    /// Signed speed along the vehicle's forward axis, negative in reverse
    pub fn speed(&self, id: &str) -> Option<f32> {
        self.try_get_vehicle(id).map(|state| state.speed)
    }

    pub fn rpm(&self, id: &str) -> Option<f32> {
        self.try_get_vehicle(id).map(|state| state.rpm)
    }

    /// Forward driver input; with no world every id is unknown
    pub fn set_vehicle_controls(
        &mut self,
        id: &str,
        controls: VehicleControls,
    ) -> Result<(), PhysicsError> {
        match self.get_mut() {
            Some(world) => world.set_vehicle_controls(id, controls),
            None => Err(PhysicsError::VehicleNotFound(id.to_string())),
        }
    }

    /// Remove bodies by name prefix; 0 if there is no world
    pub fn remove_bodies_by_prefix(&mut self, prefix: &str) -> usize {
        self.get_mut()
            .map(|world| world.remove_bodies_by_prefix(prefix))
            .unwrap_or(0)
    }
}
