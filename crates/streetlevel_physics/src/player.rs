//! Local player body
//!
//! The player is a dynamic, upright capsule in the Characters group. Horizontal
//! movement sets velocity directly; gravity and collisions stay with the engine.

use nalgebra::{point, UnitQuaternion, Vector3};
use rapier3d::prelude::{QueryFilter, Ray};

use crate::body::{BodyDesc, BodyKey, BodyShape};
use crate::collision::CollisionFilter;
use crate::error::PhysicsError;
use crate::world::PhysicsWorld;

/// Registry name of the local player's body
pub const PLAYER_BODY_NAME: &str = "world-player";

/// Ray origin offset above the feet, keeps the probe from starting inside geometry
const PROBE_LIFT: f32 = 0.02;

/// Smallest normal Y that counts as walkable ground
const MIN_GROUND_NORMAL_Y: f32 = 0.5;

impl PhysicsWorld {
    /// Create the player capsule at the configured spawn, replacing any previous one
    pub fn spawn_player(&mut self) -> Result<BodyKey, PhysicsError> {
        if let Some(old) = self.player.take() {
            self.remove_body(old);
        }

        let desc = BodyDesc::dynamic(BodyShape::Capsule {
            half_height: self.config.player_half_height,
            radius: self.config.player_radius,
        })
        .at(self.config.player_spawn_vector())
        .with_filter(CollisionFilter::CHARACTER)
        .with_mass(self.config.player_mass)
        .with_friction(0.0)
        .with_locked_rotations();

        let key = self.insert_body(PLAYER_BODY_NAME, desc)?;
        self.player = Some(key);
        Ok(key)
    }

    /// Key of the player body, if one exists
    pub fn player_key(&self) -> Option<BodyKey> {
        self.player
    }

    pub fn player_position(&self) -> Option<Vector3<f32>> {
        self.body_translation(self.player?)
    }

    pub fn player_rotation(&self) -> Option<UnitQuaternion<f32>> {
        self.body_rotation(self.player?)
    }

    pub fn player_velocity(&self) -> Option<Vector3<f32>> {
        self.body_linvel(self.player?)
    }

    /// Set horizontal velocity, keeping the vertical component
    ///
    /// The Y component of `planar_velocity` is ignored to prevent flying via
    /// movement input. Returns false when there is no player.
    pub fn apply_player_movement(&mut self, planar_velocity: Vector3<f32>) -> bool {
        let Some(key) = self.player else {
            return false;
        };
        let Some(rb) = self.rigid_body_mut(key) else {
            return false;
        };

        let current = *rb.linvel();
        rb.set_linvel(
            Vector3::new(planar_velocity.x, current.y, planar_velocity.z),
            true,
        );
        true
    }

    /// Jump if the ground probe reports support; returns whether a jump happened
    pub fn player_jump(&mut self) -> bool {
        if !self.is_player_grounded() {
            return false;
        }

        let jump_velocity = self.config.jump_velocity;
        let Some(key) = self.player else {
            return false;
        };
        let Some(rb) = self.rigid_body_mut(key) else {
            return false;
        };
        let current = *rb.linvel();
        rb.set_linvel(Vector3::new(current.x, jump_velocity, current.z), true);
        true
    }

    /// Whether terrain is within the probe distance below the player's feet
    ///
    /// Only Default-group geometry counts: the probe uses the character
    /// ground-probe filter, so trimesh clutter and vehicles are ignored.
    /// Reflects the broad phase as of the last step.
    pub fn is_player_grounded(&self) -> bool {
        let Some(key) = self.player else {
            return false;
        };
        let (Some(record), Some(position)) = (self.registry.get(key), self.body_translation(key))
        else {
            return false;
        };

        let feet_y = position.y - (self.config.player_half_height + self.config.player_radius);
        let ray = Ray::new(
            point![position.x, feet_y + PROBE_LIFT, position.z],
            Vector3::new(0.0, -1.0, 0.0),
        );

        let filter = QueryFilter::default()
            .groups(CollisionFilter::CHARACTER_GROUND_PROBE.interaction_groups())
            .exclude_rigid_body(record.handle);
        let max_dist = (self.config.ground_probe_length + PROBE_LIFT).max(0.0);

        self.query_pipeline(filter)
            .cast_ray_and_get_normal(&ray, max_dist, true)
            .map(|(_, hit)| hit.normal.y >= MIN_GROUND_NORMAL_Y)
            .unwrap_or(false)
    }

    /// Relocate the player and zero its linear and angular velocity
    ///
    /// Returns false when there is no player.
    pub fn teleport_player(
        &mut self,
        position: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
    ) -> bool {
        let Some(key) = self.player else {
            return false;
        };
        let Some(rb) = self.rigid_body_mut(key) else {
            return false;
        };

        rb.set_translation(position, true);
        rb.set_rotation(rotation, true);
        rb.set_linvel(Vector3::zeros(), true);
        rb.set_angvel(Vector3::zeros(), true);
        rb.reset_forces(true);
        true
    }
}
