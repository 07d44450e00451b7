//! Physics world and simulation
//!
//! Wraps the rapier pipeline state together with a registry of named bodies.
//! Bodies are never destroyed individually by callers; scene transitions use
//! [`PhysicsWorld::remove_bodies_by_prefix`].

use std::collections::HashMap;

use log::{debug, info, warn};
use nalgebra::{UnitQuaternion, Vector3};
use rapier3d::prelude::{
    BroadPhaseBvh, CCDSolver, ColliderSet, ImpulseJointSet, IntegrationParameters,
    IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, QueryFilter, QueryPipeline,
    RigidBody, RigidBodySet,
};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::body::{BodyDesc, BodyKey, BodyShape, NamedBody};
use crate::collision::CollisionFilter;
use crate::error::PhysicsError;
use crate::vehicle::Vehicle;

/// Registry name of the ground plane created at bootstrap
pub const GROUND_BODY_NAME: &str = "world-ground";

/// Configuration for the physics simulation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration (applied to Y-axis, negative = down)
    pub gravity: f32,
    /// Largest timestep a single frame may inject (seconds)
    pub max_delta: f32,
    /// Height of the infinite ground plane
    pub ground_height: f32,
    /// Where the local player's body is created
    pub player_spawn: [f32; 3],
    /// Player capsule radius
    pub player_radius: f32,
    /// Half height of the player capsule's cylindrical part
    pub player_half_height: f32,
    /// Player body mass (kg)
    pub player_mass: f32,
    /// Upward velocity applied when jumping
    pub jump_velocity: f32,
    /// How far below the feet the ground probe reaches
    pub ground_probe_length: f32,
    /// Attach the collider debug visualizer (development builds only)
    pub debug_colliders: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            max_delta: 0.1,
            ground_height: 0.0,
            player_spawn: [0.0, 2.0, 0.0],
            player_radius: 0.3,
            player_half_height: 0.6,
            player_mass: 80.0,
            jump_velocity: 5.0,
            ground_probe_length: 0.15,
            debug_colliders: false,
        }
    }
}

impl PhysicsConfig {
    /// Create a new physics config with the given gravity
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity,
            ..Self::default()
        }
    }

    /// Set the maximum per-frame timestep
    pub fn with_max_delta(mut self, max_delta: f32) -> Self {
        self.max_delta = max_delta;
        self
    }

    /// Attach the collider debug visualizer (development builds only)
    pub fn with_debug_colliders(mut self, enabled: bool) -> Self {
        self.debug_colliders = enabled;
        self
    }

    /// Set the player spawn position
    pub fn with_player_spawn(mut self, x: f32, y: f32, z: f32) -> Self {
        self.player_spawn = [x, y, z];
        self
    }

    pub fn player_spawn_vector(&self) -> Vector3<f32> {
        Vector3::new(self.player_spawn[0], self.player_spawn[1], self.player_spawn[2])
    }
}

/// The simulation world containing all rigid bodies
pub struct PhysicsWorld {
    pub(crate) gravity: Vector3<f32>,
    pub(crate) integration_parameters: IntegrationParameters,
    pub(crate) pipeline: PhysicsPipeline,
    pub(crate) islands: IslandManager,
    pub(crate) broad_phase: BroadPhaseBvh,
    pub(crate) narrow_phase: NarrowPhase,
    pub(crate) bodies: RigidBodySet,
    pub(crate) colliders: ColliderSet,
    pub(crate) impulse_joints: ImpulseJointSet,
    pub(crate) multibody_joints: MultibodyJointSet,
    pub(crate) ccd_solver: CCDSolver,
    /// Named bodies (generational keys)
    pub(crate) registry: SlotMap<BodyKey, NamedBody>,
    pub(crate) player: Option<BodyKey>,
    ground: Option<BodyKey>,
    pub(crate) vehicles: HashMap<String, Vehicle>,
    elapsed: f32,
    last_step: Option<f32>,
    /// Physics configuration
    pub config: PhysicsConfig,
}

impl PhysicsWorld {
    /// Create a new physics world with default configuration
    pub fn new() -> Self {
        Self::with_config(PhysicsConfig::default())
    }

    /// Create a new physics world with custom configuration
    pub fn with_config(config: PhysicsConfig) -> Self {
        Self {
            gravity: Vector3::new(0.0, config.gravity, 0.0),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            registry: SlotMap::with_key(),
            player: None,
            ground: None,
            vehicles: HashMap::new(),
            elapsed: 0.0,
            last_step: None,
            config,
        }
    }

    /// Insert a named body and return its key
    ///
    /// All colliders are validated before anything touches the rapier sets,
    /// so a failed insert leaves the world unchanged.
    pub fn insert_body(
        &mut self,
        name: impl Into<String>,
        desc: BodyDesc,
    ) -> Result<BodyKey, PhysicsError> {
        let name = name.into();

        let mut primary = desc
            .shape
            .collider_builder(&name)?
            .collision_groups(desc.filter.interaction_groups())
            .friction(desc.friction);
        if let Some(mass) = desc.mass {
            primary = primary.mass(mass);
        }

        let mut attachments = Vec::with_capacity(desc.attachments.len());
        for attachment in &desc.attachments {
            let collider = attachment
                .shape
                .collider_builder(&name)?
                .translation(attachment.offset)
                .collision_groups(attachment.filter.interaction_groups())
                .friction(attachment.friction);
            attachments.push(collider);
        }

        let handle = self.bodies.insert(desc.rigid_body_builder().build());
        self.colliders
            .insert_with_parent(primary.build(), handle, &mut self.bodies);
        for collider in attachments {
            self.colliders
                .insert_with_parent(collider.build(), handle, &mut self.bodies);
        }

        debug!("Inserted body '{}' ({:?}, {:?})", name, desc.kind, desc.shape.kind());

        Ok(self.registry.insert(NamedBody {
            name,
            kind: desc.kind,
            shape: desc.shape.kind(),
            filter: desc.filter,
            handle,
        }))
    }

    /// Create the infinite ground plane at the configured height
    pub fn spawn_ground(&mut self) -> Result<BodyKey, PhysicsError> {
        let desc = BodyDesc::fixed(BodyShape::Plane {
            normal: Vector3::y(),
        })
        .at(Vector3::new(0.0, self.config.ground_height, 0.0))
        .with_filter(CollisionFilter::TERRAIN);
        let key = self.insert_body(GROUND_BODY_NAME, desc)?;
        if let Some(old) = self.ground.replace(key) {
            self.remove_body(old);
        }
        Ok(key)
    }

    /// Remove a body (and its colliders) from the world
    pub fn remove_body(&mut self, key: BodyKey) -> Option<NamedBody> {
        let record = self.registry.remove(key)?;
        self.bodies.remove(
            record.handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );

        if self.player == Some(key) {
            self.player = None;
        }
        if self.ground == Some(key) {
            self.ground = None;
        }
        self.vehicles.retain(|_, vehicle| vehicle.body != key);

        Some(record)
    }

    /// Whether `key` is the ground plane or the player body
    pub fn is_core_body(&self, key: BodyKey) -> bool {
        self.ground == Some(key) || self.player == Some(key)
    }

    /// Remove every body whose name starts with `prefix`
    ///
    /// Returns how many bodies were removed. No match is not an error.
    /// The ground and player bodies are never removed here, even when the
    /// prefix matches their names; use [`remove_body`](Self::remove_body).
    pub fn remove_bodies_by_prefix(&mut self, prefix: &str) -> usize {
        let (core, keys): (Vec<BodyKey>, Vec<BodyKey>) = self
            .registry
            .iter()
            .filter(|(_, body)| body.has_prefix(prefix))
            .map(|(key, _)| key)
            .partition(|key| self.is_core_body(*key));

        if !core.is_empty() {
            warn!("Prefix '{}' matches core bodies, keeping them", prefix);
        }

        let removed = keys
            .into_iter()
            .filter_map(|key| self.remove_body(key))
            .count();

        if removed > 0 {
            info!("Removed {} bodies with prefix '{}'", removed, prefix);
        }
        removed
    }

    /// Get the number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.registry.len()
    }

    /// Count the bodies whose name starts with `prefix`
    pub fn count_with_prefix(&self, prefix: &str) -> usize {
        self.registry
            .values()
            .filter(|body| body.has_prefix(prefix))
            .count()
    }

    /// Find the first body registered under exactly `name`
    pub fn find_by_name(&self, name: &str) -> Option<BodyKey> {
        self.registry
            .iter()
            .find(|(_, body)| body.name == name)
            .map(|(key, _)| key)
    }

    /// Get a body record by key
    pub fn get(&self, key: BodyKey) -> Option<&NamedBody> {
        self.registry.get(key)
    }

    /// Iterate over all body names
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.registry.values().map(|body| body.name.as_str())
    }

    /// Iterate over all body records
    pub fn iter(&self) -> impl Iterator<Item = (BodyKey, &NamedBody)> + '_ {
        self.registry.iter()
    }

    /// World-space position of a body
    pub fn body_translation(&self, key: BodyKey) -> Option<Vector3<f32>> {
        self.rigid_body(key).map(|rb| *rb.translation())
    }

    /// World-space orientation of a body
    pub fn body_rotation(&self, key: BodyKey) -> Option<UnitQuaternion<f32>> {
        self.rigid_body(key).map(|rb| *rb.rotation())
    }

    /// Linear velocity of a body
    pub fn body_linvel(&self, key: BodyKey) -> Option<Vector3<f32>> {
        self.rigid_body(key).map(|rb| *rb.linvel())
    }

    pub(crate) fn rigid_body(&self, key: BodyKey) -> Option<&RigidBody> {
        let record = self.registry.get(key)?;
        self.bodies.get(record.handle)
    }

    pub(crate) fn rigid_body_mut(&mut self, key: BodyKey) -> Option<&mut RigidBody> {
        let record = self.registry.get(key)?;
        self.bodies.get_mut(record.handle)
    }

    /// Total simulated time (seconds)
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Timestep applied by the most recent [`step`](Self::step)
    pub fn last_step(&self) -> Option<f32> {
        self.last_step
    }

    /// Step the physics simulation forward by dt seconds
    ///
    /// This performs:
    /// 1. Vehicle drive/brake/steer forces
    /// 2. Rapier integration and collision resolution
    /// 3. Vehicle gearbox updates from the new velocities
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;

        self.apply_vehicle_controls();

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );

        self.update_gearboxes();

        self.elapsed += dt;
        self.last_step = Some(dt);
    }

    /// Borrow a query pipeline over the current broad phase
    ///
    /// Reflects the state as of the last [`step`](Self::step).
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}
