//! Authoritative rigid-body simulation for the streetlevel world
//!
//! This crate wraps rapier3d and provides:
//! - The collision group/mask policy
//! - A named-body world with prefix-based bulk removal
//! - A reference-counted world manager with ground/player bootstrap
//! - Player movement, grounding and teleport
//! - Vehicles with an automatic gearbox and derived RPM
//! - A clamped per-frame stepper and a collider debug visualizer

pub mod body;
pub mod collision;
pub mod debug;
pub mod error;
pub mod facade;
pub mod manager;
pub mod player;
pub mod stepper;
pub mod vehicle;
pub mod world;

// Re-export commonly used types
pub use body::{BodyDesc, BodyKey, BodyKind, BodyShape, ColliderAttachment, NamedBody, ShapeKind};
pub use collision::{masks, should_collide, CollisionCategory, CollisionFilter, CollisionGroups};
pub use debug::{DebugShape, DebugShapeKind, DebugVisualizer};
pub use error::PhysicsError;
pub use manager::PhysicsWorldManager;
pub use player::PLAYER_BODY_NAME;
pub use stepper::Stepper;
pub use vehicle::{
    derive_rpm, select_gear, vehicle_body_name, GearTable, VehicleControls, VehicleSpec,
    VehicleState,
};
pub use world::{PhysicsConfig, PhysicsWorld, GROUND_BODY_NAME};
