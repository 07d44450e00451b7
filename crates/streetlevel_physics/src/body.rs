//! Body descriptions and named body records
//!
//! Callers never keep rapier handles. A body is described with [`BodyDesc`],
//! inserted under a name, and afterwards only reachable by that name (or by
//! prefix for bulk removal).

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, UnitVector3, Vector3};
use rapier3d::prelude::{ColliderBuilder, RigidBodyBuilder, RigidBodyHandle};
use slotmap::new_key_type;

use crate::collision::CollisionFilter;
use crate::error::PhysicsError;

new_key_type! {
    /// Key to a named body in the physics world registry
    ///
    /// Generational: once a body is removed, its key never resolves again,
    /// even if the slot is reused.
    pub struct BodyKey;
}

/// Whether the engine integrates the body or treats it as immovable
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    /// Static geometry (terrain, extracted colliders)
    Fixed,
    /// Simulated body (player, vehicles)
    Dynamic,
}

/// Collision shape of a body
#[derive(Clone, Debug, PartialEq)]
pub enum BodyShape {
    /// Oriented box with given half-extents (meters)
    Cuboid { half_extents: Vector3<f32> },
    /// Infinite plane through the body origin; solid below `normal`
    Plane { normal: Vector3<f32> },
    /// Arbitrary triangle mesh, vertices in body space
    TriMesh {
        vertices: Vec<Point3<f32>>,
        indices: Vec<[u32; 3]>,
    },
    /// Y-aligned capsule
    Capsule { half_height: f32, radius: f32 },
    /// Sphere
    Ball { radius: f32 },
}

/// Shape discriminant kept on the registry record for inspection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Cuboid,
    Plane,
    TriMesh,
    Capsule,
    Ball,
}

impl BodyShape {
    /// Box from full size (as opposed to half-extents)
    pub fn cuboid_from_size(size: Vector3<f32>) -> Self {
        BodyShape::Cuboid {
            half_extents: size * 0.5,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            BodyShape::Cuboid { .. } => ShapeKind::Cuboid,
            BodyShape::Plane { .. } => ShapeKind::Plane,
            BodyShape::TriMesh { .. } => ShapeKind::TriMesh,
            BodyShape::Capsule { .. } => ShapeKind::Capsule,
            BodyShape::Ball { .. } => ShapeKind::Ball,
        }
    }

    /// Build the rapier collider for this shape
    ///
    /// `name` is only used for error reporting.
    pub(crate) fn collider_builder(&self, name: &str) -> Result<ColliderBuilder, PhysicsError> {
        match self {
            BodyShape::Cuboid { half_extents } => {
                let valid = half_extents.iter().all(|h| h.is_finite() && *h > 0.0);
                if !valid {
                    return Err(PhysicsError::InvalidShape(name.to_string()));
                }
                Ok(ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z))
            }
            BodyShape::Plane { normal } => {
                let unit = UnitVector3::try_new(*normal, 1.0e-6)
                    .ok_or_else(|| PhysicsError::InvalidShape(name.to_string()))?;
                Ok(ColliderBuilder::halfspace(unit))
            }
            BodyShape::TriMesh { vertices, indices } => {
                if vertices.is_empty() || indices.is_empty() {
                    return Err(PhysicsError::InvalidTriMesh {
                        name: name.to_string(),
                        reason: "mesh has no triangles".to_string(),
                    });
                }
                if vertices.iter().any(|v| !v.coords.iter().all(|c| c.is_finite())) {
                    return Err(PhysicsError::InvalidTriMesh {
                        name: name.to_string(),
                        reason: "non-finite vertex".to_string(),
                    });
                }
                let vertex_count = vertices.len() as u32;
                if indices.iter().flatten().any(|i| *i >= vertex_count) {
                    return Err(PhysicsError::InvalidTriMesh {
                        name: name.to_string(),
                        reason: "index out of range".to_string(),
                    });
                }
                ColliderBuilder::trimesh(vertices.clone(), indices.clone()).map_err(|e| {
                    PhysicsError::InvalidTriMesh {
                        name: name.to_string(),
                        reason: format!("{:?}", e),
                    }
                })
            }
            BodyShape::Capsule {
                half_height,
                radius,
            } => {
                if !(*half_height >= 0.0 && *radius > 0.0) {
                    return Err(PhysicsError::InvalidShape(name.to_string()));
                }
                Ok(ColliderBuilder::capsule_y(*half_height, *radius))
            }
            BodyShape::Ball { radius } => {
                if !(*radius > 0.0) {
                    return Err(PhysicsError::InvalidShape(name.to_string()));
                }
                Ok(ColliderBuilder::ball(*radius))
            }
        }
    }
}

/// Extra collider attached rigidly to a body (e.g. vehicle wheels)
#[derive(Clone, Debug, PartialEq)]
pub struct ColliderAttachment {
    pub shape: BodyShape,
    /// Offset from the body origin, in body space
    pub offset: Vector3<f32>,
    pub filter: CollisionFilter,
    pub friction: f32,
}

/// Description of a body to insert into the world
#[derive(Clone, Debug, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub shape: BodyShape,
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub filter: CollisionFilter,
    /// Mass of the primary collider (dynamic bodies only)
    pub mass: Option<f32>,
    pub friction: f32,
    pub lock_rotations: bool,
    pub attachments: Vec<ColliderAttachment>,
}

impl BodyDesc {
    fn new(kind: BodyKind, shape: BodyShape) -> Self {
        Self {
            kind,
            shape,
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            filter: CollisionFilter::TERRAIN,
            mass: None,
            friction: 0.5,
            lock_rotations: false,
            attachments: Vec::new(),
        }
    }

    /// Static body
    pub fn fixed(shape: BodyShape) -> Self {
        Self::new(BodyKind::Fixed, shape)
    }

    /// Simulated body
    pub fn dynamic(shape: BodyShape) -> Self {
        Self::new(BodyKind::Dynamic, shape)
    }

    /// Set the world-space position
    pub fn at(mut self, translation: Vector3<f32>) -> Self {
        self.translation = translation;
        self
    }

    /// Set the world-space orientation
    pub fn with_rotation(mut self, rotation: UnitQuaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set the collision group/mask pair
    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the mass of the primary collider
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Set the friction coefficient, clamped to [0, 1]
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction.clamp(0.0, 1.0);
        self
    }

    /// Prevent the body from rotating (upright characters)
    pub fn with_locked_rotations(mut self) -> Self {
        self.lock_rotations = true;
        self
    }

    /// Attach an extra collider
    pub fn with_attachment(mut self, attachment: ColliderAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub(crate) fn rigid_body_builder(&self) -> RigidBodyBuilder {
        let pose = Isometry3::from_parts(Translation3::from(self.translation), self.rotation);
        let builder = match self.kind {
            BodyKind::Fixed => RigidBodyBuilder::fixed(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic().ccd_enabled(true),
        }
        .pose(pose);

        if self.lock_rotations {
            builder.lock_rotations()
        } else {
            builder
        }
    }
}

/// Registry record for an inserted body
#[derive(Clone, Debug)]
pub struct NamedBody {
    /// Hierarchical name, `<subsystem>-<discriminator>` by convention
    pub name: String,
    pub kind: BodyKind,
    pub shape: ShapeKind,
    pub filter: CollisionFilter,
    pub(crate) handle: RigidBodyHandle,
}

impl NamedBody {
    /// Whether this body's name starts with `prefix`
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.name.starts_with(prefix)
    }
}
