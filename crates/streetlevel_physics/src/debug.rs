//! Collider debug visualization
//!
//! Turns every collider into world-space geometry a renderer can draw as
//! wireframe. Unbounded colliders (the ground half-space) and candidates with
//! any non-finite vertex (a body that blew up) are dropped here, before they
//! reach a renderer.

use std::collections::HashMap;

use log::trace;
use nalgebra::Point3;
use rapier3d::prelude::{Collider, RigidBodyHandle};

use crate::world::PhysicsWorld;

/// How a debug shape's vertices should be read
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugShapeKind {
    /// 8 corners of an oriented box, in `Aabb::vertices` order
    Box,
    /// Indexed triangle mesh
    Mesh,
    /// 8 corners of a world-space bounding box (balls, capsules)
    Bounds,
}

/// World-space geometry for one collider
#[derive(Clone, Debug, PartialEq)]
pub struct DebugShape {
    /// Name of the owning body, empty if the body is unnamed
    pub body: String,
    pub kind: DebugShapeKind,
    pub vertices: Vec<Point3<f32>>,
    /// Only set for [`DebugShapeKind::Mesh`]
    pub indices: Vec<[u32; 3]>,
}

impl DebugShape {
    /// True when every vertex coordinate is finite
    pub fn is_finite(&self) -> bool {
        self.vertices
            .iter()
            .all(|v| v.coords.iter().all(|c| c.is_finite()))
    }
}

/// Collects drawable collider geometry each frame
#[derive(Debug, Default)]
pub struct DebugVisualizer {
    shapes: Vec<DebugShape>,
    rejected: usize,
}

impl DebugVisualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build debug geometry for every collider, dropping non-finite shapes
    pub fn collect(world: &PhysicsWorld) -> (Vec<DebugShape>, usize) {
        let names: HashMap<RigidBodyHandle, &str> = world
            .registry
            .values()
            .map(|body| (body.handle, body.name.as_str()))
            .collect();

        let mut rejected = 0;
        let mut shapes = Vec::with_capacity(world.colliders.len());
        for (_, collider) in world.colliders.iter() {
            let body = collider
                .parent()
                .and_then(|handle| names.get(&handle).copied())
                .unwrap_or_default();
            match candidate(body, collider) {
                Some(shape) if shape.is_finite() => shapes.push(shape),
                _ => {
                    trace!("Dropping unbounded or non-finite debug shape for '{}'", body);
                    rejected += 1;
                }
            }
        }
        (shapes, rejected)
    }

    /// Refresh the cached shapes from the current world state
    pub fn update(&mut self, world: &PhysicsWorld) {
        let (shapes, rejected) = Self::collect(world);
        self.shapes = shapes;
        self.rejected = rejected;
    }

    /// Shapes from the last [`update`](Self::update)
    pub fn shapes(&self) -> &[DebugShape] {
        &self.shapes
    }

    /// How many candidates the last update dropped
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
        self.rejected = 0;
    }
}

/// Drawable geometry for a collider, `None` for unbounded shapes
fn candidate(body: &str, collider: &Collider) -> Option<DebugShape> {
    let position = collider.position();
    let shape = collider.shape();

    // A half-space is infinite; there is no quad to draw
    if shape.as_halfspace().is_some() {
        return None;
    }

    let (kind, vertices, indices) = if let Some(cuboid) = shape.as_cuboid() {
        let he = cuboid.half_extents;
        let corners = [
            Point3::new(-he.x, -he.y, -he.z),
            Point3::new(he.x, -he.y, -he.z),
            Point3::new(he.x, he.y, -he.z),
            Point3::new(-he.x, he.y, -he.z),
            Point3::new(-he.x, -he.y, he.z),
            Point3::new(he.x, -he.y, he.z),
            Point3::new(he.x, he.y, he.z),
            Point3::new(-he.x, he.y, he.z),
        ];
        let vertices = corners.iter().map(|p| position * p).collect();
        (DebugShapeKind::Box, vertices, Vec::new())
    } else if let Some(mesh) = shape.as_trimesh() {
        let vertices = mesh.vertices().iter().map(|p| position * p).collect();
        (DebugShapeKind::Mesh, vertices, mesh.indices().to_vec())
    } else {
        let aabb = collider.compute_aabb();
        (DebugShapeKind::Bounds, aabb.vertices().to_vec(), Vec::new())
    };

    Some(DebugShape {
        body: body.to_string(),
        kind,
        vertices,
        indices,
    })
}
