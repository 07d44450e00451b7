//! Scene graph input for Streetlevel collision
//!
//! This crate provides:
//! - A slotmap-backed scene graph with local transforms and triangle meshes
//! - RON scene templates that instantiate into a graph
//! - Name-driven collider extraction into a physics world

pub mod extract;
pub mod graph;
pub mod mesh;
pub mod template;
pub mod transform;

// Re-export commonly used types
pub use extract::{
    create_box_collider, create_box_colliders_from_scene, create_trimesh_colliders_from_scene,
    default_box_predicate, default_trimesh_predicate, node_position, ColliderExtractor,
    ColliderKind, ColliderRule, ExtractionReport, BOX_HELPER_PREFIX, TERRAIN_PATTERNS,
};
pub use graph::{NodeKey, SceneGraph, SceneNode};
pub use mesh::{Bounds, TriMesh};
pub use template::{MeshTemplate, NodeTemplate, SceneLoadError, SceneSaveError, SceneTemplate};
pub use transform::Transform;
