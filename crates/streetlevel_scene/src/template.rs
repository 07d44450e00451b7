//! Scene templates
//!
//! A [`SceneTemplate`] is the serializable form of a node tree, stored as RON.
//! Instantiating it into a [`SceneGraph`] gives the extractor something to walk.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::graph::{NodeKey, SceneGraph, SceneNode};
use crate::mesh::TriMesh;
use crate::transform::Transform;

/// A serializable scene: a named forest of node templates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneTemplate {
    /// Scene name (for display/debugging)
    pub name: String,
    /// Prefix for the colliders this scene generates, e.g. `city`
    #[serde(default)]
    pub collider_prefix: Option<String>,
    /// Top-level nodes
    pub nodes: Vec<NodeTemplate>,
}

/// Serializable node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTemplate {
    pub name: String,
    #[serde(default)]
    pub position: [f32; 3],
    /// Euler angles (roll, pitch, yaw) in radians
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
    #[serde(default)]
    pub mesh: Option<MeshTemplate>,
    #[serde(default)]
    pub children: Vec<NodeTemplate>,
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// Serializable mesh description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MeshTemplate {
    /// Closed box centered on the node origin
    Cuboid {
        /// Full size along each axis
        size: [f32; 3],
    },
    /// Cone-shaped mound with its base on the node's y = 0
    Hill {
        radius: f32,
        height: f32,
        segments: u32,
    },
    /// Raw indexed triangles
    Triangles {
        vertices: Vec<[f32; 3]>,
        indices: Vec<[u32; 3]>,
    },
}

impl MeshTemplate {
    pub fn to_mesh(&self) -> TriMesh {
        match self {
            MeshTemplate::Cuboid { size } => TriMesh::cuboid(Vector3::from(*size)),
            MeshTemplate::Hill {
                radius,
                height,
                segments,
            } => TriMesh::hill(*radius, *height, *segments),
            MeshTemplate::Triangles { vertices, indices } => TriMesh::new(
                vertices.iter().map(|v| Point3::from(*v)).collect(),
                indices.clone(),
            ),
        }
    }
}

impl NodeTemplate {
    /// Create a node with identity transform and no mesh
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: unit_scale(),
            mesh: None,
            children: Vec::new(),
        }
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = [x, y, z];
        self
    }

    pub fn with_scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.scale = [x, y, z];
        self
    }

    pub fn with_mesh(mut self, mesh: MeshTemplate) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_child(mut self, child: NodeTemplate) -> Self {
        self.children.push(child);
        self
    }

    pub fn transform(&self) -> Transform {
        let [roll, pitch, yaw] = self.rotation;
        Transform::from_translation(Vector3::from(self.position))
            .with_rotation(UnitQuaternion::from_euler_angles(roll, pitch, yaw))
            .with_scale(Vector3::from(self.scale))
    }

    fn to_node(&self) -> SceneNode {
        let node = SceneNode::new(self.name.clone()).with_transform(self.transform());
        match &self.mesh {
            Some(mesh) => node.with_mesh(mesh.to_mesh()),
            None => node,
        }
    }

    fn instantiate_under(&self, graph: &mut SceneGraph, parent: Option<NodeKey>) -> Option<NodeKey> {
        let key = match parent {
            Some(parent) => graph.add_child(parent, self.to_node())?,
            None => graph.add_root(self.to_node()),
        };
        for child in &self.children {
            child.instantiate_under(graph, Some(key));
        }
        Some(key)
    }
}

impl SceneTemplate {
    /// Create a new empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collider_prefix: None,
            nodes: Vec::new(),
        }
    }

    pub fn with_collider_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.collider_prefix = Some(prefix.into());
        self
    }

    pub fn add_node(&mut self, node: NodeTemplate) {
        self.nodes.push(node);
    }

    /// Load a scene from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SceneLoadError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SceneLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| SceneLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save a scene to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SceneSaveError> {
        let pretty = ron::ser::PrettyConfig::new()
            .struct_names(true)
            .enumerate_arrays(false);
        let contents = ron::ser::to_string_pretty(self, pretty).map_err(SceneSaveError::Serialize)?;
        let path = path.as_ref();
        fs::write(path, contents).map_err(|source| SceneSaveError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Total number of nodes, children included
    pub fn node_count(&self) -> usize {
        fn count(node: &NodeTemplate) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        self.nodes.iter().map(count).sum()
    }

    /// Add every node to `graph`; returns the new root keys
    pub fn instantiate(&self, graph: &mut SceneGraph) -> Vec<NodeKey> {
        let roots: Vec<NodeKey> = self
            .nodes
            .iter()
            .filter_map(|node| node.instantiate_under(graph, None))
            .collect();
        info!("Instantiated scene '{}' ({} nodes)", self.name, self.node_count());
        roots
    }

    /// Collider prefix, falling back to the scene name
    pub fn prefix(&self) -> &str {
        self.collider_prefix.as_deref().unwrap_or(&self.name)
    }
}

/// A scene file that could not be read or parsed
#[derive(Debug)]
pub enum SceneLoadError {
    Io { path: PathBuf, source: io::Error },
    /// Invalid RON, with line/column in `source`
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

impl fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneLoadError::Io { path, source } => {
                write!(f, "cannot read scene {}: {}", path.display(), source)
            }
            SceneLoadError::Parse { path, source } => {
                write!(f, "invalid scene {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SceneLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneLoadError::Io { source, .. } => Some(source),
            SceneLoadError::Parse { source, .. } => Some(source),
        }
    }
}

/// A scene that could not be written
#[derive(Debug)]
pub enum SceneSaveError {
    Io { path: PathBuf, source: io::Error },
    Serialize(ron::Error),
}

impl fmt::Display for SceneSaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneSaveError::Io { path, source } => {
                write!(f, "cannot write scene {}: {}", path.display(), source)
            }
            SceneSaveError::Serialize(e) => write!(f, "cannot serialize scene: {}", e),
        }
    }
}

impl std::error::Error for SceneSaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneSaveError::Io { source, .. } => Some(source),
            SceneSaveError::Serialize(e) => Some(e),
        }
    }
}
