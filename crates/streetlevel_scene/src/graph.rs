//! Scene graph
//!
//! An arena of named nodes with local transforms and optional meshes. This is
//! the input boundary for collider extraction: loaders build a graph, the
//! extractor walks it by name.

use nalgebra::{Matrix4, Point3};
use slotmap::{new_key_type, SlotMap};

use crate::mesh::{Bounds, TriMesh};
use crate::transform::Transform;

new_key_type! {
    /// Key to a node in a [`SceneGraph`]
    pub struct NodeKey;
}

/// One node of the scene graph
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<TriMesh>,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl SceneNode {
    /// Create a geometry-less node with an identity transform
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            mesh: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: TriMesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}

/// Arena-backed node tree
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, SceneNode>,
    roots: Vec<NodeKey>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level node
    pub fn add_root(&mut self, mut node: SceneNode) -> NodeKey {
        node.parent = None;
        node.children.clear();
        let key = self.nodes.insert(node);
        self.roots.push(key);
        key
    }

    /// Add a node under `parent`; `None` if the parent doesn't exist
    pub fn add_child(&mut self, parent: NodeKey, mut node: SceneNode) -> Option<NodeKey> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        node.parent = Some(parent);
        node.children.clear();
        let key = self.nodes.insert(node);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(key);
        }
        Some(key)
    }

    /// Remove a node and all its descendants; returns how many were removed
    pub fn remove_subtree(&mut self, key: NodeKey) -> usize {
        let subtree = self.traverse(key);
        if subtree.is_empty() {
            return 0;
        }

        match self.nodes.get(key).and_then(SceneNode::parent) {
            Some(parent) => {
                if let Some(parent_node) = self.nodes.get_mut(parent) {
                    parent_node.children.retain(|child| *child != key);
                }
            }
            None => self.roots.retain(|root| *root != key),
        }

        for node in &subtree {
            self.nodes.remove(*node);
        }
        subtree.len()
    }

    pub fn get(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node named exactly `name`, in root order then pre-order
    pub fn find(&self, name: &str) -> Option<NodeKey> {
        self.roots
            .iter()
            .flat_map(|root| self.traverse(*root))
            .find(|key| self.nodes.get(*key).is_some_and(|node| node.name == name))
    }

    /// Depth-first pre-order walk of the subtree rooted at `start`
    ///
    /// Includes `start` itself; empty if `start` doesn't exist.
    pub fn traverse(&self, start: NodeKey) -> Vec<NodeKey> {
        let mut order = Vec::new();
        if !self.nodes.contains_key(start) {
            return order;
        }

        let mut stack = vec![start];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            order.push(key);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    /// Local-to-world matrix of a node
    pub fn world_matrix(&self, key: NodeKey) -> Option<Matrix4<f32>> {
        let mut node = self.nodes.get(key)?;
        let mut matrix = node.transform.to_matrix();
        while let Some(parent) = node.parent.and_then(|p| self.nodes.get(p)) {
            matrix = parent.transform.to_matrix() * matrix;
            node = parent;
        }
        Some(matrix)
    }

    /// The node's own mesh in world space, children excluded
    ///
    /// `None` if the node has no usable triangles. Triangles with
    /// out-of-range indices are dropped.
    pub fn node_world_mesh(&self, key: NodeKey) -> Option<TriMesh> {
        let mesh = self.nodes.get(key)?.mesh.as_ref()?;
        let matrix = self.world_matrix(key)?;

        let mut world_mesh = TriMesh::default();
        world_mesh.append(&mesh.transformed(&matrix));
        if world_mesh.is_empty() {
            None
        } else {
            Some(world_mesh)
        }
    }

    /// All mesh geometry of the subtree, merged into world space
    ///
    /// `None` if no node in the subtree carries a non-empty mesh.
    pub fn world_triangles(&self, key: NodeKey) -> Option<TriMesh> {
        let mut merged = TriMesh::default();
        for node_key in self.traverse(key) {
            let Some(mesh) = self.nodes.get(node_key).and_then(|node| node.mesh.as_ref()) else {
                continue;
            };
            if mesh.is_empty() {
                continue;
            }
            let matrix = self.world_matrix(node_key)?;
            merged.append(&mesh.transformed(&matrix));
        }

        if merged.is_empty() {
            None
        } else {
            Some(merged)
        }
    }

    /// World-space bounds of a node and all its descendants
    ///
    /// A subtree without any geometry is treated as a box helper: the unit
    /// cube placed and scaled by the node's world transform.
    pub fn world_bounds(&self, key: NodeKey) -> Option<Bounds> {
        if let Some(mesh) = self.world_triangles(key) {
            return Bounds::from_points(&mesh.vertices);
        }

        let matrix = self.world_matrix(key)?;
        let corners: Vec<Point3<f32>> = unit_cube_corners()
            .iter()
            .map(|corner| matrix.transform_point(corner))
            .collect();
        Bounds::from_points(&corners)
    }
}

fn unit_cube_corners() -> [Point3<f32>; 8] {
    let mut corners = [Point3::origin(); 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        let pick = |bit: usize| if i & bit == 0 { -0.5 } else { 0.5 };
        *corner = Point3::new(pick(1), pick(2), pick(4));
    }
    corners
}
