//! Collider extraction from scene graphs
//!
//! Collision geometry is derived from node names instead of hand-authored
//! collision data. An extractor holds an ordered table of rules, each pairing
//! a name predicate with a collider kind. One traversal visits every node of
//! the subtree and hands it to the first rule whose predicate matches.
//!
//! Bodies are named `<prefix>-<index>` so a later scene transition can drop
//! them with [`PhysicsWorld::remove_bodies_by_prefix`].

use log::{debug, info, warn};
use nalgebra::{Point3, Vector3};
use streetlevel_physics::{BodyDesc, BodyKey, BodyShape, CollisionFilter, PhysicsError, PhysicsWorld};

use crate::graph::{NodeKey, SceneGraph};

/// Reserved name prefix for box collision helpers
pub const BOX_HELPER_PREFIX: &str = "UCX_";

/// Name fragments that mark natural terrain, matched case-insensitively
pub const TERRAIN_PATTERNS: [&str; 6] = ["hill", "rock", "stone", "cliff", "terrain", "ground"];

/// Boxes thinner than this are padded so flat helpers still collide
const MIN_HALF_EXTENT: f32 = 0.01;

/// Default box predicate: `UCX_` helpers or names containing "collision"/"Collision"
pub fn default_box_predicate(name: &str) -> bool {
    name.starts_with(BOX_HELPER_PREFIX) || name.contains("collision") || name.contains("Collision")
}

/// Default trimesh predicate: natural terrain names
pub fn default_trimesh_predicate(name: &str) -> bool {
    let lower = name.to_lowercase();
    TERRAIN_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

/// What a matching node turns into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColliderKind {
    /// Static world-space bounding box, terrain category
    Box,
    /// Static triangle mesh, trimesh category
    TriMesh,
}

/// One entry of the extraction table
pub struct ColliderRule {
    predicate: Box<dyn Fn(&str) -> bool>,
    kind: ColliderKind,
}

impl ColliderRule {
    pub fn new(kind: ColliderKind, predicate: impl Fn(&str) -> bool + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
            kind,
        }
    }

    pub fn boxes(predicate: impl Fn(&str) -> bool + 'static) -> Self {
        Self::new(ColliderKind::Box, predicate)
    }

    pub fn trimeshes(predicate: impl Fn(&str) -> bool + 'static) -> Self {
        Self::new(ColliderKind::TriMesh, predicate)
    }

    pub fn kind(&self) -> ColliderKind {
        self.kind
    }

    pub fn matches(&self, name: &str) -> bool {
        (self.predicate)(name)
    }
}

impl std::fmt::Debug for ColliderRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColliderRule").field("kind", &self.kind).finish_non_exhaustive()
    }
}

/// Outcome of one extraction pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    pub boxes: usize,
    pub trimeshes: usize,
    /// Matching nodes that produced no body (no geometry, non-finite data)
    pub skipped: usize,
}

impl ExtractionReport {
    /// Bodies created
    pub fn created(&self) -> usize {
        self.boxes + self.trimeshes
    }
}

/// Ordered rule table plus the generic traversal
#[derive(Debug, Default)]
pub struct ColliderExtractor {
    rules: Vec<ColliderRule>,
}

impl ColliderExtractor {
    /// Extractor with no rules; matches nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Box helpers first, then natural terrain
    pub fn with_default_rules() -> Self {
        Self::new()
            .with_rule(ColliderRule::boxes(default_box_predicate))
            .with_rule(ColliderRule::trimeshes(default_trimesh_predicate))
    }

    /// Append a rule; earlier rules win
    pub fn with_rule(mut self, rule: ColliderRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[ColliderRule] {
        &self.rules
    }

    /// Walk the subtree at `root` and insert a body for every matching node
    ///
    /// Zero matches is a valid outcome, not an error.
    pub fn extract(
        &self,
        graph: &SceneGraph,
        root: NodeKey,
        world: &mut PhysicsWorld,
        name_prefix: &str,
    ) -> ExtractionReport {
        self.extract_nodes(graph, graph.traverse(root), world, name_prefix)
    }

    /// Same as [`extract`](Self::extract) over every root of the graph
    ///
    /// Indices continue across roots, so names stay unique under one prefix.
    pub fn extract_all(
        &self,
        graph: &SceneGraph,
        world: &mut PhysicsWorld,
        name_prefix: &str,
    ) -> ExtractionReport {
        let nodes = graph
            .roots()
            .iter()
            .flat_map(|root| graph.traverse(*root))
            .collect();
        self.extract_nodes(graph, nodes, world, name_prefix)
    }

    fn extract_nodes(
        &self,
        graph: &SceneGraph,
        nodes: Vec<NodeKey>,
        world: &mut PhysicsWorld,
        name_prefix: &str,
    ) -> ExtractionReport {
        let mut report = ExtractionReport::default();

        for key in nodes {
            let Some(node) = graph.get(key) else {
                continue;
            };
            let Some(rule) = self.rules.iter().find(|rule| rule.matches(&node.name)) else {
                continue;
            };

            let name = format!("{}-{}", name_prefix, report.created());
            let result = match rule.kind {
                ColliderKind::Box => box_from_node(graph, key, world, &name),
                ColliderKind::TriMesh => trimesh_from_node(graph, key, world, &name),
            };

            match result {
                Ok(Some(_)) => {
                    debug!("Extracted {:?} collider '{}' from node '{}'", rule.kind, name, node.name);
                    match rule.kind {
                        ColliderKind::Box => report.boxes += 1,
                        ColliderKind::TriMesh => report.trimeshes += 1,
                    }
                }
                Ok(None) => {
                    warn!("Node '{}' matched {:?} but has no usable geometry", node.name, rule.kind);
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!("Skipping node '{}': {}", node.name, e);
                    report.skipped += 1;
                }
            }
        }

        info!(
            "Extracted colliders '{}': {} boxes, {} trimeshes, {} skipped",
            name_prefix, report.boxes, report.trimeshes, report.skipped
        );
        report
    }
}

fn box_from_node(
    graph: &SceneGraph,
    key: NodeKey,
    world: &mut PhysicsWorld,
    name: &str,
) -> Result<Option<BodyKey>, PhysicsError> {
    let Some(bounds) = graph.world_bounds(key) else {
        return Ok(None);
    };
    if !bounds.is_finite() {
        return Ok(None);
    }
    create_box_collider(world, bounds.center().coords, bounds.size(), name).map(Some)
}

fn trimesh_from_node(
    graph: &SceneGraph,
    key: NodeKey,
    world: &mut PhysicsWorld,
    name: &str,
) -> Result<Option<BodyKey>, PhysicsError> {
    let Some(mesh) = graph.node_world_mesh(key) else {
        return Ok(None);
    };
    let desc = BodyDesc::fixed(BodyShape::TriMesh {
        vertices: mesh.vertices,
        indices: mesh.indices,
    })
    .with_filter(CollisionFilter::TRIMESH);
    world.insert_body(name, desc).map(Some)
}

/// Insert a static box for every node whose name satisfies `predicate`
///
/// Returns how many colliders were created.
pub fn create_box_colliders_from_scene(
    world: &mut PhysicsWorld,
    graph: &SceneGraph,
    root: NodeKey,
    predicate: impl Fn(&str) -> bool + 'static,
    name_prefix: &str,
) -> usize {
    ColliderExtractor::new()
        .with_rule(ColliderRule::boxes(predicate))
        .extract(graph, root, world, name_prefix)
        .created()
}

/// Insert a static triangle mesh for every node whose name satisfies `predicate`
///
/// Returns how many colliders were created.
pub fn create_trimesh_colliders_from_scene(
    world: &mut PhysicsWorld,
    graph: &SceneGraph,
    root: NodeKey,
    predicate: impl Fn(&str) -> bool + 'static,
    name_prefix: &str,
) -> usize {
    ColliderExtractor::new()
        .with_rule(ColliderRule::trimeshes(predicate))
        .extract(graph, root, world, name_prefix)
        .created()
}

/// Insert one axis-aligned static box for a hand-placed volume
///
/// `size` is the full size; axes thinner than 2 cm are padded.
pub fn create_box_collider(
    world: &mut PhysicsWorld,
    position: Vector3<f32>,
    size: Vector3<f32>,
    name: &str,
) -> Result<BodyKey, PhysicsError> {
    let half_extents = (size * 0.5).map(|h| h.abs().max(MIN_HALF_EXTENT));
    let desc = BodyDesc::fixed(BodyShape::Cuboid { half_extents })
        .at(position)
        .with_filter(CollisionFilter::TERRAIN);
    world.insert_body(name, desc)
}

/// World-space center of a node, for placing markers and spawn points
pub fn node_position(graph: &SceneGraph, key: NodeKey) -> Option<Point3<f32>> {
    graph
        .world_matrix(key)
        .map(|matrix| matrix.transform_point(&Point3::origin()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SceneNode;
    use crate::mesh::TriMesh;
    use crate::transform::Transform;
    use streetlevel_physics::{BodyKind, DebugVisualizer, ShapeKind};

    fn helper(name: &str, x: f32) -> SceneNode {
        SceneNode::new(name).with_transform(
            Transform::from_translation(Vector3::new(x, 1.0, 0.0)).with_scale(Vector3::new(2.0, 2.0, 2.0)),
        )
    }

    #[test]
    fn test_default_box_predicate() {
        assert!(default_box_predicate("UCX_wall"));
        assert!(default_box_predicate("building_collision"));
        assert!(default_box_predicate("Lobby_Collision"));
        assert!(!default_box_predicate("ucx_wall"));
        assert!(!default_box_predicate("COLLISION"));
        assert!(!default_box_predicate("facade"));
    }

    #[test]
    fn test_default_trimesh_predicate() {
        assert!(default_trimesh_predicate("Hills_01"));
        assert!(default_trimesh_predicate("ROCK"));
        assert!(default_trimesh_predicate("stone_wall"));
        assert!(default_trimesh_predicate("Playground"));
        assert!(!default_trimesh_predicate("bench"));
    }

    #[test]
    fn test_box_count_matches_predicate() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(SceneNode::new("city"));
        graph.add_child(root, helper("UCX_a", 0.0)).unwrap();
        graph.add_child(root, helper("UCX_b", 5.0)).unwrap();
        graph.add_child(root, helper("lamp", 10.0)).unwrap();
        let mut world = PhysicsWorld::new();

        let count = create_box_colliders_from_scene(&mut world, &graph, root, default_box_predicate, "city");

        assert_eq!(count, 2);
        assert_eq!(world.count_with_prefix("city"), 2);
        assert!(world.find_by_name("city-0").is_some());
        assert!(world.find_by_name("city-1").is_some());
    }

    #[test]
    fn test_zero_matches_is_silent() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(SceneNode::new("interior"));
        let mut world = PhysicsWorld::new();

        let count = create_box_colliders_from_scene(&mut world, &graph, root, |_| false, "interior");

        assert_eq!(count, 0);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_helper_box_uses_world_bounds() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(
            SceneNode::new("hotel").with_transform(Transform::from_translation(Vector3::new(100.0, 0.0, 0.0))),
        );
        graph.add_child(root, helper("UCX_lobby", 0.0)).unwrap();
        let mut world = PhysicsWorld::new();

        create_box_colliders_from_scene(&mut world, &graph, root, default_box_predicate, "hotel");

        let key = world.find_by_name("hotel-0").unwrap();
        assert_eq!(world.body_translation(key), Some(Vector3::new(100.0, 1.0, 0.0)));
        let body = world.get(key).unwrap();
        assert_eq!(body.kind, BodyKind::Fixed);
        assert_eq!(body.shape, ShapeKind::Cuboid);
        assert_eq!(body.filter, CollisionFilter::TERRAIN);
    }

    #[test]
    fn test_trimesh_extraction() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(SceneNode::new("city"));
        graph
            .add_child(root, SceneNode::new("Hills").with_mesh(TriMesh::hill(10.0, 3.0, 8)))
            .unwrap();
        graph.add_child(root, SceneNode::new("rock_empty")).unwrap();
        let mut world = PhysicsWorld::new();

        let count = create_trimesh_colliders_from_scene(
            &mut world,
            &graph,
            root,
            default_trimesh_predicate,
            "city-hills",
        );

        // The geometry-less rock is skipped
        assert_eq!(count, 1);
        let body = world.get(world.find_by_name("city-hills-0").unwrap()).unwrap();
        assert_eq!(body.shape, ShapeKind::TriMesh);
        assert_eq!(body.filter, CollisionFilter::TRIMESH);
    }

    #[test]
    fn test_nested_trimesh_matches_do_not_duplicate_geometry() {
        let mut graph = SceneGraph::new();
        let rocks = graph.add_root(SceneNode::new("Rocks"));
        for (i, x) in [-4.0, 4.0].into_iter().enumerate() {
            graph
                .add_child(
                    rocks,
                    SceneNode::new(format!("Rock_0{}", i + 1))
                        .with_transform(Transform::from_translation(Vector3::new(x, 0.0, 0.0)))
                        .with_mesh(TriMesh::cuboid(Vector3::new(2.0, 2.0, 2.0))),
                )
                .unwrap();
        }
        let mut world = PhysicsWorld::new();

        let report = ColliderExtractor::new()
            .with_rule(ColliderRule::trimeshes(default_trimesh_predicate))
            .extract(&graph, rocks, &mut world, "quarry");

        // The bare group has no triangles of its own
        assert_eq!(report, ExtractionReport { boxes: 0, trimeshes: 2, skipped: 1 });
        let (shapes, _) = DebugVisualizer::collect(&world);
        let triangles: usize = shapes.iter().map(|shape| shape.indices.len()).sum();
        assert_eq!(triangles, 24);
    }

    #[test]
    fn test_group_trimesh_uses_own_mesh_only() {
        let mut graph = SceneGraph::new();
        let rocks = graph.add_root(SceneNode::new("rocks").with_mesh(TriMesh::hill(3.0, 1.0, 6)));
        graph
            .add_child(rocks, SceneNode::new("rock_small").with_mesh(TriMesh::hill(1.0, 0.5, 4)))
            .unwrap();
        let mut world = PhysicsWorld::new();

        let count = create_trimesh_colliders_from_scene(&mut world, &graph, rocks, default_trimesh_predicate, "yard");

        assert_eq!(count, 2);
        let (shapes, _) = DebugVisualizer::collect(&world);
        let triangles: usize = shapes.iter().map(|shape| shape.indices.len()).sum();
        assert_eq!(triangles, 10);
    }

    #[test]
    fn test_out_of_range_indices_do_not_panic() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(
            SceneNode::new("Building_Collision").with_mesh(TriMesh::cuboid(Vector3::new(4.0, 4.0, 4.0))),
        );
        graph
            .add_child(
                root,
                SceneNode::new("cliff").with_mesh(TriMesh::new(
                    vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0)],
                    vec![[u32::MAX, 0, 1]],
                )),
            )
            .unwrap();
        let mut world = PhysicsWorld::new();

        let report = ColliderExtractor::with_default_rules().extract(&graph, root, &mut world, "block");

        // The building box survives, the cliff has no valid triangles
        assert_eq!(report, ExtractionReport { boxes: 1, trimeshes: 0, skipped: 1 });
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(SceneNode::new("map"));
        graph
            .add_child(
                root,
                SceneNode::new("rock_collision").with_mesh(TriMesh::cuboid(Vector3::new(1.0, 1.0, 1.0))),
            )
            .unwrap();
        graph
            .add_child(root, SceneNode::new("rock").with_mesh(TriMesh::hill(1.0, 1.0, 5)))
            .unwrap();
        let mut world = PhysicsWorld::new();

        let report = ColliderExtractor::with_default_rules().extract(&graph, root, &mut world, "map");

        assert_eq!(report, ExtractionReport { boxes: 1, trimeshes: 1, skipped: 0 });
        assert_eq!(world.get(world.find_by_name("map-0").unwrap()).unwrap().shape, ShapeKind::Cuboid);
        assert_eq!(world.get(world.find_by_name("map-1").unwrap()).unwrap().shape, ShapeKind::TriMesh);
    }

    #[test]
    fn test_extract_all_keeps_names_unique() {
        let mut graph = SceneGraph::new();
        graph.add_root(helper("UCX_a", 0.0));
        graph.add_root(helper("UCX_b", 5.0));
        let mut world = PhysicsWorld::new();

        let report = ColliderExtractor::with_default_rules().extract_all(&graph, &mut world, "city");

        assert_eq!(report.boxes, 2);
        assert!(world.find_by_name("city-0").is_some());
        assert!(world.find_by_name("city-1").is_some());
    }

    #[test]
    fn test_custom_rule_table() {
        let mut graph = SceneGraph::new();
        let root = graph.add_root(SceneNode::new("bank"));
        graph.add_child(root, helper("vault_door", 0.0)).unwrap();
        let mut world = PhysicsWorld::new();

        let extractor = ColliderExtractor::new().with_rule(ColliderRule::boxes(|name| name.starts_with("vault")));
        let report = extractor.extract(&graph, root, &mut world, "bank");

        assert_eq!(report.boxes, 1);
        assert_eq!(extractor.rules().len(), 1);
        assert_eq!(extractor.rules()[0].kind(), ColliderKind::Box);
    }

    #[test]
    fn test_flat_helper_is_padded() {
        let mut world = PhysicsWorld::new();
        let key = create_box_collider(&mut world, Vector3::zeros(), Vector3::new(4.0, 0.0, 4.0), "city-floor").unwrap();
        assert!(world.get(key).is_some());
    }

    #[test]
    fn test_create_box_collider() {
        let mut world = PhysicsWorld::new();
        let key = create_box_collider(
            &mut world,
            Vector3::new(3.0, 4.0, 5.0),
            Vector3::new(10.0, 8.0, 10.0),
            "hotel-humboldt",
        )
        .unwrap();

        assert_eq!(world.body_translation(key), Some(Vector3::new(3.0, 4.0, 5.0)));
        assert_eq!(world.count_with_prefix("hotel-"), 1);
    }

    #[test]
    fn test_node_position() {
        let mut graph = SceneGraph::new();
        let key = graph.add_root(helper("spawn", 7.0));
        assert_eq!(node_position(&graph, key), Some(Point3::new(7.0, 1.0, 0.0)));
    }
}
