//! Triangle meshes and axis-aligned bounds

use nalgebra::{Matrix4, Point3, Vector3};

/// Indexed triangle mesh in node-local space
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriMesh {
    pub vertices: Vec<Point3<f32>>,
    pub indices: Vec<[u32; 3]>,
}

impl TriMesh {
    pub fn new(vertices: Vec<Point3<f32>>, indices: Vec<[u32; 3]>) -> Self {
        Self { vertices, indices }
    }

    /// Closed box centered on the origin
    pub fn cuboid(size: Vector3<f32>) -> Self {
        let h = size * 0.5;
        let vertices = vec![
            Point3::new(-h.x, -h.y, -h.z),
            Point3::new(h.x, -h.y, -h.z),
            Point3::new(h.x, h.y, -h.z),
            Point3::new(-h.x, h.y, -h.z),
            Point3::new(-h.x, -h.y, h.z),
            Point3::new(h.x, -h.y, h.z),
            Point3::new(h.x, h.y, h.z),
            Point3::new(-h.x, h.y, h.z),
        ];
        let indices = vec![
            [0, 2, 1], [0, 3, 2], // -Z
            [4, 5, 6], [4, 6, 7], // +Z
            [0, 1, 5], [0, 5, 4], // -Y
            [3, 6, 2], [3, 7, 6], // +Y
            [0, 4, 7], [0, 7, 3], // -X
            [1, 2, 6], [1, 6, 5], // +X
        ];
        Self { vertices, indices }
    }

    /// Cone-shaped mound: apex at `height`, base ring on y = 0
    pub fn hill(radius: f32, height: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let mut vertices = Vec::with_capacity(segments as usize + 1);
        vertices.push(Point3::new(0.0, height, 0.0));
        for i in 0..segments {
            let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
            vertices.push(Point3::new(radius * angle.cos(), 0.0, radius * angle.sin()));
        }

        let indices = (0..segments)
            .map(|i| {
                let a = 1 + i;
                let b = 1 + (i + 1) % segments;
                [0, b, a]
            })
            .collect();
        Self { vertices, indices }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Copy of this mesh with every vertex multiplied by `matrix`
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        Self {
            vertices: self
                .vertices
                .iter()
                .map(|v| matrix.transform_point(v))
                .collect(),
            indices: self.indices.clone(),
        }
    }

    /// Whether every index of `triangle` points at an existing vertex
    pub fn is_valid_triangle(&self, triangle: &[u32; 3]) -> bool {
        triangle.iter().all(|&i| (i as usize) < self.vertices.len())
    }

    /// Append another mesh, re-basing its indices
    ///
    /// Triangles of `other` with out-of-range indices are dropped.
    pub fn append(&mut self, other: &TriMesh) {
        let Ok(base) = u32::try_from(self.vertices.len()) else {
            return;
        };
        let rebased: Vec<[u32; 3]> = other
            .indices
            .iter()
            .filter(|triangle| other.is_valid_triangle(triangle))
            .filter_map(|[a, b, c]| {
                Some([a.checked_add(base)?, b.checked_add(base)?, c.checked_add(base)?])
            })
            .collect();

        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(rebased);
    }
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    /// Bounds of a point set, `None` if empty
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = *points.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in points {
            bounds.include(p);
        }
        Some(bounds)
    }

    /// Grow to contain `p`
    pub fn include(&mut self, p: &Point3<f32>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn merge(&mut self, other: &Bounds) {
        self.include(&other.min);
        self.include(&other.max);
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn is_finite(&self) -> bool {
        self.min.coords.iter().chain(self.max.coords.iter()).all(|c| c.is_finite())
    }
}
