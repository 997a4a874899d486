//! Core mesh data types.

use nalgebra::{Point3, Vector3};

/// A vertex with a position and an optional unit normal.
///
/// Coordinates are in millimeters. The vessel axis is +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,

    /// Unit normal vector, if the source supplied or computed one.
    pub normal: Option<Vector3<f64>>,
}

impl Vertex {
    /// Create a new vertex with only position set.
    #[inline]
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            normal: None,
        }
    }

    /// Create a vertex from raw coordinates.
    #[inline]
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Create a vertex with a position and a normal.
    #[inline]
    pub fn with_normal(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            normal: Some(normal),
        }
    }
}

/// A triangle mesh with indexed vertices and faces.
///
/// Built once and then treated as an immutable value: builders return owned
/// meshes and the caller decides what to do with them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    /// Each face is [v0, v1, v2] with counter-clockwise winding seen from outside.
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Number of vertices in the mesh.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (triangles) in the mesh.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if mesh is empty (no vertices or faces).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Push a vertex and return its index.
    #[inline]
    pub fn push_vertex(&mut self, position: Point3<f64>) -> u32 {
        self.vertices.push(Vertex::new(position));
        (self.vertices.len() - 1) as u32
    }

    /// Push a triangle by vertex indices.
    #[inline]
    pub fn push_face(&mut self, a: u32, b: u32, c: u32) {
        self.faces.push([a, b, c]);
    }

    /// Whether every vertex carries a normal.
    pub fn has_normals(&self) -> bool {
        !self.vertices.is_empty() && self.vertices.iter().all(|v| v.normal.is_some())
    }

    /// Compute the axis-aligned bounding box, or `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices.iter().map(|v| v.position))
    }

    /// Iterate over triangles, yielding Triangle structs with actual vertex data.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        })
    }

    /// Get a specific triangle by face index.
    pub fn triangle(&self, face_idx: usize) -> Option<Triangle> {
        self.faces.get(face_idx).map(|&[i0, i1, i2]| Triangle {
            v0: self.vertices[i0 as usize].position,
            v1: self.vertices[i1 as usize].position,
            v2: self.vertices[i2 as usize].position,
        })
    }

    /// Append another mesh's vertices and faces, re-indexing its faces.
    pub fn append(&mut self, other: &Mesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|&[a, b, c]| [a + base, b + base, c + base]),
        );
    }

    /// Translate mesh by the given vector.
    pub fn translate(&mut self, offset: Vector3<f64>) {
        for vertex in &mut self.vertices {
            vertex.position += offset;
        }
    }

    /// Move the mesh so the center of its XZ bounding box lies on the Y axis.
    ///
    /// Returns the applied offset (zero for an empty mesh).
    pub fn center_on_y_axis(&mut self) -> Vector3<f64> {
        let Some(bounds) = self.bounds() else {
            return Vector3::zeros();
        };
        let center = bounds.center();
        let offset = Vector3::new(-center.x, 0.0, -center.z);
        self.translate(offset);
        offset
    }

    /// Compute the signed volume of the mesh.
    ///
    /// Sum of signed tetrahedra formed by each face and the origin. Positive
    /// for a closed mesh whose faces wind counter-clockwise seen from outside.
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|tri| tri.v0.coords.dot(&tri.v1.coords.cross(&tri.v2.coords)))
            .sum::<f64>()
            / 6.0
    }

    /// Absolute enclosed volume. Only meaningful for closed meshes.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.triangles().map(|tri| tri.area()).sum()
    }
}

/// Axis-aligned bounding box. `min <= max` holds componentwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    /// Build a box from two corners in any order.
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Smallest box containing all points, or `None` when there are none.
    pub fn from_points(points: impl IntoIterator<Item = Point3<f64>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.include(p);
        }
        Some(bounds)
    }

    /// Grow the box to contain `p`.
    pub fn include(&mut self, p: Point3<f64>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    #[inline]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Height along the vessel axis.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Largest absolute X or Z coordinate; bounds the distance of any vertex
    /// from the Y axis up to a factor of sqrt(2).
    pub fn max_xz_extent(&self) -> f64 {
        self.min
            .x
            .abs()
            .max(self.max.x.abs())
            .max(self.min.z.abs())
            .max(self.max.z.abs())
    }
}

/// A triangle with concrete vertex positions.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle from three points.
    #[inline]
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Unnormalized face normal (right-hand rule with CCW winding).
    #[inline]
    pub fn normal_unnormalized(&self) -> Vector3<f64> {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Unit face normal, or `None` for degenerate triangles.
    pub fn normal(&self) -> Option<Vector3<f64>> {
        let n = self.normal_unnormalized();
        let len_sq = n.norm_squared();
        if len_sq > f64::EPSILON * f64::EPSILON {
            Some(n / len_sq.sqrt())
        } else {
            None
        }
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.normal_unnormalized().norm() * 0.5
    }

    #[inline]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Check if the triangle is degenerate (zero or near-zero area).
    pub fn is_degenerate(&self, epsilon: f64) -> bool {
        self.area() < epsilon
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    /// Unit cube with outward-facing CCW winding, (0,0,0) to (1,1,1).
    pub(crate) fn make_unit_cube() -> Mesh {
        let mut mesh = Mesh::new();
        for &(x, y, z) in &[
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (1.0, 1.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
            (1.0, 0.0, 1.0),
            (1.0, 1.0, 1.0),
            (0.0, 1.0, 1.0),
        ] {
            mesh.vertices.push(Vertex::from_coords(x, y, z));
        }
        mesh.faces.extend_from_slice(&[
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [3, 7, 6],
            [3, 6, 2],
            [0, 4, 7],
            [0, 7, 3],
            [1, 2, 6],
            [1, 6, 5],
        ]);
        mesh
    }

    #[test]
    fn test_triangle_normal() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let normal = tri.normal().expect("non-degenerate triangle");
        assert!(approx_eq(normal.z, 1.0));
        assert!(approx_eq(tri.area(), 0.5));
    }

    #[test]
    fn test_degenerate_triangle_normal() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        );
        assert!(tri.normal().is_none());
        assert!(tri.is_degenerate(1e-12));
    }

    #[test]
    fn test_bounding_box_normalizes_corners() {
        let b = BoundingBox::new(Point3::new(3.0, -1.0, 2.0), Point3::new(-3.0, 4.0, -2.0));
        assert_eq!(b.min, Point3::new(-3.0, -1.0, -2.0));
        assert_eq!(b.max, Point3::new(3.0, 4.0, 2.0));
        assert!(approx_eq(b.height(), 5.0));
        assert!(approx_eq(b.max_xz_extent(), 3.0));
    }

    #[test]
    fn test_mesh_bounds() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(10.0, 5.0, 3.0));
        mesh.vertices.push(Vertex::from_coords(-2.0, 8.0, 1.0));

        let b = mesh.bounds().expect("non-empty mesh");
        assert_eq!(b.min, Point3::new(-2.0, 0.0, 0.0));
        assert_eq!(b.max, Point3::new(10.0, 8.0, 3.0));
        assert!(Mesh::new().bounds().is_none());
    }

    #[test]
    fn test_append_reindexes_faces() {
        let mut a = make_unit_cube();
        let b = make_unit_cube();
        a.append(&b);
        assert_eq!(a.vertex_count(), 16);
        assert_eq!(a.face_count(), 24);
        assert_eq!(a.faces[12], [8, 10, 9]);
        assert!(approx_eq(a.signed_volume(), 2.0));
    }

    #[test]
    fn test_signed_volume_unit_cube() {
        let mesh = make_unit_cube();
        assert!(approx_eq(mesh.signed_volume(), 1.0));
        assert!(approx_eq(mesh.surface_area(), 6.0));
    }

    #[test]
    fn test_signed_volume_inverted_cube() {
        let mut mesh = make_unit_cube();
        for face in &mut mesh.faces {
            face.swap(1, 2);
        }
        assert!(approx_eq(mesh.signed_volume(), -1.0));
    }

    #[test]
    fn test_center_on_y_axis() {
        let mut mesh = make_unit_cube();
        mesh.translate(Vector3::new(10.0, 20.0, -5.0));
        let offset = mesh.center_on_y_axis();
        assert!(approx_eq(offset.x, -10.5));
        assert!(approx_eq(offset.y, 0.0));
        assert!(approx_eq(offset.z, 4.5));
        let b = mesh.bounds().expect("bounds");
        assert!(approx_eq(b.center().x, 0.0));
        assert!(approx_eq(b.center().z, 0.0));
        assert!(approx_eq(b.min.y, 20.0));
    }

    #[test]
    fn test_has_normals() {
        let mut mesh = make_unit_cube();
        assert!(!mesh.has_normals());
        for v in &mut mesh.vertices {
            v.normal = Some(Vector3::y());
        }
        assert!(mesh.has_normals());
    }
}
