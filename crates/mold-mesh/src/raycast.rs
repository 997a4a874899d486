//! Ray-surface queries.
//!
//! [`cast_ray`] tests every triangle; [`RayCaster`] answers the same query
//! through a bounding volume hierarchy built once per mesh. Both return the
//! closest hit strictly in front of the origin.

use nalgebra::{Point3, Vector3};

use crate::{Mesh, Triangle};

/// Determinant threshold below which a ray counts as parallel to a triangle.
const PARALLEL_EPSILON: f64 = 1e-12;

/// Minimum hit distance; rejects self-hits at the origin.
const MIN_DISTANCE: f64 = 1e-9;

/// Slack on the barycentric test so rays through a shared edge hit one of
/// its two triangles despite rounding.
const EDGE_TOLERANCE: f64 = 1e-10;

/// Padding applied to node boxes so flat triangles still have volume.
const AABB_PADDING: f64 = 1e-7;

/// Triangles per BVH leaf.
const MAX_LEAF_SIZE: usize = 4;

/// The closest intersection of a ray with a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space intersection point.
    pub point: Point3<f64>,
    /// Distance along the (normalized) ray direction.
    pub distance: f64,
    /// Index of the intersected face.
    pub face: usize,
    /// Interpolated vertex normal when the mesh has normals, else the face normal.
    pub normal: Vector3<f64>,
}

/// Cast a ray against every triangle of `mesh`.
///
/// `direction` need not be normalized. Returns `None` when nothing is hit
/// within `max_distance`.
pub fn cast_ray(
    mesh: &Mesh,
    origin: Point3<f64>,
    direction: Vector3<f64>,
    max_distance: f64,
) -> Option<RayHit> {
    let dir = normalized(direction)?;
    let mut best: Option<(f64, f64, f64, usize)> = None;

    for (face, tri) in mesh.triangles().enumerate() {
        if let Some((t, u, v)) = ray_triangle_intersect(&origin, &dir, &tri)
            && t <= max_distance
            && best.is_none_or(|(bt, ..)| t < bt)
        {
            best = Some((t, u, v, face));
        }
    }

    best.map(|(t, u, v, face)| make_hit(mesh, &origin, &dir, t, u, v, face))
}

/// Axis-aligned bounding box for spatial acceleration.
#[derive(Debug, Clone, Copy)]
struct Aabb {
    min: Point3<f64>,
    max: Point3<f64>,
}

impl Aabb {
    fn from_triangle(tri: &Triangle) -> Self {
        Self {
            min: tri.v0.inf(&tri.v1).inf(&tri.v2),
            max: tri.v0.sup(&tri.v1).sup(&tri.v2),
        }
    }

    fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    fn expand(&self, epsilon: f64) -> Self {
        let pad = Vector3::repeat(epsilon);
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// Slab test. Returns the entry distance, clamped to zero.
    fn ray_intersect(&self, origin: &Point3<f64>, dir_inv: &Vector3<f64>) -> Option<f64> {
        let t1 = (self.min - origin).component_mul(dir_inv);
        let t2 = (self.max - origin).component_mul(dir_inv);

        let t_min = t1.x.min(t2.x).max(t1.y.min(t2.y)).max(t1.z.min(t2.z));
        let t_max = t1.x.max(t2.x).min(t1.y.max(t2.y)).min(t1.z.max(t2.z));

        if t_max >= t_min && t_max >= 0.0 {
            Some(t_min.max(0.0))
        } else {
            None
        }
    }
}

/// BVH node. Leaves reference a contiguous run of `RayCaster::order`.
#[derive(Debug)]
enum BvhNode {
    Leaf {
        aabb: Aabb,
        start: usize,
        len: usize,
    },
    Internal {
        aabb: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn build(triangles: &[Triangle], order: &mut [usize], start: usize) -> Self {
        let aabb = order
            .iter()
            .map(|&i| Aabb::from_triangle(&triangles[i]))
            .reduce(|a, b| a.union(&b))
            .unwrap_or(Aabb {
                min: Point3::origin(),
                max: Point3::origin(),
            })
            .expand(AABB_PADDING);

        if order.len() <= MAX_LEAF_SIZE {
            return BvhNode::Leaf {
                aabb,
                start,
                len: order.len(),
            };
        }

        // Split at the median centroid along the longest axis.
        let extent = aabb.max - aabb.min;
        let axis = extent.imax();
        let mid = order.len() / 2;
        order.select_nth_unstable_by(mid, |&a, &b| {
            let ca = triangles[a].centroid()[axis];
            let cb = triangles[b].centroid()[axis];
            ca.total_cmp(&cb)
        });

        let (left, right) = order.split_at_mut(mid);
        BvhNode::Internal {
            aabb,
            left: Box::new(BvhNode::build(triangles, left, start)),
            right: Box::new(BvhNode::build(triangles, right, start + mid)),
        }
    }

    fn aabb(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { aabb, .. } | BvhNode::Internal { aabb, .. } => aabb,
        }
    }
}

/// Accelerated ray queries against one immutable mesh.
///
/// Cheap to share across threads; sampling hands one `&RayCaster` to every
/// rayon worker.
#[derive(Debug)]
pub struct RayCaster<'a> {
    mesh: &'a Mesh,
    triangles: Vec<Triangle>,
    order: Vec<usize>,
    root: Option<BvhNode>,
}

impl<'a> RayCaster<'a> {
    /// Build the hierarchy for `mesh`.
    pub fn new(mesh: &'a Mesh) -> Self {
        let triangles: Vec<Triangle> = mesh.triangles().collect();
        let mut order: Vec<usize> = (0..triangles.len()).collect();
        let root = if triangles.is_empty() {
            None
        } else {
            Some(BvhNode::build(&triangles, &mut order, 0))
        };

        tracing::debug!(triangles = triangles.len(), "Built ray query hierarchy");

        Self {
            mesh,
            triangles,
            order,
            root,
        }
    }

    /// The mesh this caster answers queries for.
    pub fn mesh(&self) -> &'a Mesh {
        self.mesh
    }

    /// Closest hit within `max_distance`. Same contract as [`cast_ray`].
    pub fn cast(
        &self,
        origin: Point3<f64>,
        direction: Vector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit> {
        let root = self.root.as_ref()?;
        let dir = normalized(direction)?;
        let dir_inv = dir.map(|c| if c.abs() > 1e-12 { 1.0 / c } else { f64::MAX });

        let mut best: Option<(f64, f64, f64, usize)> = None;
        self.trace(root, &origin, &dir, &dir_inv, max_distance, &mut best);

        best.map(|(t, u, v, face)| make_hit(self.mesh, &origin, &dir, t, u, v, face))
    }

    fn trace(
        &self,
        node: &BvhNode,
        origin: &Point3<f64>,
        dir: &Vector3<f64>,
        dir_inv: &Vector3<f64>,
        max_distance: f64,
        best: &mut Option<(f64, f64, f64, usize)>,
    ) {
        let limit = best.map_or(max_distance, |(t, ..)| t);
        match node.aabb().ray_intersect(origin, dir_inv) {
            Some(t_near) if t_near <= limit => {}
            _ => return,
        }

        match node {
            BvhNode::Leaf { start, len, .. } => {
                for &face in &self.order[*start..*start + *len] {
                    if let Some((t, u, v)) =
                        ray_triangle_intersect(origin, dir, &self.triangles[face])
                        && t <= max_distance
                        && best.is_none_or(|(bt, ..)| t < bt)
                    {
                        *best = Some((t, u, v, face));
                    }
                }
            }
            BvhNode::Internal { left, right, .. } => {
                self.trace(left, origin, dir, dir_inv, max_distance, best);
                self.trace(right, origin, dir, dir_inv, max_distance, best);
            }
        }
    }
}

/// Möller–Trumbore ray-triangle intersection.
/// Returns `(t, u, v)` where `u`, `v` are barycentric weights of `v1`, `v2`.
fn ray_triangle_intersect(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    tri: &Triangle,
) -> Option<(f64, f64, f64)> {
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;

    let h = direction.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < PARALLEL_EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - tri.v0;
    let u = f * s.dot(&h);
    if !(-EDGE_TOLERANCE..=1.0 + EDGE_TOLERANCE).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * direction.dot(&q);
    if v < -EDGE_TOLERANCE || u + v > 1.0 + EDGE_TOLERANCE {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > MIN_DISTANCE).then_some((t, u, v))
}

fn normalized(v: Vector3<f64>) -> Option<Vector3<f64>> {
    let len = v.norm();
    (len > f64::EPSILON).then(|| v / len)
}

fn make_hit(
    mesh: &Mesh,
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    t: f64,
    u: f64,
    v: f64,
    face: usize,
) -> RayHit {
    let [i0, i1, i2] = mesh.faces[face];
    let (a, b, c) = (
        &mesh.vertices[i0 as usize],
        &mesh.vertices[i1 as usize],
        &mesh.vertices[i2 as usize],
    );

    let face_normal = || {
        Triangle::new(a.position, b.position, c.position)
            .normal()
            .unwrap_or_else(|| -dir)
    };
    let normal = match (a.normal, b.normal, c.normal) {
        (Some(na), Some(nb), Some(nc)) => {
            let n = na * (1.0 - u - v) + nb * u + nc * v;
            normalized(n).unwrap_or_else(face_normal)
        }
        _ => face_normal(),
    };

    RayHit {
        point: origin + dir * t,
        distance: t,
        face,
        normal,
    }
}
