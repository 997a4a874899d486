//! Index-buffer helpers shared by the shell builders.
//!
//! Orientation follows from argument order, so callers pick the order that
//! makes the face normal point out of the printed material:
//!
//! - [`stitch`] joins two polylines `r1`, `r2` with quads whose normal is
//!   `along(r1) × (r2 − r1)`. Swapping the two flips every face.
//! - [`fan`] joins a center vertex to a polyline with triangles whose normal
//!   is `(p[j] − center) × (p[j+1] − center)`; `flip` reverses it.

use mold_mesh::Mesh;
use nalgebra::Point3;

/// Push every point as a vertex and return the new indices.
pub fn push_ring(mesh: &mut Mesh, points: impl IntoIterator<Item = Point3<f64>>) -> Vec<u32> {
    points.into_iter().map(|p| mesh.push_vertex(p)).collect()
}

/// Join two polylines of equal length with two triangles per segment.
///
/// With `closed` set the last vertex also connects back to the first.
pub fn stitch(mesh: &mut Mesh, r1: &[u32], r2: &[u32], closed: bool) {
    debug_assert_eq!(r1.len(), r2.len());
    let n = r1.len().min(r2.len());
    let segments = if closed { n } else { n.saturating_sub(1) };
    for j in 0..segments {
        let k = (j + 1) % n;
        mesh.push_face(r1[j], r1[k], r2[k]);
        mesh.push_face(r1[j], r2[k], r2[j]);
    }
}

/// Join a single vertex to a polyline.
pub fn fan(mesh: &mut Mesh, center: u32, ring: &[u32], closed: bool, flip: bool) {
    let n = ring.len();
    let segments = if closed { n } else { n.saturating_sub(1) };
    for j in 0..segments {
        let k = (j + 1) % n;
        if flip {
            mesh.push_face(center, ring[k], ring[j]);
        } else {
            mesh.push_face(center, ring[j], ring[k]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mold_mesh::validate_mesh;
    use std::f64::consts::TAU;

    fn circle(mesh: &mut Mesh, radius: f64, y: f64, n: usize) -> Vec<u32> {
        push_ring(
            mesh,
            (0..n).map(|j| {
                let theta = TAU * j as f64 / n as f64;
                Point3::new(radius * theta.cos(), y, radius * theta.sin())
            }),
        )
    }

    #[test]
    fn test_stitch_counts() {
        let mut mesh = Mesh::new();
        let a = circle(&mut mesh, 1.0, 0.0, 8);
        let b = circle(&mut mesh, 1.0, 1.0, 8);
        stitch(&mut mesh, &a, &b, true);
        assert_eq!(mesh.face_count(), 16);

        let mut open = Mesh::new();
        let a = circle(&mut open, 1.0, 0.0, 8);
        let b = circle(&mut open, 1.0, 1.0, 8);
        stitch(&mut open, &a, &b, false);
        assert_eq!(open.face_count(), 14);
    }

    #[test]
    fn test_closed_drum_is_outward() {
        // upper-to-lower stitch faces outward; bottom fan faces down; flipped top fan faces up
        let mut mesh = Mesh::new();
        let bottom = circle(&mut mesh, 10.0, 0.0, 24);
        let top = circle(&mut mesh, 10.0, 5.0, 24);
        let bc = mesh.push_vertex(Point3::new(0.0, 0.0, 0.0));
        let tc = mesh.push_vertex(Point3::new(0.0, 5.0, 0.0));
        stitch(&mut mesh, &top, &bottom, true);
        fan(&mut mesh, bc, &bottom, true, false);
        fan(&mut mesh, tc, &top, true, true);

        let report = validate_mesh(&mesh);
        assert!(report.is_watertight && report.is_manifold, "{}", report);
        assert!(mesh.signed_volume() > 0.0);

        let tri = mesh.triangle(0).unwrap();
        let n = tri.normal().unwrap();
        let c = tri.centroid();
        assert!(n.x * c.x + n.z * c.z > 0.0);
    }

    #[test]
    fn test_swapping_stitch_flips_volume() {
        let build = |swap: bool| {
            let mut mesh = Mesh::new();
            let bottom = circle(&mut mesh, 10.0, 0.0, 12);
            let top = circle(&mut mesh, 10.0, 5.0, 12);
            let bc = mesh.push_vertex(Point3::new(0.0, 0.0, 0.0));
            let tc = mesh.push_vertex(Point3::new(0.0, 5.0, 0.0));
            if swap {
                stitch(&mut mesh, &bottom, &top, true);
            } else {
                stitch(&mut mesh, &top, &bottom, true);
            }
            fan(&mut mesh, bc, &bottom, true, swap);
            fan(&mut mesh, tc, &top, true, !swap);
            mesh.signed_volume()
        };
        let outward = build(false);
        let inward = build(true);
        assert!(outward > 0.0);
        assert!((outward + inward).abs() < 1e-9);
    }
}
