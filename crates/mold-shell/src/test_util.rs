//! Vessel meshes and ray helpers shared by the unit and integration tests.

use std::f64::consts::TAU;

use mold_mesh::{Mesh, RayCaster, Vertex};
use nalgebra::{Point3, Vector3};

/// Closed surface of revolution around Y through `(radius, y)` points listed
/// bottom to top, capped at both ends.
pub(crate) fn lathe(outline: &[(f64, f64)], segments: usize) -> Mesh {
    let mut mesh = Mesh::new();
    for &(r, y) in outline {
        for j in 0..segments {
            let theta = TAU * j as f64 / segments as f64;
            mesh.vertices
                .push(Vertex::from_coords(r * theta.cos(), y, r * theta.sin()));
        }
    }
    let bottom = mesh.push_vertex(Point3::new(0.0, outline[0].1, 0.0));
    let top = mesh.push_vertex(Point3::new(0.0, outline[outline.len() - 1].1, 0.0));

    let n = segments as u32;
    let last = (outline.len() as u32 - 1) * n;
    for j in 0..n {
        let k = (j + 1) % n;
        for i in 0..outline.len() as u32 - 1 {
            let (a, b) = (i * n + j, i * n + k);
            let (c, d) = (b + n, a + n);
            mesh.push_face(a, c, b);
            mesh.push_face(a, d, c);
        }
        mesh.push_face(bottom, j, k);
        mesh.push_face(top, last + k, last + j);
    }
    mesh
}

/// Closed cylinder standing on `y = 0`.
pub(crate) fn cylinder(radius: f64, height: f64, segments: usize) -> Mesh {
    lathe(&[(radius, 0.0), (radius, height)], segments)
}

/// Distances along a ray to every surface of `mesh` it crosses, nearest first.
pub(crate) fn ray_crossings(mesh: &Mesh, origin: Point3<f64>, direction: Vector3<f64>) -> Vec<f64> {
    let caster = RayCaster::new(mesh);
    let dir = direction.normalize();
    let mut crossings: Vec<f64> = Vec::new();
    let mut travelled = 0.0;
    while let Some(hit) = caster.cast(origin + dir * travelled, dir, 1e4) {
        let at = travelled + hit.distance;
        // a ray through a shared edge reports both faces
        if crossings.last().is_none_or(|&last| at - last > 1e-6) {
            crossings.push(at);
        }
        travelled = at + 1e-7;
        if crossings.len() > 64 {
            break;
        }
    }
    crossings
}
