//! End-to-end tests: write a vessel to disk, load it back, query it.

use mold_mesh::{Mesh, RayCaster, Vertex, validate_input};
use nalgebra::{Point3, Vector3};
use std::f64::consts::TAU;
use std::io::Write;
use tempfile::NamedTempFile;

/// Closed cylinder along Y with outward winding.
fn cylinder(radius: f64, height: f64, segments: usize) -> Mesh {
    let mut mesh = Mesh::new();
    for &y in &[0.0, height] {
        for j in 0..segments {
            let theta = TAU * j as f64 / segments as f64;
            mesh.vertices
                .push(Vertex::from_coords(radius * theta.cos(), y, radius * theta.sin()));
        }
    }
    let bottom = mesh.push_vertex(Point3::new(0.0, 0.0, 0.0));
    let top = mesh.push_vertex(Point3::new(0.0, height, 0.0));

    let n = segments as u32;
    for j in 0..n {
        let k = (j + 1) % n;
        let (a, b, c, d) = (j, k, n + k, n + j);
        mesh.push_face(a, c, b);
        mesh.push_face(a, d, c);
        mesh.push_face(bottom, j, k);
        mesh.push_face(top, n + k, n + j);
    }
    mesh
}

#[test]
fn cylinder_is_closed_and_outward() {
    let mesh = cylinder(40.0, 100.0, 64);
    let report = mesh.validate();
    assert!(report.is_printable(), "{}", report);
    assert!(validate_input(&mesh).is_clean());
}

#[test]
fn stl_save_load_then_raycast() {
    let mesh = cylinder(40.0, 100.0, 128);
    let file = NamedTempFile::with_suffix(".stl").unwrap();
    mesh.save(file.path()).expect("save");

    let loaded = Mesh::load(file.path()).expect("load");
    assert_eq!(loaded.face_count(), mesh.face_count());

    let caster = RayCaster::new(&loaded);
    for k in 0..32 {
        let theta = TAU * (k as f64 + 0.3) / 32.0;
        let origin = Point3::new(160.0 * theta.cos(), 50.0, 160.0 * theta.sin());
        let hit = caster
            .cast(origin, Vector3::new(-theta.cos(), 0.0, -theta.sin()), 320.0)
            .expect("ray toward the axis must hit the wall");
        let r = (hit.point.x.powi(2) + hit.point.z.powi(2)).sqrt();
        assert!((r - 40.0).abs() < 0.1, "radius {} at angle {}", r, theta);
        // outward facing wall
        assert!(hit.normal.dot(&Vector3::new(theta.cos(), 0.0, theta.sin())) > 0.9);
    }
}

#[test]
fn upward_ray_hits_bottom_cap() {
    let mesh = cylinder(40.0, 100.0, 64);
    let caster = RayCaster::new(&mesh);
    let hit = caster
        .cast(Point3::new(10.0, -50.0, 5.0), Vector3::y(), 200.0)
        .expect("hit bottom");
    assert!(hit.point.y.abs() < 1e-9);
    assert!((hit.distance - 50.0).abs() < 1e-9);
    assert!(hit.normal.y < -0.99);
}

#[test]
fn obj_with_normals_loads() {
    let mut file = NamedTempFile::with_suffix(".obj").unwrap();
    writeln!(file, "v 0 0 0\nv 10 0 0\nv 0 0 10\nv 0 10 0").unwrap();
    writeln!(file, "vn 0 -1 0\nvn 0 -1 0\nvn 0 -1 0\nvn 0 1 0").unwrap();
    writeln!(file, "f 1//1 2//2 3//3\nf 1//1 4//4 2//2\nf 1//1 3//3 4//4\nf 2//2 4//4 3//3").unwrap();
    file.flush().unwrap();

    let mesh = Mesh::load(file.path()).expect("load");
    assert_eq!(mesh.face_count(), 4);
    assert!(mesh.has_normals());
}
