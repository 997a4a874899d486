//! Property-based tests for ray queries and STL encoding.
//!
//! Run with: cargo test -p mold-mesh -- proptest

use mold_mesh::{Mesh, RayCaster, Vertex, cast_ray, write_binary_stl};
use nalgebra::{Point3, Vector3};
use proptest::prelude::*;

/// Generate a random vertex position in a bounded range.
fn arb_position() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(-100.0..100.0f64)
}

/// Random triangle soup with valid indices.
fn arb_mesh(max_vertices: usize, max_faces: usize) -> impl Strategy<Value = Mesh> {
    (3..=max_vertices).prop_flat_map(move |num_vertices| {
        let vertices = prop::collection::vec(
            arb_position().prop_map(|[x, y, z]| Vertex::from_coords(x, y, z)),
            num_vertices,
        );
        vertices.prop_flat_map(move |verts| {
            let n = verts.len() as u32;
            prop::collection::vec(prop::array::uniform3(0..n), 1..=max_faces).prop_map(
                move |faces| Mesh {
                    vertices: verts.clone(),
                    faces,
                },
            )
        })
    })
}

fn arb_ray() -> impl Strategy<Value = (Point3<f64>, Vector3<f64>)> {
    (arb_position(), prop::array::uniform3(-1.0..1.0f64)).prop_filter_map(
        "direction must be non-zero",
        |(o, d)| {
            let dir = Vector3::new(d[0], d[1], d[2]);
            (dir.norm() > 1e-3).then(|| (Point3::new(o[0] * 2.0, o[1] * 2.0, o[2] * 2.0), dir))
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_bvh_matches_brute_force(
        mesh in arb_mesh(40, 60),
        rays in prop::collection::vec(arb_ray(), 1..20),
    ) {
        let caster = RayCaster::new(&mesh);
        for (origin, dir) in rays {
            let fast = caster.cast(origin, dir, 1000.0);
            let slow = cast_ray(&mesh, origin, dir, 1000.0);
            match (fast, slow) {
                (Some(a), Some(b)) => {
                    prop_assert!((a.distance - b.distance).abs() < 1e-9,
                        "bvh {} vs brute {}", a.distance, b.distance);
                    prop_assert!((a.point - b.point).norm() < 1e-6);
                }
                (None, None) => {}
                (a, b) => prop_assert!(false, "bvh {:?} vs brute {:?}", a, b),
            }
        }
    }

    #[test]
    fn proptest_stl_size_and_round_trip(mesh in arb_mesh(20, 30)) {
        let bytes = write_binary_stl(&mesh);
        prop_assert!(bytes.is_ok());
        let bytes = bytes.unwrap();
        prop_assert_eq!(bytes.len(), 84 + 50 * mesh.face_count());

        let read = stl_io::read_stl(&mut std::io::Cursor::new(bytes));
        prop_assert!(read.is_ok());
        let read = read.unwrap();
        prop_assert_eq!(read.faces.len(), mesh.face_count());

        for (face, tri) in read.faces.iter().zip(mesh.triangles()) {
            let v0 = &read.vertices[face.vertices[0]];
            prop_assert!((v0.0[0] as f64 - tri.v0.x).abs() < 1e-4);
            prop_assert!((v0.0[1] as f64 - tri.v0.y).abs() < 1e-4);
            prop_assert!((v0.0[2] as f64 - tri.v0.z).abs() < 1e-4);
        }
    }

    #[test]
    fn proptest_append_preserves_counts(a in arb_mesh(10, 10), b in arb_mesh(10, 10)) {
        let mut merged = a.clone();
        merged.append(&b);
        prop_assert_eq!(merged.vertex_count(), a.vertex_count() + b.vertex_count());
        prop_assert_eq!(merged.face_count(), a.face_count() + b.face_count());
        prop_assert!(merged.faces.iter().flatten().all(|&i| (i as usize) < merged.vertex_count()));
        prop_assert!((merged.signed_volume() - a.signed_volume() - b.signed_volume()).abs() < 1e-6);
    }
}
