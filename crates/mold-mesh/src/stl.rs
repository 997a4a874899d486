//! Binary STL encoding.
//!
//! Layout, as written by `stl_io`:
//! - 80 bytes: header (zero-filled)
//! - 4 bytes: u32 LE triangle count
//! - Per triangle (50 bytes each):
//!   - 12 bytes: normal vector (3 × f32 LE)
//!   - 36 bytes: 3 vertices (3 × 3 × f32 LE)
//!   - 2 bytes: attribute byte count (0u16)

use std::io::{self, Write};

use nalgebra::Vector3;

use crate::Mesh;

/// Size of the fixed header block.
pub const HEADER_LEN: usize = 80;

/// Bytes per encoded triangle.
pub const TRIANGLE_LEN: usize = 50;

/// Stream a mesh as binary STL through `stl_io`.
///
/// A mesh without vertices writes nothing. The facet normal is the
/// renormalized average of the three vertex normals when every corner
/// carries one, otherwise the normalized edge cross product (zero for a
/// degenerate triangle).
pub fn write_stl<W: Write>(mesh: &Mesh, writer: &mut W) -> io::Result<()> {
    if mesh.vertices.is_empty() {
        return Ok(());
    }

    let triangles = mesh.faces.iter().map(|&[i0, i1, i2]| {
        let corners = [
            &mesh.vertices[i0 as usize],
            &mesh.vertices[i1 as usize],
            &mesh.vertices[i2 as usize],
        ];
        let normal = match (corners[0].normal, corners[1].normal, corners[2].normal) {
            (Some(a), Some(b), Some(c)) => normalize_or_zero(a + b + c),
            _ => normalize_or_zero(
                (corners[1].position - corners[0].position)
                    .cross(&(corners[2].position - corners[0].position)),
            ),
        };

        stl_io::Triangle {
            normal: stl_io::Normal::new([normal.x as f32, normal.y as f32, normal.z as f32]),
            vertices: corners.map(|v| {
                let p = &v.position;
                stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32])
            }),
        }
    });

    stl_io::write_stl(writer, triangles)
}

/// Encode a mesh as binary STL in memory.
pub fn write_binary_stl(mesh: &Mesh) -> io::Result<Vec<u8>> {
    if mesh.vertices.is_empty() {
        return Ok(Vec::new());
    }
    let mut buf = Vec::with_capacity(HEADER_LEN + 4 + mesh.faces.len() * TRIANGLE_LEN);
    write_stl(mesh, &mut buf)?;
    Ok(buf)
}

fn normalize_or_zero(v: Vector3<f64>) -> Vector3<f64> {
    let len = v.norm();
    if len > 1e-12 {
        v / len
    } else {
        Vector3::zeros()
    }
}
