//! Mesh file I/O: STL and OBJ input, binary STL output.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{MeshError, MeshResult};
use crate::stl::write_stl;
use crate::validate::validate_mesh_data;
use crate::{Mesh, Vertex};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
    Obj,
}

impl MeshFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase())
            .and_then(|ext| match ext.as_str() {
                "stl" => Some(MeshFormat::Stl),
                "obj" => Some(MeshFormat::Obj),
                _ => None,
            })
    }
}

/// Load a mesh from file, auto-detecting format from extension.
pub fn load_mesh(path: &Path) -> MeshResult<Mesh> {
    let format = MeshFormat::from_path(path).ok_or_else(|| {
        MeshError::unsupported_format(path.extension().and_then(|e| e.to_str()).map(String::from))
    })?;

    info!("Loading mesh from {:?} (format: {:?})", path, format);

    let mesh = match format {
        MeshFormat::Stl => load_stl(path)?,
        MeshFormat::Obj => load_obj(path)?,
    };

    if mesh.is_empty() {
        return Err(MeshError::empty_mesh("mesh has no vertices or faces"));
    }

    validate_mesh_data(&mesh)?;

    if let Some(bounds) = mesh.bounds() {
        let dims = bounds.size();
        info!(
            "Loaded mesh: {} vertices, {} faces",
            mesh.vertex_count(),
            mesh.face_count()
        );
        debug!(
            "Dimensions: {:.1} x {:.1} x {:.1} (Y is the vessel axis)",
            dims.x, dims.y, dims.z
        );
        if dims.y < dims.x.max(dims.z) * 0.1 {
            warn!("Mesh is very flat along Y; is the vessel oriented Y-up?");
        }
    }

    Ok(mesh)
}

/// Load mesh from STL file (binary or ASCII).
fn load_stl(path: &Path) -> MeshResult<Mesh> {
    let file = File::open(path).map_err(|e| MeshError::io_read(path, e))?;
    let mut reader = BufReader::new(file);

    let stl = stl_io::read_stl(&mut reader)
        .map_err(|e| MeshError::parse_error(path, e.to_string()))?;

    debug!(
        "STL contains {} vertices, {} triangles",
        stl.vertices.len(),
        stl.faces.len()
    );

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());
    for v in &stl.vertices {
        mesh.vertices
            .push(Vertex::from_coords(v.0[0] as f64, v.0[1] as f64, v.0[2] as f64));
    }

    let mut skipped = 0usize;
    for face in &stl.faces {
        let [a, b, c] = face.vertices;
        if a != b && b != c && a != c {
            mesh.faces.push([a as u32, b as u32, c as u32]);
        } else {
            skipped += 1;
        }
    }
    if skipped > 0 {
        debug!("Skipped {} collapsed STL triangles", skipped);
    }

    Ok(mesh)
}

/// Load mesh from OBJ file, merging all models and keeping normals when present.
fn load_obj(path: &Path) -> MeshResult<Mesh> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| MeshError::parse_error(path, e.to_string()))?;

    if models.is_empty() {
        return Err(MeshError::empty_mesh("OBJ file contains no models"));
    }

    let mut mesh = Mesh::new();
    for model in &models {
        let obj = &model.mesh;
        let base = mesh.vertices.len() as u32;
        let has_normals = obj.normals.len() == obj.positions.len();

        for (i, p) in obj.positions.chunks_exact(3).enumerate() {
            let mut vertex = Vertex::from_coords(p[0] as f64, p[1] as f64, p[2] as f64);
            if has_normals {
                let n = &obj.normals[i * 3..i * 3 + 3];
                vertex.normal = Some(nalgebra::Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64));
            }
            mesh.vertices.push(vertex);
        }

        for idx in obj.indices.chunks_exact(3) {
            mesh.faces.push([idx[0] + base, idx[1] + base, idx[2] + base]);
        }

        debug!("OBJ model '{}': {} faces", model.name, obj.indices.len() / 3);
    }

    Ok(mesh)
}

/// Save a mesh as binary STL.
///
/// A mesh without vertices produces an empty file.
pub fn save_stl(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    info!("Saving mesh to {:?}", path);

    let file = File::create(path).map_err(|e| MeshError::io_write(path, e))?;
    let mut writer = BufWriter::new(file);
    write_stl(mesh, &mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| MeshError::io_write(path, e))?;

    info!("Saved {} triangles to {:?}", mesh.face_count(), path);
    Ok(())
}
