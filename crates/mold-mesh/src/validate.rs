//! Mesh validation and reporting.
//!
//! Two levels of checking live here:
//! - [`validate_mesh_data`] rejects data no algorithm can work with (bad
//!   indices, NaN or infinite coordinates).
//! - [`validate_input`] inspects a loaded vessel and produces warnings only.
//!   Raycasting degrades gracefully on open or non-manifold input, so mold
//!   generation proceeds regardless of what it finds.

use hashbrown::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::error::{MeshError, MeshResult};
use crate::{BoundingBox, Mesh};

/// Fewest vertices a usable vessel can have (a tetrahedron).
pub const MIN_VERTICES: usize = 4;

/// Fewest triangles a usable vessel can have (a tetrahedron).
pub const MIN_TRIANGLES: usize = 4;

/// Smallest bounding-box dimension, in millimeters, considered a plausible vessel.
pub const MIN_DIMENSION_MM: f64 = 1.0;

/// Largest bounding-box dimension, in millimeters, considered a plausible vessel.
pub const MAX_DIMENSION_MM: f64 = 1000.0;

/// Number of faces that use each undirected edge.
pub fn edge_face_counts(faces: &[[u32; 3]]) -> HashMap<(u32, u32), usize> {
    let mut counts: HashMap<(u32, u32), usize> = HashMap::with_capacity(faces.len() * 3 / 2);
    for &[a, b, c] in faces {
        for (u, v) in [(a, b), (b, c), (c, a)] {
            let key = if u < v { (u, v) } else { (v, u) };
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

/// Whether no directed edge is used twice, i.e. neighbouring faces agree on
/// their winding.
pub fn has_consistent_winding(faces: &[[u32; 3]]) -> bool {
    let mut seen: HashSet<(u32, u32)> = HashSet::with_capacity(faces.len() * 3);
    for &[a, b, c] in faces {
        for edge in [(a, b), (b, c), (c, a)] {
            if !seen.insert(edge) {
                return false;
            }
        }
    }
    true
}

/// Topology and size report for a mesh.
#[derive(Debug, Clone)]
pub struct MeshReport {
    /// Whether the mesh has no boundary edges.
    pub is_watertight: bool,

    /// Whether every edge is shared by exactly two faces.
    pub is_manifold: bool,

    /// Number of boundary edges (edges with 1 adjacent face).
    pub boundary_edge_count: usize,

    /// Number of non-manifold edges (edges with >2 adjacent faces).
    pub non_manifold_edge_count: usize,

    /// Whether adjacent faces agree on their winding.
    pub is_consistently_wound: bool,

    pub vertex_count: usize,
    pub face_count: usize,
    pub bounds: Option<BoundingBox>,

    /// Signed volume (positive = outward normals). Only meaningful when watertight.
    pub signed_volume: f64,

    pub surface_area: f64,
}

impl MeshReport {
    /// Closed, manifold and outward facing.
    pub fn is_printable(&self) -> bool {
        self.is_watertight
            && self.is_manifold
            && self.is_consistently_wound
            && self.signed_volume > 0.0
    }
}

impl std::fmt::Display for MeshReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Mesh Report:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Faces: {}", self.face_count)?;

        if let Some(b) = &self.bounds {
            let size = b.size();
            writeln!(
                f,
                "  Bounds: [{:.1}, {:.1}, {:.1}] to [{:.1}, {:.1}, {:.1}]",
                b.min.x, b.min.y, b.min.z, b.max.x, b.max.y, b.max.z
            )?;
            writeln!(f, "  Dimensions: {:.1} x {:.1} x {:.1}", size.x, size.y, size.z)?;
        }

        writeln!(f, "  Surface Area: {:.2}", self.surface_area)?;
        writeln!(f, "  Signed Volume: {:.2}", self.signed_volume)?;
        writeln!(
            f,
            "  Watertight: {} (boundary edges: {})",
            if self.is_watertight { "yes" } else { "NO" },
            self.boundary_edge_count
        )?;
        writeln!(
            f,
            "  Manifold: {} (non-manifold edges: {})",
            if self.is_manifold { "yes" } else { "NO" },
            self.non_manifold_edge_count
        )?;
        writeln!(
            f,
            "  Consistent winding: {}",
            if self.is_consistently_wound { "yes" } else { "NO" }
        )?;
        writeln!(
            f,
            "  Printable: {}",
            if self.is_printable() { "yes" } else { "NO" }
        )
    }
}

/// Build a topology report for a mesh.
pub fn validate_mesh(mesh: &Mesh) -> MeshReport {
    let counts = edge_face_counts(&mesh.faces);
    let boundary_edge_count = counts.values().filter(|&&n| n == 1).count();
    let non_manifold_edge_count = counts.values().filter(|&&n| n > 2).count();

    let report = MeshReport {
        is_watertight: boundary_edge_count == 0,
        is_manifold: boundary_edge_count == 0 && non_manifold_edge_count == 0,
        boundary_edge_count,
        non_manifold_edge_count,
        is_consistently_wound: has_consistent_winding(&mesh.faces),
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        bounds: mesh.bounds(),
        signed_volume: mesh.signed_volume(),
        surface_area: mesh.surface_area(),
    };

    debug!("{}", report);
    report
}

/// A recoverable problem found in an input vessel.
#[derive(Debug, Clone, PartialEq)]
pub enum InputWarning {
    TooFewVertices { count: usize },
    TooFewTriangles { count: usize },
    TooSmall { largest_dimension: f64 },
    TooLarge { largest_dimension: f64 },
    /// Edges not shared by exactly two triangles.
    NonManifold {
        boundary_edges: usize,
        non_manifold_edges: usize,
    },
}

impl std::fmt::Display for InputWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputWarning::TooFewVertices { count } => {
                write!(f, "only {} vertices (expected at least {})", count, MIN_VERTICES)
            }
            InputWarning::TooFewTriangles { count } => {
                write!(f, "only {} triangles (expected at least {})", count, MIN_TRIANGLES)
            }
            InputWarning::TooSmall { largest_dimension } => write!(
                f,
                "largest dimension is {:.3}mm; the model may be in the wrong units",
                largest_dimension
            ),
            InputWarning::TooLarge { largest_dimension } => write!(
                f,
                "largest dimension is {:.1}mm; the model may be in the wrong units",
                largest_dimension
            ),
            InputWarning::NonManifold {
                boundary_edges,
                non_manifold_edges,
            } => write!(
                f,
                "mesh is not manifold ({} boundary edges, {} over-shared edges); sampling gaps will be interpolated",
                boundary_edges, non_manifold_edges
            ),
        }
    }
}

/// Warnings produced by [`validate_input`].
#[derive(Debug, Clone, Default)]
pub struct InputReport {
    pub warnings: Vec<InputWarning>,
}

impl InputReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Check an input vessel for problems that degrade mold quality.
///
/// Never fails; every finding is logged with `warn!` and collected.
pub fn validate_input(mesh: &Mesh) -> InputReport {
    let mut warnings = Vec::new();

    if mesh.vertex_count() < MIN_VERTICES {
        warnings.push(InputWarning::TooFewVertices {
            count: mesh.vertex_count(),
        });
    }
    if mesh.face_count() < MIN_TRIANGLES {
        warnings.push(InputWarning::TooFewTriangles {
            count: mesh.face_count(),
        });
    }

    if let Some(bounds) = mesh.bounds() {
        let size = bounds.size();
        let largest = size.x.max(size.y).max(size.z);
        if largest < MIN_DIMENSION_MM {
            warnings.push(InputWarning::TooSmall {
                largest_dimension: largest,
            });
        } else if largest > MAX_DIMENSION_MM {
            warnings.push(InputWarning::TooLarge {
                largest_dimension: largest,
            });
        }
    }

    let counts = edge_face_counts(&mesh.faces);
    let boundary_edges = counts.values().filter(|&&n| n == 1).count();
    let non_manifold_edges = counts.values().filter(|&&n| n > 2).count();
    if boundary_edges > 0 || non_manifold_edges > 0 {
        warnings.push(InputWarning::NonManifold {
            boundary_edges,
            non_manifold_edges,
        });
    }

    for w in &warnings {
        warn!("Input check: {}", w);
    }
    if warnings.is_empty() {
        info!("Input check passed: closed manifold vessel");
    }

    InputReport { warnings }
}

/// Reject meshes with out-of-range indices or non-finite coordinates.
pub fn validate_mesh_data(mesh: &Mesh) -> MeshResult<()> {
    for (vertex_idx, vertex) in mesh.vertices.iter().enumerate() {
        let p = vertex.position;
        for (coord, value) in [("x", p.x), ("y", p.y), ("z", p.z)] {
            if !value.is_finite() {
                return Err(MeshError::invalid_coordinate(vertex_idx, coord, value));
            }
        }
    }

    let vertex_count = mesh.vertices.len();
    for (face_idx, face) in mesh.faces.iter().enumerate() {
        if let Some(&bad) = face.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::invalid_vertex_index(face_idx, bad, vertex_count));
        }
    }

    Ok(())
}
