//! Triangle mesh plumbing for plaster mold generation.
//!
//! This crate holds everything the mold pipeline needs from a mesh library
//! and nothing more:
//!
//! - **Types**: [`Mesh`], [`Vertex`], [`Triangle`], [`BoundingBox`]
//! - **Ray queries**: [`RayCaster`] (BVH accelerated) and [`cast_ray`] (brute force)
//! - **File I/O**: STL and OBJ input, bit-exact binary STL output
//! - **Validation**: data sanity checks and non-fatal input warnings
//! - **Progress**: callbacks with cancellation, operation timing
//!
//! # Units and Coordinate System
//!
//! All lengths are millimeters. The coordinate system is right-handed with
//! **Y as the vessel axis** (up). A polar angle θ around the axis maps to
//! `(r·cos θ, y, r·sin θ)`.
//!
//! Face winding is counter-clockwise when viewed from outside the solid, so
//! normals point out of the material by the right-hand rule.
//!
//! # Quick Start
//!
//! ```no_run
//! use mold_mesh::{Mesh, RayCaster};
//! use nalgebra::{Point3, Vector3};
//!
//! let mesh = Mesh::load("vase.stl").unwrap();
//! let caster = RayCaster::new(&mesh);
//! if let Some(hit) = caster.cast(Point3::new(200.0, 50.0, 0.0), -Vector3::x(), 400.0) {
//!     println!("surface at radius {:.2}", hit.point.x);
//! }
//! mesh.save("copy.stl").unwrap();
//! ```

mod error;
mod types;

pub mod io;
pub mod progress;
pub mod raycast;
pub mod stl;
pub mod tracing_ext;
pub mod validate;

pub use error::{ErrorCode, MeshError, MeshResult, RecoverySuggestion};
pub use io::{MeshFormat, load_mesh, save_stl};
pub use progress::{Progress, ProgressCallback, ProgressTracker};
pub use raycast::{RayCaster, RayHit, cast_ray};
pub use stl::{write_binary_stl, write_stl};
pub use tracing_ext::OperationTimer;
pub use types::{BoundingBox, Mesh, Triangle, Vertex};
pub use validate::{
    InputReport, InputWarning, MeshReport, has_consistent_winding, validate_input, validate_mesh,
};

impl Mesh {
    /// Load a mesh from an STL or OBJ file.
    pub fn load(path: impl AsRef<std::path::Path>) -> MeshResult<Self> {
        io::load_mesh(path.as_ref())
    }

    /// Save the mesh as binary STL.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> MeshResult<()> {
        io::save_stl(self, path.as_ref())
    }

    /// Encode the mesh as binary STL in memory.
    pub fn to_stl_bytes(&self) -> std::io::Result<Vec<u8>> {
        stl::write_binary_stl(self)
    }

    /// Topology and size report.
    pub fn validate(&self) -> MeshReport {
        validate::validate_mesh(self)
    }
}
