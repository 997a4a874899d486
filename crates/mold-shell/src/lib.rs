//! Four-part plaster mold generation for ceramic vessels.
//!
//! Given a closed vessel mesh standing upright along +Y, this crate produces
//! four printable hollow shells: a foot that the vessel sits on and three
//! walls covering 120° each. Filled with plaster, they form a slip-casting
//! mold.
//!
//! # Pipeline
//!
//! 1. **Sample** the vessel's outer radius on a height × angle grid by
//!    casting rays toward the axis, and its underside on an angle × radius
//!    grid by casting rays upward ([`sample`]).
//! 2. **Denoise**: fill missed samples, remove spikes, smooth ([`denoise`]).
//! 3. **Build** the foot shell and the three wall shells ([`shell`]).
//!
//! # Quick Start
//!
//! ```no_run
//! use mold_mesh::Mesh;
//! use mold_shell::MoldBuilder;
//!
//! let vessel = Mesh::load("vase.stl").unwrap();
//! let mold = MoldBuilder::new(&vessel)
//!     .plaster_wall_thickness(20.0)
//!     .build()
//!     .unwrap();
//!
//! for path in mold.save_stl_files("out", "vase").unwrap() {
//!     println!("wrote {}", path.display());
//! }
//! ```
//!
//! # Parameters from a File
//!
//! ```no_run
//! use mold_mesh::Mesh;
//! use mold_shell::{MoldParams, generate_mold};
//!
//! let params = MoldParams::load_file("mold.toml").unwrap();
//! let vessel = Mesh::load("vase.stl").unwrap();
//! let mold = generate_mold(&vessel, &params).unwrap();
//! println!("register distance {:.1}mm", mold.stats.register_distance);
//! ```

mod builder;
mod error;

pub mod denoise;
pub mod params;
pub mod profile;
pub mod sample;
pub mod shell;

#[cfg(test)]
pub(crate) mod test_util;

pub use error::{MoldError, MoldErrorCode, MoldRecoverySuggestion, MoldResult};

pub use builder::{
    MoldBuilder, MoldOutput, MoldStats, StageTiming, generate_mold, output_bounds,
};

pub use params::{
    DenoiseParams, MoldParams, NatchParams, ParamWarning, ParamsFileError, SamplingParams,
};

pub use profile::{FilledHeightGrid, Grid, HeightGrid, Profile};

pub use shell::{
    WallFrame, build_foot_shell, build_wall_shell, foot_outer_radius, max_vessel_radius,
};
