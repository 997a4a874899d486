//! Shell construction for the four printable mold parts.
//!
//! Every part is a hollow shell: an outer skin around the part's solid and an
//! inner skin, wound the other way, around a void. Both skins are closed so
//! the part prints as a thin-walled body that is later filled with plaster.

pub mod foot;
pub mod natch;
pub mod offset;
pub mod topology;
pub mod wall;

pub use foot::{build_foot_shell, foot_inner_radius, foot_outer_radius};
pub use natch::{natch_bump, natch_positions};
pub use wall::{
    RowKind, SEGMENT_COUNT, WallFrame, WallLayout, WallRow, build_wall_shell, max_vessel_radius,
};
