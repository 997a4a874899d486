//! Surface sampling by raycasting.
//!
//! The profile is sampled outside-in: rays start well outside the vessel and
//! travel toward the axis, so the first hit is the outermost surface at that
//! height even under overhangs. The underside is sampled with vertical rays
//! from below.

use mold_mesh::{BoundingBox, ProgressCallback, ProgressTracker, RayCaster};
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::{MoldError, MoldResult};
use crate::params::SamplingParams;
use crate::profile::{Grid, HeightGrid, Profile, sample_angle};

/// Distance the first and last sample heights are kept inside the bounds so
/// rays do not graze horizontal caps.
pub const HEIGHT_INSET: f64 = 0.01;

/// How far below the vessel the upward rays start.
pub const BOTTOM_RAY_DROP: f64 = 50.0;

/// Evenly spaced sample heights between the vessel's bottom and top.
pub fn profile_heights(bounds: &BoundingBox, count: usize) -> Vec<f64> {
    let span = bounds.height();
    let inset = HEIGHT_INSET.min(span / 4.0);
    let lo = bounds.min.y + inset;
    let hi = bounds.max.y - inset;
    if count <= 1 {
        return vec![(lo + hi) / 2.0; count];
    }
    (0..count)
        .map(|h| lo + (hi - lo) * h as f64 / (count - 1) as f64)
        .collect()
}

/// Sample the vessel's outer radius on a height × angle grid.
///
/// Missed rays leave `0.0` in the grid for the gap filler.
pub fn sample_profile(
    caster: &RayCaster<'_>,
    bounds: &BoundingBox,
    sampling: &SamplingParams,
    progress: Option<&ProgressCallback>,
) -> MoldResult<Profile> {
    let heights = profile_heights(bounds, sampling.height_samples);
    let angles = sampling.angle_samples;

    let extent = bounds.max_xz_extent();
    let origin_radius = if extent > 0.0 { 2.0 * extent } else { 1.0 };
    let max_distance = 2.0 * origin_radius;

    let tracker = ProgressTracker::new(heights.len() as u64);
    let rows: Option<Vec<Vec<f64>>> = heights
        .par_iter()
        .map(|&y| {
            if tracker.is_cancelled() {
                return None;
            }
            let row = (0..angles)
                .map(|a| {
                    let theta = sample_angle(a, angles);
                    let (sin, cos) = theta.sin_cos();
                    let origin = Point3::new(origin_radius * cos, y, origin_radius * sin);
                    let dir = Vector3::new(-cos, 0.0, -sin);
                    caster
                        .cast(origin, dir, max_distance)
                        .map_or(0.0, |hit| hit.point.x.hypot(hit.point.z))
                })
                .collect();
            tracker.increment();
            tracker
                .maybe_callback(progress, "Sampling vessel profile")
                .then_some(row)
        })
        .collect();

    let rows = rows.ok_or_else(|| MoldError::cancelled("profile sampling"))?;
    let radii = Grid::from_rows(rows)
        .ok_or_else(|| MoldError::invalid_params("profile rows differ in length"))?;
    let profile = Profile::new(radii, heights);

    let gaps = profile.gap_count();
    info!(
        heights = profile.height_count(),
        angles = profile.angle_count(),
        gaps,
        max_radius = format!("{:.3}", profile.max_radius()),
        "Sampled vessel profile"
    );
    Ok(profile)
}

/// Sample the vessel's underside height on an angle × radius grid reaching
/// out to `max_radius`.
pub fn sample_bottom_grid(
    caster: &RayCaster<'_>,
    bounds: &BoundingBox,
    max_radius: f64,
    sampling: &SamplingParams,
    progress: Option<&ProgressCallback>,
) -> MoldResult<HeightGrid> {
    let steps = sampling.radial_steps.max(2);
    let radii: Vec<f64> = (0..steps)
        .map(|k| max_radius * k as f64 / (steps - 1) as f64)
        .collect();
    let angles = sampling.angle_samples;

    let start_y = bounds.min.y - BOTTOM_RAY_DROP;
    let max_distance = bounds.height() + 2.0 * BOTTOM_RAY_DROP;
    let up = Vector3::y();

    let tracker = ProgressTracker::new(angles as u64);
    let rows: Option<Vec<Vec<Option<f64>>>> = (0..angles)
        .into_par_iter()
        .map(|a| {
            if tracker.is_cancelled() {
                return None;
            }
            let (sin, cos) = sample_angle(a, angles).sin_cos();
            let row = radii
                .iter()
                .map(|&r| {
                    let origin = Point3::new(r * cos, start_y, r * sin);
                    caster.cast(origin, up, max_distance).map(|hit| hit.point.y)
                })
                .collect();
            tracker.increment();
            tracker
                .maybe_callback(progress, "Sampling vessel underside")
                .then_some(row)
        })
        .collect();

    let rows = rows.ok_or_else(|| MoldError::cancelled("underside sampling"))?;
    let y = Grid::from_rows(rows)
        .ok_or_else(|| MoldError::invalid_params("underside rows differ in length"))?;
    let grid = HeightGrid { y, radii };

    debug!(
        angles = grid.angle_count(),
        radial_steps = grid.radial_count(),
        max_radius = format!("{:.3}", max_radius),
        gaps = grid.gap_count(),
        "Sampled vessel underside"
    );
    Ok(grid)
}
