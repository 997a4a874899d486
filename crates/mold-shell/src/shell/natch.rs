//! Registration keys (natches) on wall seams.
//!
//! Each key is a small closed dome standing on a wall's end seam, appended to
//! the wall mesh as a separate skin.

use std::f64::consts::{FRAC_PI_2, TAU};

use mold_mesh::Mesh;
use nalgebra::{Point3, Vector3};
use tracing::debug;

use super::topology::{fan, push_ring, stitch};
use super::wall::{WallFrame, WallRow};
use crate::params::MoldParams;

const BUMP_SEGMENTS: usize = 24;
const BUMP_RINGS: usize = 6;

/// Radius of a key's base circle.
pub fn bump_radius(params: &MoldParams) -> f64 {
    params.natch.diameter / 2.0 - params.natch.tolerance
}

/// Key centers on the end seam of a wall, midway between cavity and exterior.
///
/// Heights are spread evenly over the full wall height. A position whose
/// seam strip is narrower than the key is skipped.
pub fn natch_positions(frame: &WallFrame, rows: &[WallRow], params: &MoldParams) -> Vec<Point3<f64>> {
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Vec::new();
    };
    let count = params.natch.count_per_seam;
    let radius = bump_radius(params);
    let exterior = frame.exterior_distance(frame.end_angle, 0.0);
    let (sin, cos) = frame.end_angle.sin_cos();

    (0..count)
        .filter_map(|i| {
            let fraction = (i + 1) as f64 / (count + 1) as f64;
            let y = first.y + (last.y - first.y) * fraction;
            let cavity = cavity_at(rows, y)?;
            let half_width = (exterior - cavity) / 2.0;
            if half_width <= radius {
                debug!(
                    segment = frame.segment,
                    y = format!("{:.2}", y),
                    "Seam too narrow for a natch, skipping"
                );
                return None;
            }
            let r = cavity + half_width;
            Some(Point3::new(r * cos, y, r * sin))
        })
        .collect()
}

/// Cavity radius on the end column at height `y`.
fn cavity_at(rows: &[WallRow], y: f64) -> Option<f64> {
    let k = rows.partition_point(|row| row.y <= y);
    let upper = rows.get(k.min(rows.len().saturating_sub(1)))?;
    let lower = rows.get(k.saturating_sub(1))?;
    let (c0, c1) = (*lower.cavity.last()?, *upper.cavity.last()?);
    let span = upper.y - lower.y;
    if span <= 0.0 {
        return Some(c0);
    }
    Some(c0 + (c1 - c0) * (y - lower.y) / span)
}

/// Closed dome standing on the plane through `center` with normal `axis`.
///
/// The dome protrudes `depth` beyond the plane; its base is sunk half a shell
/// thickness below it so it overlaps the wall material.
pub fn natch_bump(center: Point3<f64>, axis: Vector3<f64>, params: &MoldParams) -> Mesh {
    let axis = axis.normalize();
    let radius = bump_radius(params);
    let sink = params.shell_wall_thickness / 2.0;
    let height = params.natch.depth + sink;
    let base = center - axis * sink;

    let helper = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = axis.cross(&helper).normalize();
    let v = axis.cross(&u);

    let mut mesh = Mesh::with_capacity(BUMP_SEGMENTS * BUMP_RINGS + 2, 2 * BUMP_SEGMENTS * BUMP_RINGS);
    let rings: Vec<Vec<u32>> = (0..BUMP_RINGS)
        .map(|k| {
            let phi = FRAC_PI_2 * k as f64 / BUMP_RINGS as f64;
            let (rise, spread) = phi.sin_cos();
            push_ring(
                &mut mesh,
                (0..BUMP_SEGMENTS).map(|j| {
                    let (sa, ca) = (TAU * j as f64 / BUMP_SEGMENTS as f64).sin_cos();
                    base + axis * (height * rise) + (u * ca + v * sa) * (radius * spread)
                }),
            )
        })
        .collect();
    let apex = mesh.push_vertex(base + axis * height);
    let bottom = mesh.push_vertex(base);

    for k in 0..BUMP_RINGS - 1 {
        stitch(&mut mesh, &rings[k], &rings[k + 1], true);
    }
    fan(&mut mesh, apex, &rings[BUMP_RINGS - 1], true, false);
    fan(&mut mesh, bottom, &rings[0], true, true);
    mesh
}
