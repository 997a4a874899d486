//! Foot (base) shell.
//!
//! The foot is a hollow drum below the vessel. Its outer wall is a plain
//! cylinder that slides into the socket of the three wall shells; its top
//! follows the vessel's underside so the vessel seats flush.
//!
//! ```text
//!   OT ───────── top outer contour ───────── Gc     y ≈ underside
//!   │ band                                          (thickness t)
//!   OM   IT ──── top inner contour ───────── Hc
//!   │    │ inner wall         (void)
//!   │    IF ──── inner floor ─────────────── Fc     y0 + t
//!   │ outer wall
//!   OB ─ IB ──── inner bottom cap ────────── Bc     y0 = min.y − base
//! outerR innerR                               axis
//! ```

use mold_mesh::{BoundingBox, Mesh};
use nalgebra::Point3;
use tracing::debug;

use super::offset::span_envelope;
use super::topology::{fan, push_ring, stitch};
use crate::error::{MoldError, MoldResult};
use crate::params::{FIT_CLEARANCE, MoldParams};
use crate::profile::{FilledHeightGrid, Profile, sample_angle};

/// Outer radius of the foot: widest bottom-row radius plus the cavity
/// clearance, less the fit gap to the wall socket.
pub fn foot_outer_radius(profile: &Profile, params: &MoldParams) -> f64 {
    profile.row_max(0) + params.vessel_clearance - FIT_CLEARANCE
}

/// Radius of the foot's inner wall.
pub fn foot_inner_radius(profile: &Profile, params: &MoldParams) -> f64 {
    foot_outer_radius(profile, params) - params.shell_wall_thickness
}

/// Section through the axis along angle row `a`, as height over signed
/// radius: the opposite row is mirrored onto negative radii. Heights are
/// negated so the sweep of the section runs downward, into the foot.
fn axial_section(bottom: &FilledHeightGrid, a: usize, outer_r: f64) -> (Vec<f64>, Vec<f64>) {
    let angles = bottom.angle_count();
    let opposite = (a + angles / 2) % angles;
    let mut xs = Vec::with_capacity(2 * bottom.radii.len() + 2);
    let mut fs = Vec::with_capacity(xs.capacity());

    let far = bottom.max_radius().max(outer_r);
    xs.push(-far);
    fs.push(-bottom.height_at(opposite, far));
    for (k, &r) in bottom.radii.iter().enumerate().skip(1).rev() {
        if r < far {
            xs.push(-r);
            fs.push(-bottom.y[(opposite, k)]);
        }
    }
    for (k, &r) in bottom.radii.iter().enumerate() {
        if r < far {
            xs.push(r);
            fs.push(-bottom.y[(a, k)]);
        }
    }
    xs.push(far);
    fs.push(-bottom.height_at(a, far));
    (xs, fs)
}

/// Heights of the void's top skin: one row per angle with an entry per
/// radial step from `k = 1`, and the height of the centre vertex.
///
/// The skin sits on the downward disk sweep of the contoured top, so the
/// contour keeps the shell thickness across foot-ring steps and slopes, not
/// only where it is flat.
fn void_top(bottom: &FilledHeightGrid, outer_r: f64, inner_r: f64, t: f64) -> (Vec<Vec<f64>>, f64) {
    let angles = bottom.angle_count();
    let radial = bottom.radial_count();
    let step = |k: usize| inner_r * k as f64 / (radial - 1) as f64;

    let mut center = f64::INFINITY;
    let rows = (0..angles)
        .map(|a| {
            let (xs, fs) = axial_section(bottom, a, outer_r);
            center = center.min(-span_envelope(&xs, &fs, -step(1), step(1), t));
            (1..radial)
                .map(|k| {
                    let lo = step(k - 1);
                    let hi = step((k + 1).min(radial - 1));
                    -span_envelope(&xs, &fs, lo, hi, t)
                })
                .collect()
        })
        .collect();
    (rows, center)
}

/// Build the hollow foot shell.
///
/// `bottom` must be the denoised underside sampled out to
/// [`foot_outer_radius`]. The result is an outer skin and an inner skin,
/// each closed, with the inner one facing into the void.
pub fn build_foot_shell(
    profile: &Profile,
    bottom: &FilledHeightGrid,
    bounds: &BoundingBox,
    params: &MoldParams,
) -> MoldResult<Mesh> {
    let t = params.shell_wall_thickness;
    if 2.0 * t >= params.base_mold_height {
        return Err(MoldError::invalid_param(
            "shell_wall_thickness",
            t,
            params.base_mold_height / 4.0,
            "the foot shell's void collapses: shell thickness must be below half the base height",
        ));
    }

    let outer_r = foot_outer_radius(profile, params);
    let inner_r = outer_r - t;
    if inner_r <= 0.0 {
        return Err(MoldError::invalid_params(format!(
            "vessel base radius {:.2}mm is too small for a {:.2}mm foot shell",
            profile.row_max(0),
            t
        )));
    }

    let angles = bottom.angle_count();
    let radial = bottom.radial_count();
    if angles < 3 || radial < 2 {
        return Err(MoldError::invalid_params(format!(
            "underside grid too coarse for a foot shell ({}x{})",
            angles, radial
        )));
    }

    let y0 = bounds.min.y - params.base_mold_height;
    let dirs: Vec<(f64, f64)> = (0..angles)
        .map(|a| {
            let (sin, cos) = sample_angle(a, angles).sin_cos();
            (cos, sin)
        })
        .collect();
    let at = |r: f64, y: f64, (cos, sin): (f64, f64)| Point3::new(r * cos, y, r * sin);
    let center_y = (0..angles).map(|a| bottom.height_at(a, 0.0)).sum::<f64>() / angles as f64;
    let step = |radius: f64, k: usize| radius * k as f64 / (radial - 1) as f64;

    let mut mesh = Mesh::with_capacity(
        2 * angles * (radial + 2) + 4,
        4 * angles * (radial + 3),
    );

    // Outer skin.
    let ob = push_ring(&mut mesh, dirs.iter().map(|&d| at(outer_r, y0, d)));
    let ib = push_ring(&mut mesh, dirs.iter().map(|&d| at(inner_r, y0, d)));
    let bc = mesh.push_vertex(Point3::new(0.0, y0, 0.0));
    let om = push_ring(
        &mut mesh,
        (0..angles).map(|a| at(outer_r, bottom.height_at(a, outer_r) - t, dirs[a])),
    );
    let gc = mesh.push_vertex(Point3::new(0.0, center_y, 0.0));
    let g: Vec<Vec<u32>> = (1..radial)
        .map(|k| {
            let r = step(outer_r, k);
            push_ring(
                &mut mesh,
                (0..angles).map(|a| at(r, bottom.height_at(a, r), dirs[a])),
            )
        })
        .collect();

    stitch(&mut mesh, &om, &ob, true); // outer wall
    stitch(&mut mesh, &g[g.len() - 1], &om, true); // top edge ring
    fan(&mut mesh, gc, &g[0], true, true); // top outer contour
    for k in 0..g.len() - 1 {
        stitch(&mut mesh, &g[k], &g[k + 1], true);
    }
    stitch(&mut mesh, &ob, &ib, true); // bottom hollow cap
    fan(&mut mesh, bc, &ib, true, false); // inner bottom cap

    // Inner skin, facing into the void.
    let (top, top_center) = void_top(bottom, outer_r, inner_r, t);
    let inner_floor = push_ring(&mut mesh, dirs.iter().map(|&d| at(inner_r, y0 + t, d)));
    let fc = mesh.push_vertex(Point3::new(0.0, y0 + t, 0.0));
    let hc = mesh.push_vertex(Point3::new(0.0, top_center, 0.0));
    let h: Vec<Vec<u32>> = (1..radial)
        .map(|k| {
            let r = step(inner_r, k);
            push_ring(&mut mesh, (0..angles).map(|a| at(r, top[a][k - 1], dirs[a])))
        })
        .collect();

    stitch(&mut mesh, &inner_floor, &h[h.len() - 1], true); // inner wall
    fan(&mut mesh, hc, &h[0], true, false); // top inner contour
    for k in 0..h.len() - 1 {
        stitch(&mut mesh, &h[k + 1], &h[k], true);
    }
    fan(&mut mesh, fc, &inner_floor, true, true); // inner floor

    debug!(
        outer_radius = format!("{:.3}", outer_r),
        inner_radius = format!("{:.3}", inner_r),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "Built foot shell"
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Grid;
    use crate::shell::offset::distance_to_polyline;
    use crate::test_util::ray_crossings;
    use mold_mesh::validate_mesh;
    use nalgebra::Vector3;
    use std::f64::consts::TAU;

    fn flat_profile(radius: f64, angles: usize) -> Profile {
        Profile::new(Grid::filled(4, angles, radius), vec![0.0, 10.0, 20.0, 30.0])
    }

    fn flat_bottom(y: f64, outer: f64, angles: usize, radial: usize) -> FilledHeightGrid {
        FilledHeightGrid {
            y: Grid::filled(angles, radial, y),
            radii: (0..radial)
                .map(|k| outer * k as f64 / (radial - 1) as f64)
                .collect(),
        }
    }

    fn bounds() -> BoundingBox {
        BoundingBox::new(Point3::new(-50.0, 0.0, -50.0), Point3::new(50.0, 30.0, 50.0))
    }

    #[test]
    fn test_foot_radius_formula() {
        let params = MoldParams::default();
        let profile = flat_profile(50.0, 16);
        assert!((foot_outer_radius(&profile, &params) - 49.9).abs() < 1e-12);
        assert!((foot_inner_radius(&profile, &params) - 48.4).abs() < 1e-12);
    }

    #[test]
    fn test_flat_foot_is_closed_and_outward() {
        let params = MoldParams::default();
        let profile = flat_profile(50.0, 24);
        let bottom = flat_bottom(0.0, 49.9, 24, 6);
        let mesh = build_foot_shell(&profile, &bottom, &bounds(), &params).unwrap();

        let report = validate_mesh(&mesh);
        assert!(report.is_printable(), "{}", report);

        let b = mesh.bounds().unwrap();
        assert!((b.min.y + 15.0).abs() < 1e-9);
        assert!(b.max.y.abs() < 1e-9);
        assert!((b.max.x - 49.9).abs() < 1e-9);

        // material volume: solid drum minus the void, both 24-gon prisms
        let area = |r: f64| 0.5 * 24.0 * r * r * (std::f64::consts::TAU / 24.0).sin();
        let expected = area(49.9) * 15.0 - area(48.4) * (15.0 - 3.0);
        assert!((mesh.volume() - expected).abs() < 1e-6 * expected);
    }

    #[test]
    fn test_contoured_top_follows_underside() {
        let params = MoldParams::default();
        let profile = flat_profile(40.0, 32);
        // concave underside: 3mm higher at the center
        let mut bottom = flat_bottom(0.0, 39.9, 32, 8);
        for a in 0..32 {
            for k in 0..8 {
                bottom.y[(a, k)] = 3.0 * (1.0 - k as f64 / 7.0);
            }
        }
        let mesh = build_foot_shell(&profile, &bottom, &bounds(), &params).unwrap();
        assert!(validate_mesh(&mesh).is_printable());

        let top = mesh
            .vertices
            .iter()
            .map(|v| v.position.y)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((top - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_thick_shell_rejected() {
        let params = MoldParams {
            shell_wall_thickness: 7.5,
            ..Default::default()
        };
        let profile = flat_profile(50.0, 8);
        let bottom = flat_bottom(0.0, 49.9, 8, 4);
        let err = build_foot_shell(&profile, &bottom, &bounds(), &params).unwrap_err();
        assert!(matches!(err, MoldError::InvalidParams { .. }));
    }

    /// Underside recessed 5mm inside a foot ring at r ≈ 30.
    fn foot_ring_bottom(angles: usize) -> FilledHeightGrid {
        let mut bottom = flat_bottom(0.0, 39.9, angles, 31);
        for a in 0..angles {
            for k in 0..31 {
                let r = bottom.radii[k];
                bottom.y[(a, k)] = 5.0 * ((31.0 - r) / 3.0).clamp(0.0, 1.0);
            }
        }
        bottom
    }

    #[test]
    fn test_void_top_keeps_thickness_in_every_section() {
        let params = MoldParams::default();
        let t = params.shell_wall_thickness;
        let bottom = foot_ring_bottom(32);
        let (outer_r, inner_r) = (39.9, 38.4);
        let (top, center) = void_top(&bottom, outer_r, inner_r, t);

        for (a, row) in top.iter().enumerate() {
            let (xs, fs) = axial_section(&bottom, a, outer_r);
            let heights: Vec<f64> = fs.iter().map(|f| -f).collect();
            for (k, &y) in row.iter().enumerate() {
                let r = inner_r * (k + 1) as f64 / 30.0;
                let d = distance_to_polyline(&xs, &heights, r, y);
                assert!(d >= t - 1e-9, "angle {} step {}: {:.4}mm", a, k + 1, d);
            }
            assert!(distance_to_polyline(&xs, &heights, 0.0, center) >= t - 1e-9);
        }
        // flat middle keeps the plain offset
        assert!((center - (5.0 - t)).abs() < 1e-9);
    }

    #[test]
    fn test_foot_ring_step_keeps_thickness() {
        let params = MoldParams::default();
        let t = params.shell_wall_thickness;
        let profile = flat_profile(40.0, 32);
        let mesh = build_foot_shell(&profile, &foot_ring_bottom(32), &bounds(), &params).unwrap();
        assert!(validate_mesh(&mesh).is_printable());

        for a in 0..8 {
            let theta = TAU * (a as f64 + 0.3) / 8.0;
            let dir = Vector3::new(theta.cos(), 0.0, theta.sin());
            // from the axis inside the void, out through the void skin and the seat
            let crossings = ray_crossings(&mesh, Point3::new(0.0, 2.5, 0.0), dir);
            assert!(crossings.len() >= 2, "{:?}", crossings);
            let gap = crossings[1] - crossings[0];
            assert!(gap >= t - 1e-3, "angle {:.2}: {:.4}mm", theta, gap);
        }
    }
}
