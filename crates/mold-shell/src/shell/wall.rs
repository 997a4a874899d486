//! Wall shells.
//!
//! The circumference is split into three 120° segments. Each wall's exterior
//! is one flat vertical plane registered at the same distance from the axis,
//! with the sharp corners between neighbouring walls clipped by vertical
//! cut-planes. The inside is the vessel cavity: a socket for the foot shell
//! below the vessel, the profile offset by the clearance, and a widened pour
//! region above the rim.
//!
//! Plane geometry works in the XZ plane; a `Vector2`/`Point2` holds `(x, z)`.

use std::f64::consts::{PI, TAU};

use mold_mesh::{BoundingBox, Mesh};
use nalgebra::{Point2, Point3, Vector2, Vector3};
use tracing::{debug, trace, warn};

use super::natch::{natch_bump, natch_positions};
use super::offset::span_envelope;
use super::topology::{push_ring, stitch};
use crate::error::{MoldError, MoldResult};
use crate::params::{MoldParams, SPARE_OFFSET};
use crate::profile::Profile;

/// Number of wall shells around the vessel.
pub const SEGMENT_COUNT: usize = 3;

const SEGMENT_ANGLE: f64 = TAU / SEGMENT_COUNT as f64;

/// Ray/plane cosines below this count as parallel.
const PARALLEL_EPSILON: f64 = 1e-9;

/// Smallest radial gap kept between the two skins of a wall.
const MIN_VOID_GAP: f64 = 0.1;

/// Upper bound on the angular thickness of an end cap.
const MAX_END_CAP_ANGLE: f64 = PI / 12.0;

/// Largest radius anywhere in the profile: the vessel's widest point.
pub fn max_vessel_radius(profile: &Profile) -> f64 {
    profile.max_radius()
}

/// Exterior geometry of one wall segment.
#[derive(Debug, Clone, PartialEq)]
pub struct WallFrame {
    pub segment: usize,
    pub start_angle: f64,
    pub end_angle: f64,
    /// Outward normal of the flat exterior, at the segment's mid angle.
    pub normal: Vector2<f64>,
    /// Perpendicular distance from the axis to the flat exterior.
    pub register_distance: f64,
    /// Distance of both cut-planes from the axis.
    pub cut_distance: f64,
    /// Normals of the start and end cut-planes (the boundary directions).
    pub cut_normals: [Vector2<f64>; 2],
    /// Where the flat exterior meets the start and end cut-planes.
    pub corners: [Point2<f64>; 2],
}

impl WallFrame {
    /// Frame for `segment` (0, 1 or 2) around a vessel of the given widest radius.
    pub fn new(segment: usize, max_vessel_radius: f64, params: &MoldParams) -> MoldResult<Self> {
        if segment >= SEGMENT_COUNT {
            return Err(MoldError::invalid_params(format!(
                "wall segment {} out of range (0..{})",
                segment, SEGMENT_COUNT
            )));
        }

        let start_angle = segment as f64 * SEGMENT_ANGLE;
        let end_angle = start_angle + SEGMENT_ANGLE;
        let mid = start_angle + SEGMENT_ANGLE / 2.0;
        let normal = direction(mid);

        let register_distance = max_vessel_radius + params.plaster_wall_thickness;
        // Two flat walls 120° apart meet on the boundary ray at 2·D.
        let natural_corner = register_distance / (SEGMENT_ANGLE / 2.0).cos();
        let cut_distance = (natural_corner - params.corner_cut_width).max(register_distance);

        let cut_normals = [direction(start_angle), direction(end_angle)];
        let corners = cut_normals.map(|u| {
            let det = normal.x * u.y - normal.y * u.x;
            Point2::new(
                (register_distance * u.y - normal.y * cut_distance) / det,
                (normal.x * cut_distance - u.x * register_distance) / det,
            )
        });

        Ok(Self {
            segment,
            start_angle,
            end_angle,
            normal,
            register_distance,
            cut_distance,
            cut_normals,
            corners,
        })
    }

    /// Where the ray from the axis at `theta` leaves the exterior with every
    /// plane moved inward by `inset`.
    pub fn project(&self, theta: f64, inset: f64) -> Point2<f64> {
        let w = direction(theta);
        let denom = w.dot(&self.normal);
        if denom < PARALLEL_EPSILON {
            let corner = if w.dot(&self.corners[0].coords) >= w.dot(&self.corners[1].coords) {
                self.corners[0]
            } else {
                self.corners[1]
            };
            trace!(theta, "Ray parallel to the flat exterior, using corner point");
            let len = corner.coords.norm();
            return Point2::from(corner.coords * ((len - inset).max(0.0) / len));
        }

        let mut distance = (self.register_distance - inset) / denom;
        for u in &self.cut_normals {
            let cos = w.dot(u);
            if cos > PARALLEL_EPSILON {
                distance = distance.min((self.cut_distance - inset) / cos);
            }
        }
        Point2::from(w * distance)
    }

    /// Distance from the axis to the exterior along `theta`.
    pub fn exterior_distance(&self, theta: f64, inset: f64) -> f64 {
        self.project(theta, inset).coords.norm()
    }

    /// Outward normal of the end seam face.
    pub fn seam_normal(&self) -> Vector3<f64> {
        let (sin, cos) = self.end_angle.sin_cos();
        Vector3::new(-sin, 0.0, cos)
    }
}

#[inline]
fn direction(theta: f64) -> Vector2<f64> {
    let (sin, cos) = theta.sin_cos();
    Vector2::new(cos, sin)
}

/// Part of the wall a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Below the vessel, holding the foot shell.
    Socket,
    /// Along the vessel profile.
    Main,
    /// Above the rim.
    Spare,
}

/// One height row of a wall: its Y and the cavity radius at every column.
#[derive(Debug, Clone, PartialEq)]
pub struct WallRow {
    pub y: f64,
    pub kind: RowKind,
    pub cavity: Vec<f64>,
}

/// Rows and columns of one wall, ready to be meshed.
#[derive(Debug, Clone)]
pub struct WallLayout {
    pub frame: WallFrame,
    /// Column angles, from the start seam to the end seam.
    pub columns: Vec<f64>,
    /// Rows, bottom to top.
    pub rows: Vec<WallRow>,
}

impl WallLayout {
    pub fn new(
        profile: &Profile,
        bounds: &BoundingBox,
        params: &MoldParams,
        segment: usize,
    ) -> MoldResult<Self> {
        let heights = profile.height_count();
        if heights == 0 || profile.angle_count() == 0 {
            return Err(MoldError::invalid_params("wall shells need a non-empty profile"));
        }
        if params.sampling.wall_columns < 2 {
            return Err(MoldError::invalid_params(format!(
                "wall shells need at least 2 columns, got {}",
                params.sampling.wall_columns
            )));
        }

        let t = params.shell_wall_thickness;
        let clearance = params.vessel_clearance;
        let frame = WallFrame::new(segment, max_vessel_radius(profile), params)?;

        let socket_radius = profile.row_max(0) + clearance;
        let min_radius = (profile.radii.values().copied().fold(f64::INFINITY, f64::min) + clearance)
            .min(socket_radius);
        let end_cap_angle = (t / min_radius.max(t)).asin().min(MAX_END_CAP_ANGLE);

        let inner = params.sampling.wall_columns;
        let first = frame.start_angle + end_cap_angle;
        let last = frame.end_angle - end_cap_angle;
        let mut columns = Vec::with_capacity(inner + 2);
        columns.push(frame.start_angle);
        columns.extend((0..inner).map(|j| first + (last - first) * j as f64 / (inner - 1) as f64));
        columns.push(frame.end_angle);

        // Cavity radius limit per column keeps both skins and a gap apart.
        let limits: Vec<f64> = columns
            .iter()
            .map(|&theta| frame.exterior_distance(theta, t) - t - MIN_VOID_GAP)
            .collect();

        let base_y = bounds.min.y - params.base_mold_height;
        let top_y = bounds.max.y;
        let last_row = heights - 1;

        let mut specs: Vec<(f64, RowKind)> = vec![
            (base_y, RowKind::Socket),
            (base_y + t, RowKind::Socket),
            (bounds.min.y, RowKind::Socket),
        ];
        specs.extend(profile.heights.iter().map(|&y| (y, RowKind::Main)));
        specs.extend([
            (top_y, RowKind::Spare),
            (top_y + params.spare_height - t, RowKind::Spare),
            (top_y + params.spare_height, RowKind::Spare),
        ]);

        let mut clamped = 0usize;
        let mut main_index = 0;
        let rows = specs
            .into_iter()
            .map(|(y, kind)| {
                let cavity = columns
                    .iter()
                    .zip(&limits)
                    .map(|(&theta, &limit)| {
                        let wanted = match kind {
                            RowKind::Socket => socket_radius,
                            RowKind::Main => profile.radius_at(main_index, theta) + clearance,
                            RowKind::Spare => {
                                profile.radius_at(last_row, theta) + clearance + SPARE_OFFSET
                            }
                        };
                        if wanted > limit && kind != RowKind::Spare {
                            clamped += 1;
                        }
                        wanted.min(limit)
                    })
                    .collect();
                if kind == RowKind::Main {
                    main_index += 1;
                }
                WallRow { y, kind, cavity }
            })
            .collect();

        if clamped > 0 {
            warn!(
                segment,
                clamped, "Vessel cavity clamped to keep the wall hollow; increase plaster_wall_thickness"
            );
        }

        Ok(Self {
            frame,
            columns,
            rows,
        })
    }

    /// Radius of the void skin for every void row (rows `1..n-1`) and column.
    ///
    /// Each column's cavity is a curve of radius over height. The void skin
    /// follows that curve's disk sweep, so the wall between cavity and void
    /// keeps `shell_thickness` measured across the surface, on the rim shelf
    /// and flaring profiles as much as on vertical stretches.
    pub fn void_radii(&self, shell_thickness: f64) -> Vec<Vec<f64>> {
        let n = self.rows.len();
        let (first, last) = (1, n - 2);
        let ys: Vec<f64> = self.rows.iter().map(|row| row.y).collect();

        let by_column: Vec<Vec<f64>> = (0..self.columns.len())
            .map(|j| {
                let cavity: Vec<f64> = self.rows.iter().map(|row| row.cavity[j]).collect();
                (first..=last)
                    .map(|i| {
                        let lo = ys[(i - 1).max(first)];
                        let hi = ys[(i + 1).min(last)];
                        span_envelope(&ys, &cavity, lo, hi, shell_thickness)
                    })
                    .collect()
            })
            .collect();

        (0..=last - first)
            .map(|i| by_column.iter().map(|column| column[i]).collect())
            .collect()
    }

    /// Mesh the wall: an outer skin around the wall solid and an inner skin
    /// around the void, each closed.
    pub fn to_mesh(&self, shell_thickness: f64) -> Mesh {
        let t = shell_thickness;
        let n = self.rows.len();
        let m = self.columns.len();
        let dirs: Vec<(f64, f64)> = self.columns.iter().map(|theta| theta.sin_cos()).collect();
        let exterior: Vec<Point2<f64>> = self.columns.iter().map(|&th| self.frame.project(th, 0.0)).collect();
        let exterior_inner: Vec<Point2<f64>> =
            self.columns.iter().map(|&th| self.frame.project(th, t)).collect();
        let radial = |r: f64, y: f64, (sin, cos): (f64, f64)| Point3::new(r * cos, y, r * sin);
        let flat = |p: &Point2<f64>, y: f64| Point3::new(p.x, y, p.y);

        let mut mesh = Mesh::with_capacity(4 * n * m, 8 * n * m);

        let cavity: Vec<Vec<u32>> = self
            .rows
            .iter()
            .map(|row| {
                push_ring(
                    &mut mesh,
                    row.cavity.iter().zip(&dirs).map(|(&r, &d)| radial(r, row.y, d)),
                )
            })
            .collect();
        let outside: Vec<Vec<u32>> = self
            .rows
            .iter()
            .map(|row| push_ring(&mut mesh, exterior.iter().map(|p| flat(p, row.y))))
            .collect();

        // The void spans the interior rows and columns only.
        let void_rows = &self.rows[1..n - 1];
        let void_cols = 1..m - 1;
        let void_radii = self.void_radii(t);
        let cavity_inner: Vec<Vec<u32>> = void_rows
            .iter()
            .zip(&void_radii)
            .map(|(row, radii)| {
                push_ring(
                    &mut mesh,
                    void_cols.clone().map(|j| radial(radii[j], row.y, dirs[j])),
                )
            })
            .collect();
        let outside_inner: Vec<Vec<u32>> = void_rows
            .iter()
            .map(|row| {
                push_ring(
                    &mut mesh,
                    void_cols.clone().map(|j| flat(&exterior_inner[j], row.y)),
                )
            })
            .collect();

        let column = |grid: &[Vec<u32>], j: usize| -> Vec<u32> { grid.iter().map(|r| r[j]).collect() };

        // Outer skin.
        for i in 0..n - 1 {
            stitch(&mut mesh, &cavity[i], &cavity[i + 1], false);
            stitch(&mut mesh, &outside[i + 1], &outside[i], false);
        }
        stitch(&mut mesh, &outside[0], &cavity[0], false);
        stitch(&mut mesh, &cavity[n - 1], &outside[n - 1], false);
        stitch(&mut mesh, &column(&cavity, 0), &column(&outside, 0), false);
        stitch(&mut mesh, &column(&outside, m - 1), &column(&cavity, m - 1), false);

        // Inner skin, facing into the void.
        let vn = cavity_inner.len();
        let vm = m - 2;
        for i in 0..vn - 1 {
            stitch(&mut mesh, &cavity_inner[i + 1], &cavity_inner[i], false);
            stitch(&mut mesh, &outside_inner[i], &outside_inner[i + 1], false);
        }
        stitch(&mut mesh, &cavity_inner[0], &outside_inner[0], false);
        stitch(&mut mesh, &outside_inner[vn - 1], &cavity_inner[vn - 1], false);
        stitch(
            &mut mesh,
            &column(&outside_inner, 0),
            &column(&cavity_inner, 0),
            false,
        );
        stitch(
            &mut mesh,
            &column(&cavity_inner, vm - 1),
            &column(&outside_inner, vm - 1),
            false,
        );

        mesh
    }
}

/// Build the hollow wall shell for `segment` (0: 0–120°, 1: 120–240°,
/// 2: 240–360°), with registration keys on its end seam when enabled.
pub fn build_wall_shell(
    profile: &Profile,
    bounds: &BoundingBox,
    params: &MoldParams,
    segment: usize,
) -> MoldResult<Mesh> {
    let layout = WallLayout::new(profile, bounds, params, segment)?;
    let mut mesh = layout.to_mesh(params.shell_wall_thickness);

    if params.natch.enabled {
        let axis = layout.frame.seam_normal();
        for center in natch_positions(&layout.frame, &layout.rows, params) {
            mesh.append(&natch_bump(center, axis, params));
        }
    }

    debug!(
        segment,
        register_distance = format!("{:.3}", layout.frame.register_distance),
        cut_distance = format!("{:.3}", layout.frame.cut_distance),
        rows = layout.rows.len(),
        columns = layout.columns.len(),
        faces = mesh.face_count(),
        "Built wall shell"
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

    fn cylinder_profile(radius: f64, rows: usize, angles: usize) -> Profile {
        let heights = (0..rows)
            .map(|h| 0.01 + 99.98 * h as f64 / (rows - 1) as f64)
            .collect();
        Profile::new(Grid::filled(rows, angles, radius), heights)
    }

    fn bounds(radius: f64) -> BoundingBox {
        BoundingBox::new(
            Point3::new(-radius, 0.0, -radius),
            Point3::new(radius, 100.0, radius),
        )
    }

    fn small_params() -> MoldParams {
        let mut params = MoldParams::default();
        params.sampling.wall_columns = 12;
        params
    }

    #[test]
    fn test_wall_registration() {
        let params = MoldParams::default();
        for (segment, degrees) in [(0, 60.0f64), (1, 180.0), (2, 300.0)] {
            let frame = WallFrame::new(segment, 70.0, &params).unwrap();
            assert!((frame.register_distance - 90.0).abs() < 1e-12);
            let expected = direction(degrees.to_radians());
            assert!((frame.normal - expected).norm() < 1e-12);
            // the mid-angle ray meets the flat exterior head on
            let p = frame.project(degrees.to_radians(), 0.0);
            assert!((p.coords.norm() - 90.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_corner_cut_distance() {
        let params = MoldParams::default();
        let frame = WallFrame::new(0, 70.0, &params).unwrap();
        // natural corner at 2·90, cut 10mm inward
        assert!((frame.cut_distance - 170.0).abs() < 1e-9);
        assert!((frame.exterior_distance(0.0, 0.0) - 170.0).abs() < 1e-9);

        for corner in &frame.corners {
            assert!((corner.coords.dot(&frame.normal) - 90.0).abs() < 1e-9);
        }
        assert!((frame.corners[0].coords.dot(&frame.cut_normals[0]) - 170.0).abs() < 1e-9);

        // a cut wider than the register distance clamps to it
        let wide = MoldParams {
            corner_cut_width: 500.0,
            ..Default::default()
        };
        let frame = WallFrame::new(1, 70.0, &wide).unwrap();
        assert!((frame.cut_distance - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_projection_stays_inside_all_planes() {
        let params = MoldParams::default();
        let frame = WallFrame::new(2, 50.0, &params).unwrap();
        for k in 0..=100 {
            let theta = frame.start_angle + SEGMENT_ANGLE * k as f64 / 100.0;
            let p = frame.project(theta, 0.0);
            assert!(p.coords.dot(&frame.normal) <= frame.register_distance + 1e-9);
            for u in &frame.cut_normals {
                assert!(p.coords.dot(u) <= frame.cut_distance + 1e-9);
            }
            let inset = frame.project(theta, 1.5);
            assert!(inset.coords.norm() < p.coords.norm());
        }
    }

    #[test]
    fn test_parallel_ray_falls_back_to_corner() {
        let params = MoldParams::default();
        let frame = WallFrame::new(0, 50.0, &params).unwrap();
        // 150° is perpendicular to the 60° normal
        let p = frame.project(150f64.to_radians(), 0.0);
        assert!((p - frame.corners[1]).norm() < 1e-9);
    }

    #[test]
    fn test_out_of_range_segment() {
        assert!(WallFrame::new(3, 50.0, &MoldParams::default()).is_err());
    }

    #[test]
    fn test_wall_rows() {
        let params = small_params();
        let profile = cylinder_profile(40.0, 10, 36);
        let layout = WallLayout::new(&profile, &bounds(40.0), &params, 0).unwrap();

        assert_eq!(layout.rows.len(), 3 + 10 + 3);
        assert_eq!(layout.columns.len(), 14);
        assert!((layout.rows[0].y + 15.0).abs() < 1e-12);
        assert!((layout.rows[1].y + 13.5).abs() < 1e-12);
        assert!((layout.rows[15].y - 130.0).abs() < 1e-12);
        assert!(layout.rows.windows(2).all(|w| w[0].y < w[1].y));

        // socket at the foot's exterior plus its fit gap
        assert!((layout.rows[0].cavity[5] - 40.1).abs() < 1e-12);
        assert!((layout.rows[7].cavity[5] - 40.1).abs() < 1e-12);
        // spare region widened above the rim
        assert!((layout.rows[14].cavity[5] - 55.1).abs() < 1e-12);
        assert_eq!(layout.rows[14].kind, RowKind::Spare);
    }

    #[test]
    fn test_wall_shell_is_closed_and_outward() {
        let params = small_params();
        let profile = cylinder_profile(40.0, 10, 36);
        for segment in 0..SEGMENT_COUNT {
            let mesh = build_wall_shell(&profile, &bounds(40.0), &params, segment).unwrap();
            let report = validate_mesh(&mesh);
            assert!(report.is_printable(), "segment {}: {}", segment, report);

            let frame = WallFrame::new(segment, 40.0, &params).unwrap();
            let mut on_plane = 0;
            for v in &mesh.vertices {
                let p = Vector2::new(v.position.x, v.position.z);
                let d = p.dot(&frame.normal);
                assert!(d <= frame.register_distance + 1e-9);
                if (d - frame.register_distance).abs() < 1e-9 {
                    on_plane += 1;
                }
            }
            assert!(on_plane > 0);
        }
    }

    #[test]
    fn test_thin_plaster_clamps_cavity() {
        let mut params = small_params();
        params.plaster_wall_thickness = 16.0;
        let profile = cylinder_profile(40.0, 6, 24);
        let layout = WallLayout::new(&profile, &bounds(40.0), &params, 1).unwrap();

        // spare radius 55.1 would cross the exterior's inner skin
        let t = params.shell_wall_thickness;
        for (j, &theta) in layout.columns.iter().enumerate() {
            let limit = layout.frame.exterior_distance(theta, t) - t;
            assert!(layout.rows.iter().all(|row| row.cavity[j] < limit));
        }
        let mesh = layout.to_mesh(t);
        assert!(validate_mesh(&mesh).is_printable());
    }

    #[test]
    fn test_natches_appended_when_enabled() {
        let mut params = small_params();
        let profile = cylinder_profile(40.0, 10, 36);
        let plain = build_wall_shell(&profile, &bounds(40.0), &params, 0).unwrap();

        params.natch.enabled = true;
        let keyed = build_wall_shell(&profile, &bounds(40.0), &params, 0).unwrap();
        assert!(keyed.face_count() > plain.face_count());

        let report = validate_mesh(&keyed);
        assert!(report.is_watertight && report.is_consistently_wound, "{}", report);
    }

    fn assert_sections_keep_thickness(layout: &WallLayout, t: f64) {
        let ys: Vec<f64> = layout.rows.iter().map(|row| row.y).collect();
        let void = layout.void_radii(t);
        assert_eq!(void.len(), layout.rows.len() - 2);
        for j in 1..layout.columns.len() - 1 {
            let cavity: Vec<f64> = layout.rows.iter().map(|row| row.cavity[j]).collect();
            for (i, radii) in void.iter().enumerate() {
                let d = distance_to_polyline(&ys, &cavity, ys[i + 1], radii[j]);
                assert!(d >= t - 1e-9, "row {} column {}: {:.4}mm", i + 1, j, d);
                assert!(radii[j] < layout.frame.exterior_distance(layout.columns[j], t));
            }
        }
    }

    #[test]
    fn test_void_clears_rim_shelf() {
        let params = small_params();
        let t = params.shell_wall_thickness;
        let profile = cylinder_profile(40.0, 10, 36);
        let layout = WallLayout::new(&profile, &bounds(40.0), &params, 0).unwrap();
        assert_sections_keep_thickness(&layout, t);

        // down through the shelf at the segment's middle
        let mesh = layout.to_mesh(t);
        let theta = 60f64.to_radians() + 1e-3;
        for r in [42.0, 47.6, 54.0] {
            let origin = Point3::new(r * theta.cos(), 200.0, r * theta.sin());
            let crossings = ray_crossings(&mesh, origin, -Vector3::y());
            assert_eq!(crossings.len(), 4, "r={}: {:?}", r, crossings);
            assert!(crossings[1] - crossings[0] >= t - 1e-6, "r={}: {:?}", r, crossings);
            // the void still reaches down to the bottom cap
            assert!((200.0 - crossings[2] - (-15.0 + t)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_void_follows_flaring_profile() {
        let params = small_params();
        let t = params.shell_wall_thickness;
        // r = 40 + 6y: the cavity leans far over toward horizontal
        let heights: Vec<f64> = (0..21).map(|h| h as f64 * 0.5).collect();
        let radii = Grid::from_fn(21, 36, |h, _| 40.0 + 6.0 * heights[h]);
        let profile = Profile::new(radii, heights.clone());
        let bounds = BoundingBox::new(
            Point3::new(-100.0, 0.0, -100.0),
            Point3::new(100.0, 10.0, 100.0),
        );

        for segment in 0..SEGMENT_COUNT {
            let layout = WallLayout::new(&profile, &bounds, &params, segment).unwrap();
            assert_sections_keep_thickness(&layout, t);
            assert!(validate_mesh(&layout.to_mesh(t)).is_printable());
        }
    }
}
