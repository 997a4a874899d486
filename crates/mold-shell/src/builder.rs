//! Fluent builder for mold generation.
//!
//! # Example
//!
//! ```no_run
//! use mold_mesh::Mesh;
//! use mold_shell::MoldBuilder;
//!
//! let vessel = Mesh::load("vase.stl").unwrap();
//!
//! let mold = MoldBuilder::new(&vessel)
//!     .plaster_wall_thickness(25.0)
//!     .spare_height(40.0)
//!     .natch(true)
//!     .build()
//!     .unwrap();
//!
//! mold.save_stl_files("out", "vase").unwrap();
//! ```

use std::path::{Path, PathBuf};

use mold_mesh::progress::ProgressCallback;
use mold_mesh::{
    BoundingBox, Mesh, MeshError, OperationTimer, ProgressTracker, RayCaster, validate_input,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::denoise::{denoise_height_grid, denoise_profile};
use crate::error::{MoldError, MoldResult};
use crate::params::MoldParams;
use crate::sample::{sample_bottom_grid, sample_profile};
use crate::shell::{
    SEGMENT_COUNT, WallFrame, build_foot_shell, build_wall_shell, foot_outer_radius,
    max_vessel_radius,
};

/// Pipeline stages reported to the progress callback.
const STAGE_COUNT: u64 = 5 + SEGMENT_COUNT as u64;

/// Timing of one pipeline stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageTiming {
    pub stage: &'static str,
    pub elapsed_ms: f64,
}

/// Measurements collected while generating a mold.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MoldStats {
    /// Translation applied to put the vessel on the Y axis.
    pub centering_offset: [f64; 3],
    /// Input check findings.
    pub input_warnings: Vec<String>,
    /// Parameter findings, such as a mold too large for common printers.
    pub param_warnings: Vec<String>,
    /// Profile samples whose ray missed.
    pub profile_gaps: usize,
    /// Underside samples whose ray missed.
    pub underside_gaps: usize,
    pub max_vessel_radius: f64,
    pub foot_outer_radius: f64,
    /// Distance from the axis to each wall's flat exterior.
    pub register_distance: f64,
    pub stage_timings: Vec<StageTiming>,
    pub total_ms: f64,
}

/// The four printable parts of a mold.
#[derive(Debug, Clone)]
pub struct MoldOutput {
    pub foot: Mesh,
    /// Wall shells covering 0–120°, 120–240° and 240–360°.
    pub walls: [Mesh; 3],
    pub stats: MoldStats,
}

impl MoldOutput {
    /// Every part with its file suffix, foot first.
    pub fn parts(&self) -> impl Iterator<Item = (String, &Mesh)> + '_ {
        std::iter::once(("foot".to_string(), &self.foot)).chain(
            self.walls
                .iter()
                .enumerate()
                .map(|(i, wall)| (format!("wall_{}", i + 1), wall)),
        )
    }

    /// Write `<stem>_foot.stl` and `<stem>_wall_1.stl`…`<stem>_wall_3.stl`
    /// into `dir`, creating it if needed. Returns the written paths.
    pub fn save_stl_files(&self, dir: impl AsRef<Path>, stem: &str) -> MoldResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| MeshError::io_write(dir, e))?;

        let mut written = Vec::with_capacity(1 + SEGMENT_COUNT);
        for (suffix, mesh) in self.parts() {
            let path = dir.join(format!("{}_{}.stl", stem, suffix));
            mesh.save(&path)?;
            info!(path = %path.display(), faces = mesh.face_count(), "Saved mold part");
            written.push(path);
        }
        Ok(written)
    }
}

/// Fluent builder for a four-part plaster mold.
///
/// Starts from [`MoldParams::default`]; individual setters override single
/// values after [`params`](Self::params) replaces the whole set.
pub struct MoldBuilder<'a> {
    mesh: &'a Mesh,
    params: MoldParams,
    center_on_axis: bool,
    progress_callback: Option<ProgressCallback>,
}

impl<'a> MoldBuilder<'a> {
    pub fn new(mesh: &'a Mesh) -> Self {
        Self {
            mesh,
            params: MoldParams::default(),
            center_on_axis: true,
            progress_callback: None,
        }
    }

    /// Replace every parameter.
    pub fn params(mut self, params: MoldParams) -> Self {
        self.params = params;
        self
    }

    /// Distance from the vessel's widest point to the flat wall exterior.
    pub fn plaster_wall_thickness(mut self, mm: f64) -> Self {
        self.params.plaster_wall_thickness = mm;
        self
    }

    /// Pour clearance above the rim.
    pub fn spare_height(mut self, mm: f64) -> Self {
        self.params.spare_height = mm;
        self
    }

    pub fn corner_cut_width(mut self, mm: f64) -> Self {
        self.params.corner_cut_width = mm;
        self
    }

    /// Thickness of every printed skin. Must be at least 1.2mm.
    pub fn shell_wall_thickness(mut self, mm: f64) -> Self {
        self.params.shell_wall_thickness = mm;
        self
    }

    /// Add registration keys to the wall seams.
    pub fn natch(mut self, enable: bool) -> Self {
        self.params.natch.enabled = enable;
        self
    }

    /// Move the vessel so its XZ bounding-box center lies on the Y axis
    /// before sampling. On by default.
    pub fn center_on_axis(mut self, enable: bool) -> Self {
        self.center_on_axis = enable;
        self
    }

    /// Set a progress callback.
    ///
    /// Return `false` from the callback to cancel; [`build`](Self::build)
    /// then fails with [`MoldError::Cancelled`].
    ///
    /// ```no_run
    /// use mold_mesh::{Mesh, ProgressCallback};
    /// use mold_shell::MoldBuilder;
    ///
    /// let vessel = Mesh::load("vase.stl").unwrap();
    /// let callback: ProgressCallback = Box::new(|progress| {
    ///     println!("{}%: {}", progress.percent(), progress.message);
    ///     true
    /// });
    /// let mold = MoldBuilder::new(&vessel).with_progress(callback).build();
    /// ```
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Run the pipeline:
    ///
    /// 1. validate parameters, check the input (warnings only)
    /// 2. center the vessel on the Y axis (optional)
    /// 3. sample and denoise the profile
    /// 4. sample and denoise the underside out to the foot radius
    /// 5. build the foot shell and the three wall shells
    ///
    /// # Errors
    ///
    /// - [`MoldError::InvalidParams`] for out-of-range parameters
    /// - [`MoldError::EmptyMesh`] for a mesh without triangles
    /// - [`MoldError::EmptySampling`] when no ray hits the vessel
    /// - [`MoldError::Cancelled`] when the progress callback returns `false`
    pub fn build(self) -> MoldResult<MoldOutput> {
        let total = OperationTimer::new("generate_mold");
        let params = &self.params;
        let callback = self.progress_callback.as_ref();
        params.validate()?;

        if self.mesh.faces.is_empty() || self.mesh.vertices.is_empty() {
            return Err(MoldError::EmptyMesh);
        }
        mold_mesh::validate::validate_mesh_data(self.mesh)?;

        let mut stats = MoldStats {
            input_warnings: validate_input(self.mesh)
                .warnings
                .iter()
                .map(ToString::to_string)
                .collect(),
            ..Default::default()
        };

        let mut mesh = self.mesh.clone();
        if self.center_on_axis {
            let offset = mesh.center_on_y_axis();
            stats.centering_offset = [offset.x, offset.y, offset.z];
            if offset.norm() > 0.0 {
                info!(
                    dx = format!("{:.3}", offset.x),
                    dz = format!("{:.3}", offset.z),
                    "Centered vessel on the Y axis"
                );
            }
        }
        let bounds = mesh.bounds().ok_or(MoldError::EmptyMesh)?;
        for warning in params.warnings(&bounds) {
            warn!("{}", warning);
            stats.param_warnings.push(warning.to_string());
        }

        let tracker = ProgressTracker::new(STAGE_COUNT);
        let stage = |name: &'static str, timer: OperationTimer, stats: &mut MoldStats| {
            stats.stage_timings.push(StageTiming {
                stage: name,
                elapsed_ms: timer.elapsed_ms(),
            });
            tracker.increment();
            if tracker.report(callback, name) {
                Ok(())
            } else {
                Err(MoldError::cancelled(name))
            }
        };

        let caster = RayCaster::new(&mesh);

        let timer = OperationTimer::with_context("sample_profile", mesh.face_count(), mesh.vertex_count());
        let raw_profile = sample_profile(&caster, &bounds, &params.sampling, callback)?;
        stats.profile_gaps = raw_profile.gap_count();
        stage("sample_profile", timer, &mut stats)?;

        let timer = OperationTimer::new("denoise_profile");
        let profile = denoise_profile(&raw_profile, &params.denoise)?;
        stats.max_vessel_radius = max_vessel_radius(&profile);
        stats.foot_outer_radius = foot_outer_radius(&profile, params);
        stats.register_distance = WallFrame::new(0, stats.max_vessel_radius, params)?.register_distance;
        stage("denoise_profile", timer, &mut stats)?;

        let timer = OperationTimer::new("sample_underside");
        let raw_bottom = sample_bottom_grid(
            &caster,
            &bounds,
            stats.foot_outer_radius.max(0.0),
            &params.sampling,
            callback,
        )?;
        stats.underside_gaps = raw_bottom.gap_count();
        stage("sample_underside", timer, &mut stats)?;

        let timer = OperationTimer::new("denoise_underside");
        let bottom = denoise_height_grid(&raw_bottom, bounds.min.y, &params.denoise);
        stage("denoise_underside", timer, &mut stats)?;

        let timer = OperationTimer::new("foot_shell");
        let foot = build_foot_shell(&profile, &bottom, &bounds, params)?;
        stage("foot_shell", timer, &mut stats)?;

        const WALL_STAGES: [&str; SEGMENT_COUNT] = ["wall_shell_1", "wall_shell_2", "wall_shell_3"];
        let mut walls: [Mesh; SEGMENT_COUNT] = Default::default();
        for (segment, wall) in walls.iter_mut().enumerate() {
            let timer = OperationTimer::new(WALL_STAGES[segment]);
            *wall = build_wall_shell(&profile, &bounds, params, segment)?;
            stage(WALL_STAGES[segment], timer, &mut stats)?;
        }

        stats.total_ms = total.elapsed_ms();
        info!(
            max_radius = format!("{:.2}", stats.max_vessel_radius),
            register_distance = format!("{:.2}", stats.register_distance),
            foot_faces = foot.face_count(),
            wall_faces = walls.iter().map(Mesh::face_count).sum::<usize>(),
            "Mold generated"
        );

        Ok(MoldOutput { foot, walls, stats })
    }
}

/// Generate a mold with the given parameters, centering the vessel first.
pub fn generate_mold(mesh: &Mesh, params: &MoldParams) -> MoldResult<MoldOutput> {
    MoldBuilder::new(mesh).params(params.clone()).build()
}

/// Bounds of a generated part set; `None` if every part is empty.
pub fn output_bounds(output: &MoldOutput) -> Option<BoundingBox> {
    let mut parts = output.parts().filter_map(|(_, mesh)| mesh.bounds());
    let mut bounds = parts.next()?;
    for b in parts {
        bounds.include(b.min);
        bounds.include(b.max);
    }
    Some(bounds)
}
