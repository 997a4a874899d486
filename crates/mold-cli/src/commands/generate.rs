//! mold generate command - build the four mold shells for a vessel.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use mold_mesh::Mesh;
use mold_shell::{MoldBuilder, MoldParams, MoldStats};
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

/// Command-line overrides applied on top of the defaults or a parameter file.
#[derive(Args, Debug, Default)]
pub struct ParamOverrides {
    /// Distance from the vessel's widest point to the flat wall exterior (mm)
    #[arg(long)]
    plaster_wall: Option<f64>,

    /// Pour clearance above the rim (mm)
    #[arg(long)]
    spare_height: Option<f64>,

    /// How far wall corners are clipped (mm)
    #[arg(long)]
    corner_cut: Option<f64>,

    /// Printed skin thickness, at least 1.2 (mm)
    #[arg(long)]
    shell_thickness: Option<f64>,

    /// Add registration keys to the wall seams
    #[arg(long)]
    natch: bool,
}

impl ParamOverrides {
    fn apply(&self, params: &mut MoldParams) {
        if let Some(v) = self.plaster_wall {
            params.plaster_wall_thickness = v;
        }
        if let Some(v) = self.spare_height {
            params.spare_height = v;
        }
        if let Some(v) = self.corner_cut {
            params.corner_cut_width = v;
        }
        if let Some(v) = self.shell_thickness {
            params.shell_wall_thickness = v;
        }
        if self.natch {
            params.natch.enabled = true;
        }
    }
}

#[derive(Serialize)]
struct PartInfo {
    name: String,
    path: String,
    faces: usize,
    printable: bool,
    volume: f64,
}

#[derive(Serialize)]
struct GenerateResult {
    input: String,
    output_dir: String,
    success: bool,
    params: MoldParams,
    parts: Vec<PartInfo>,
    stats: MoldStats,
}

/// Parameter set from an optional file plus command-line overrides.
pub fn resolve_params(file: Option<&Path>, overrides: &ParamOverrides) -> Result<MoldParams> {
    let mut params = match file {
        Some(path) => MoldParams::load_file(path)
            .with_context(|| format!("Failed to load parameters from {:?}", path))?,
        None => MoldParams::default(),
    };
    overrides.apply(&mut params);
    Ok(params)
}

pub fn run(
    input: &Path,
    output_dir: &Path,
    name: Option<&str>,
    params_file: Option<&Path>,
    overrides: &ParamOverrides,
    center: bool,
    cli: &Cli,
) -> Result<()> {
    let params = resolve_params(params_file, overrides)?;
    let mesh =
        Mesh::load(input).with_context(|| format!("Failed to load mesh from {:?}", input))?;

    output::info(
        &format!(
            "Generating mold for {} ({} faces)...",
            input.display(),
            mesh.face_count()
        ),
        cli.format,
        cli.quiet,
    );

    let mold = MoldBuilder::new(&mesh)
        .params(params.clone())
        .center_on_axis(center)
        .build()?;

    let stem = name
        .map(str::to_string)
        .or_else(|| input.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "mold".to_string());
    let paths = mold
        .save_stl_files(output_dir, &stem)
        .with_context(|| format!("Failed to write mold parts to {:?}", output_dir))?;

    let parts: Vec<PartInfo> = mold
        .parts()
        .zip(&paths)
        .map(|((name, mesh), path)| {
            let report = mesh.validate();
            PartInfo {
                name,
                path: path.display().to_string(),
                faces: mesh.face_count(),
                printable: report.is_printable(),
                volume: report.signed_volume,
            }
        })
        .collect();

    let result = GenerateResult {
        input: input.display().to_string(),
        output_dir: output_dir.display().to_string(),
        success: true,
        params,
        parts,
        stats: mold.stats,
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&result, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                for warning in result
                    .stats
                    .input_warnings
                    .iter()
                    .chain(&result.stats.param_warnings)
                {
                    output::warning(warning, cli.quiet);
                }
                output::success(
                    &format!("Mold saved to {}", output_dir.display()),
                    cli.format,
                    cli.quiet,
                );
                println!(
                    "  {}: {:.2} mm",
                    "Widest radius".cyan(),
                    result.stats.max_vessel_radius
                );
                println!(
                    "  {}: {:.2} mm",
                    "Register distance".cyan(),
                    result.stats.register_distance
                );
                println!(
                    "  {}: {:.2} mm",
                    "Foot radius".cyan(),
                    result.stats.foot_outer_radius
                );
                if result.stats.profile_gaps + result.stats.underside_gaps > 0 {
                    println!(
                        "  {}: {} profile, {} underside",
                        "Filled gaps".yellow(),
                        result.stats.profile_gaps,
                        result.stats.underside_gaps
                    );
                }
                for part in &result.parts {
                    let status = if part.printable {
                        "ok".green()
                    } else {
                        "NOT PRINTABLE".red().bold()
                    };
                    println!(
                        "  {} {} ({} faces, {:.0} mm³) {}",
                        "•".cyan(),
                        part.path,
                        part.faces,
                        part.volume,
                        status
                    );
                }
                println!(
                    "  {}: {:.0} ms",
                    "Total time".cyan(),
                    result.stats.total_ms
                );
            }
        }
    }

    Ok(())
}
