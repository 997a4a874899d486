//! mold info command - display mesh statistics.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use mold_mesh::Mesh;
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct MeshInfo {
    path: String,
    vertices: usize,
    faces: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    bounds: Option<BoundsInfo>,
    watertight: bool,
    volume: f64,
    surface_area: f64,
    has_normals: bool,
}

#[derive(Serialize)]
struct BoundsInfo {
    min: [f64; 3],
    max: [f64; 3],
    dimensions: [f64; 3],
    /// Half the larger horizontal extent: the vessel radius once centered.
    radius: f64,
}

pub fn run(input: &Path, cli: &Cli) -> Result<()> {
    let mesh =
        Mesh::load(input).with_context(|| format!("Failed to load mesh from {:?}", input))?;
    let report = mesh.validate();

    let bounds = report.bounds.as_ref().map(|b| {
        let dims = b.size();
        BoundsInfo {
            min: [b.min.x, b.min.y, b.min.z],
            max: [b.max.x, b.max.y, b.max.z],
            dimensions: [dims.x, dims.y, dims.z],
            radius: dims.x.max(dims.z) / 2.0,
        }
    });

    let info = MeshInfo {
        path: input.display().to_string(),
        vertices: mesh.vertex_count(),
        faces: mesh.face_count(),
        bounds,
        watertight: report.is_watertight,
        volume: mesh.volume(),
        surface_area: mesh.surface_area(),
        has_normals: mesh.vertices.iter().any(|v| v.normal.is_some()),
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&info, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Mesh Information".bold().underline());
                println!("  {}: {}", "File".cyan(), input.display());
                println!("  {}: {}", "Vertices".cyan(), info.vertices);
                println!("  {}: {}", "Faces".cyan(), info.faces);

                if let Some(ref b) = info.bounds {
                    println!(
                        "  {}: {:.2} x {:.2} x {:.2} mm",
                        "Dimensions".cyan(),
                        b.dimensions[0],
                        b.dimensions[1],
                        b.dimensions[2]
                    );
                    println!(
                        "  {}: ({:.2}, {:.2}, {:.2})",
                        "Min bounds".cyan(),
                        b.min[0],
                        b.min[1],
                        b.min[2]
                    );
                    println!(
                        "  {}: ({:.2}, {:.2}, {:.2})",
                        "Max bounds".cyan(),
                        b.max[0],
                        b.max[1],
                        b.max[2]
                    );
                    println!("  {}: {:.2} mm", "Radius (centered)".cyan(), b.radius);
                }

                println!(
                    "  {}: {}",
                    "Watertight".cyan(),
                    if info.watertight { "yes" } else { "no" }
                );
                if info.watertight {
                    println!("  {}: {:.2} mm³", "Volume".cyan(), info.volume);
                }
                println!("  {}: {:.2} mm²", "Surface area".cyan(), info.surface_area);
                println!(
                    "  {}: {}",
                    "Has normals".cyan(),
                    if info.has_normals { "yes" } else { "no" }
                );
            }
        }
    }

    Ok(())
}
