//! mold validate command - check a vessel before generating a mold.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use mold_mesh::{Mesh, validate_input};
use serde::Serialize;

use crate::{Cli, OutputFormat, output};

#[derive(Serialize)]
struct ValidationResult {
    path: String,
    valid: bool,
    issues: Vec<IssueInfo>,
}

#[derive(Serialize)]
struct IssueInfo {
    category: String,
    message: String,
    severity: String,
}

impl IssueInfo {
    fn new(category: &str, message: impl Into<String>, severity: &str) -> Self {
        Self {
            category: category.to_string(),
            message: message.into(),
            severity: severity.to_string(),
        }
    }
}

pub fn run(input: &Path, cli: &Cli) -> Result<()> {
    let mesh =
        Mesh::load(input).with_context(|| format!("Failed to load mesh from {:?}", input))?;

    let report = mesh.validate();
    let mut issues: Vec<IssueInfo> = validate_input(&mesh)
        .warnings
        .iter()
        .map(|w| IssueInfo::new("input", w.to_string(), "warning"))
        .collect();

    if !report.is_consistently_wound {
        issues.push(IssueInfo::new(
            "winding",
            "Adjacent faces disagree on orientation",
            "warning",
        ));
    }
    if report.is_watertight && report.signed_volume < 0.0 {
        issues.push(IssueInfo::new(
            "winding",
            "Mesh appears to be inside-out",
            "warning",
        ));
    }

    let default_params = mold_shell::MoldParams::default();
    if let Some(bounds) = &report.bounds {
        for warning in default_params.warnings(bounds) {
            issues.push(IssueInfo::new("size", warning.to_string(), "warning"));
        }
        if bounds.height() <= 0.0 {
            issues.push(IssueInfo::new(
                "geometry",
                "Vessel has no height along Y; stand it upright",
                "error",
            ));
        }
    } else {
        issues.push(IssueInfo::new("geometry", "Mesh has no vertices", "error"));
    }

    let valid = issues.iter().all(|i| i.severity != "error");
    let result = ValidationResult {
        path: input.display().to_string(),
        valid,
        issues,
    };

    match cli.format {
        OutputFormat::Json => {
            output::print(&result, cli.format, cli.quiet);
        }
        OutputFormat::Text => {
            if !cli.quiet {
                println!("{}", "Validation Report".bold().underline());
                println!("  {}: {}", "File".cyan(), input.display());

                if result.valid {
                    println!("  {}: {}", "Status".cyan(), "Ready for molding".green().bold());
                } else {
                    println!("  {}: {}", "Status".cyan(), "Issues found".red().bold());
                }

                if !result.issues.is_empty() {
                    println!("\n{}", "Issues:".bold());
                    for issue in &result.issues {
                        let icon = match issue.severity.as_str() {
                            "error" => "✗".red(),
                            "warning" => "⚠".yellow(),
                            _ => "ℹ".blue(),
                        };
                        println!("  {} [{}] {}", icon, issue.category, issue.message);
                    }
                }
            }
        }
    }

    if !result.valid {
        std::process::exit(1);
    }

    Ok(())
}
