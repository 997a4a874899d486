//! mold: command-line front end for plaster mold generation.
//!
//! Turns a vessel mesh into the four printable shells of a slip-casting mold.
//!
//! # Logging
//!
//! Set the `RUST_LOG` environment variable to control log output:
//! - `RUST_LOG=mold_shell=info` - Stage summaries
//! - `RUST_LOG=mold_shell=debug` - Grid sizes and gap counts
//! - `RUST_LOG=mold::timing=info` - Per-stage timing
//! - `RUST_LOG=debug` - All debug output
//!
//! # Example
//!
//! ```bash
//! # Default mold into ./out
//! mold generate vase.stl -o out
//!
//! # Thicker plaster walls, registration keys, stage logging
//! mold -v generate vase.stl -o out --plaster-wall 25 --natch
//!
//! # Start a parameter file from the defaults
//! mold params > mold.toml
//! mold generate vase.stl -o out --params mold.toml
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{generate, info, params, validate};

/// mold - Generate four-part plaster molds for ceramic vessels.
///
/// Produces a foot shell and three wall shells as binary STL files.
#[derive(Parser)]
#[command(name = "mold")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format for results
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Suppress all non-error output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ParamsFormat {
    Toml,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the foot and wall shells for a vessel
    Generate {
        /// Input vessel mesh (STL or OBJ)
        input: PathBuf,

        /// Output directory for the STL files
        #[arg(short, long)]
        output: PathBuf,

        /// File name stem for the parts (defaults to the input's stem)
        #[arg(long)]
        name: Option<String>,

        /// Parameter file (TOML or JSON)
        #[arg(long)]
        params: Option<PathBuf>,

        #[command(flatten)]
        overrides: generate::ParamOverrides,

        /// Use the vessel's position as is instead of centering it on the Y axis
        #[arg(long)]
        no_center: bool,
    },

    /// Check a vessel mesh before generating a mold
    Validate {
        /// Input mesh file
        input: PathBuf,
    },

    /// Display mesh statistics
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Print the default mold parameters
    Params {
        /// Serialization of the parameter set
        #[arg(long = "as", default_value = "toml")]
        syntax: ParamsFormat,
    },
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "mold_mesh=info,mold_shell=info,mold::timing=info",
            2 => "mold_mesh=debug,mold_shell=debug,mold::timing=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    #[cfg(debug_assertions)]
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Generate {
            input,
            output,
            name,
            params,
            overrides,
            no_center,
        } => generate::run(
            input,
            output,
            name.as_deref(),
            params.as_deref(),
            overrides,
            !*no_center,
            &cli,
        ),
        Commands::Validate { input } => validate::run(input, &cli),
        Commands::Info { input } => info::run(input, &cli),
        Commands::Params { syntax } => params::run(*syntax),
    };

    if let Err(e) = &result {
        if !cli.quiet {
            if let Some(mold_err) = e.downcast_ref::<mold_shell::MoldError>() {
                eprintln!("{}: {}", "Error".red().bold(), mold_err);
                eprintln!("  {}: {}", "Code".cyan(), mold_err.code());
                eprintln!(
                    "  {}: {}",
                    "Suggestion".green(),
                    mold_err.recovery_suggestion()
                );
            } else if let Some(mesh_err) = e.downcast_ref::<mold_mesh::MeshError>() {
                eprintln!("{}: {}", "Error".red().bold(), mesh_err);
                eprintln!("  {}: {}", "Code".cyan(), mesh_err.code());
                eprintln!(
                    "  {}: {}",
                    "Suggestion".green(),
                    mesh_err.recovery_suggestion()
                );
            } else {
                eprintln!("{}: {}", "Error".red().bold(), e);
                for cause in e.chain().skip(1) {
                    eprintln!("  {}: {}", "Caused by".yellow(), cause);
                }
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
