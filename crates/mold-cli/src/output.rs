//! Output helpers shared by the commands.
//!
//! Text mode prints coloured lines to stdout; JSON mode prints one
//! pretty-printed document per command and nothing else, so the output can
//! be piped straight into other tools.

use colored::Colorize;
use serde::Serialize;

use crate::OutputFormat;

/// Print a serializable result. Text mode falls back to JSON as well, for
/// commands that have no dedicated text rendering.
pub fn print<T: Serialize>(value: &T, _format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("{}: failed to serialize output: {}", "Error".red().bold(), e),
    }
}

/// Progress or status line; suppressed in JSON mode.
pub fn info(message: &str, format: OutputFormat, quiet: bool) {
    if quiet || matches!(format, OutputFormat::Json) {
        return;
    }
    println!("{} {}", "→".blue(), message);
}

pub fn success(message: &str, format: OutputFormat, quiet: bool) {
    if quiet || matches!(format, OutputFormat::Json) {
        return;
    }
    println!("{} {}", "✓".green().bold(), message);
}

/// Warnings go to stderr so JSON on stdout stays parseable.
pub fn warning(message: &str, quiet: bool) {
    if quiet {
        return;
    }
    eprintln!("{} {}", "⚠".yellow(), message);
}
