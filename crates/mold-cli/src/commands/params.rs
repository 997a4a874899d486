//! mold params command - print the default parameter set.

use anyhow::{Context, Result};
use mold_shell::MoldParams;

use crate::ParamsFormat;

pub fn run(syntax: ParamsFormat) -> Result<()> {
    let params = MoldParams::default();
    let text = match syntax {
        ParamsFormat::Toml => params.to_toml().context("Failed to serialize parameters as TOML")?,
        ParamsFormat::Json => params.to_json().context("Failed to serialize parameters as JSON")?,
    };
    println!("{}", text.trim_end());
    Ok(())
}
