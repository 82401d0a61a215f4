//! Config Command
//!
//! Manage docfiler configuration.
//!
//! Usage:
//!   docfiler config show [-f json]
//!   docfiler config path
//!   docfiler config init [-g] [--force]

use std::path::Path;

use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::types::{FilerError, Result};

/// Show the effective configuration (merged from all sources)
pub fn show(explicit: Option<&Path>, format: &str) -> Result<()> {
    let as_json = match format {
        "json" => true,
        "toml" | "text" => false,
        other => {
            return Err(FilerError::Config(format!(
                "Unknown format: {}. Valid values: toml, json",
                other
            )));
        }
    };

    let config = ConfigLoader::load(explicit)?;
    println!("{}", ConfigLoader::render(&config, as_json)?);
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Write a default config file
pub fn init(global: bool, force: bool) -> Result<()> {
    let path = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_project(force)?
    };

    let scope = if global { "global" } else { "project" };
    Output::new().success(&format!("Initialized {} configuration", scope));
    eprintln!("  Config: {}", path.display());
    Ok(())
}
