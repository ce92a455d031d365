//! Config Command
//!
//! Manage Recast configuration.
//!
//! Usage:
//!   recast config show [-f text|json|yaml]
//!   recast config path
//!   recast config init [-g] [--force]

use std::path::Path;

use crate::cli::ui::Output;
use crate::config::{ConfigFormat, ConfigLoader};
use crate::types::Result;

/// Show the effective configuration (merged from all sources)
pub fn show(config_path: Option<&Path>, format: ConfigFormat) -> Result<()> {
    let config = match config_path {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    println!("{}", ConfigLoader::render(&config, format)?);
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Initialize global or project configuration
pub fn init(global: bool, force: bool) -> Result<()> {
    let dir = if global {
        ConfigLoader::init_global(force)?
    } else {
        ConfigLoader::init_project(force)?
    };
    let output = Output::new();
    output.success(&format!(
        "Initialized {} configuration",
        if global { "global" } else { "project" }
    ));
    output.info(&format!("Config: {}", dir.join("config.toml").display()));
    Ok(())
}
