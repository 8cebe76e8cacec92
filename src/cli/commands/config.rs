//! Config Command
//!
//! Manage gendoc configuration.
//!
//! Usage:
//!   gendoc config show [-f json]
//!   gendoc config path
//!   gendoc config init [-g] [--force]

use crate::cli::ui::Output;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show configuration
pub fn show(global: bool, format: &str) -> Result<()> {
    let out = Output::new();
    let as_json = format == "json";

    if global {
        if let Some(global_path) = ConfigLoader::global_config_path() {
            if global_path.exists() {
                let content = std::fs::read_to_string(&global_path)?;
                println!("# Global Config: {}\n", global_path.display());
                println!("{}", content);
            } else {
                out.warning("No global config found.");
                out.detail("Run 'gendoc config init --global' to create one.");
            }
        } else {
            out.warning("Cannot determine global config directory.");
        }
    } else {
        // Show merged effective config
        ConfigLoader::show_config(as_json)?;
    }
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Initialize global configuration
pub fn init_global(force: bool) -> Result<()> {
    let out = Output::new();
    let dir = ConfigLoader::init_global(force)?;
    out.success("Initialized global configuration");
    out.detail(&format!("Directory: {}", dir.display()));
    if let Some(config_path) = ConfigLoader::global_config_path() {
        out.detail(&format!("Config:    {}", config_path.display()));
    }
    Ok(())
}

/// Initialize project configuration
pub fn init_project() -> Result<()> {
    let out = Output::new();
    let dir = ConfigLoader::init_project()?;
    out.success("Initialized project configuration");
    out.detail(&format!("Directory: {}", dir.display()));
    out.detail(&format!(
        "Config:    {}",
        ConfigLoader::project_config_path().display()
    ));
    Ok(())
}
