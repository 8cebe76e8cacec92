//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/gendoc/) and project (.gendoc/) level
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::render::RenderStyle;
use crate::types::{DocError, Lang};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Label language for generated documentation
    pub lang: Lang,

    /// Code example languages to render, in order
    pub languages: Vec<String>,

    /// Rendering settings
    pub output: OutputConfig,

    /// Exporter plugin settings
    pub export: ExportSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            lang: Lang::default(),
            languages: Vec::new(),
            output: OutputConfig::default(),
            export: ExportSettings::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `DocError::Config` on validation failure.
    pub fn validate(&self) -> crate::types::Result<()> {
        // Entry titles render one level below this, so 5 is the deepest
        // heading level Markdown can still accommodate.
        if !(1..=5).contains(&self.output.heading_level) {
            return Err(DocError::Config(format!(
                "output.heading_level must be between 1 and 5, got {}",
                self.output.heading_level
            )));
        }

        if self.output.bullet.trim().is_empty() {
            return Err(DocError::Config(
                "output.bullet must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Render style derived from the output settings.
    pub fn render_style(&self) -> RenderStyle {
        RenderStyle {
            heading_level: self.output.heading_level,
            bullet: self.output.bullet.clone(),
        }
    }
}

// =============================================================================
// Output Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Heading level for category sections (entry titles one level below)
    pub heading_level: u8,

    /// Bullet character for list items
    pub bullet: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            heading_level: 2,
            bullet: "-".to_string(),
        }
    }
}

// =============================================================================
// Export Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Exporter manifest file registered at startup when present
    pub manifest: PathBuf,

    /// Directory holding exporter configuration files
    pub config_dir: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("config/exporters.json"),
            config_dir: PathBuf::from("config"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
