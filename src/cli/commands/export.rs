//! Export Command
//!
//! Normalizes an input snapshot and hands it to a registered exporter.

use std::path::PathBuf;

use tracing::debug;

use crate::cli::ui::Output;
use crate::cli::util::read_json_input;
use crate::config::Config;
use crate::export::{ExportContent, ExportOptions, ExporterRegistry};
use crate::normalize::normalize;
use crate::types::{DocError, Result};

pub struct ExportArgs {
    pub exporter: String,
    pub input: Option<PathBuf>,
    pub file: Option<PathBuf>,
    pub title: Option<String>,
    pub config_path: Option<PathBuf>,
    pub by_category: bool,
    pub labels: Vec<String>,
    pub validate: bool,
    pub output_file: Option<PathBuf>,
}

pub async fn run(config: &Config, args: ExportArgs) -> Result<()> {
    let out = Output::new();

    let mut registry = ExporterRegistry::with_builtins();
    if config.export.manifest.exists() {
        registry.load_from_manifest(&config.export.manifest)?;
    }

    let exporter = registry.get_exporter(&args.exporter).ok_or_else(|| {
        DocError::UnknownExporter(format!(
            "{}. Available: {}",
            args.exporter,
            registry.available_exporters().join(", ")
        ))
    })?;

    let content = match (&args.input, &args.file) {
        (Some(input_path), _) => {
            let input = read_json_input(input_path)?;
            let entries = normalize(&input, config.lang)?;
            debug!(entries = entries.len(), "normalized input for export");
            ExportContent::from_entries(entries)
        }
        (None, Some(file_path)) => {
            let raw = std::fs::read_to_string(file_path)?;
            ExportContent::from_raw(raw)
        }
        (None, None) => {
            return Err(DocError::MissingInput(
                "either --input or --file is required".to_string(),
            ));
        }
    };

    let options = ExportOptions {
        title: args.title,
        config_path: args.config_path,
        by_category: args.by_category,
        labels: args.labels,
        validate_before_export: args.validate,
        output_file: args.output_file,
        extra: Default::default(),
    };

    let result = exporter.export(&content, &options).await;
    if result.success {
        out.success(&format!("Export via '{}' succeeded", exporter.name()));
        if let Some(details) = &result.details {
            println!("{}", serde_json::to_string_pretty(details)?);
        }
        Ok(())
    } else {
        if let Some(details) = &result.details {
            println!("{}", serde_json::to_string_pretty(details)?);
        }
        Err(DocError::Export(
            result.error.unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}
