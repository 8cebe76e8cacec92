//! Exporters Command
//!
//! Lists registered exporters with their configuration status.

use crate::cli::ui::Output;
use crate::config::Config;
use crate::export::ExporterRegistry;
use crate::types::Result;

pub async fn run(config: &Config, as_json: bool) -> Result<()> {
    let out = Output::new();

    let mut registry = ExporterRegistry::with_builtins();
    if config.export.manifest.exists() {
        registry.load_from_manifest(&config.export.manifest)?;
    }

    let names = registry.available_exporters();

    if as_json {
        let mut listed = Vec::new();
        for name in &names {
            if let Some(exporter) = registry.get_exporter(name) {
                listed.push(serde_json::json!({
                    "name": name,
                    "description": exporter.description(),
                    "formats": exporter.supported_formats(),
                    "configured": exporter.is_configured().await,
                }));
            }
        }
        println!("{}", serde_json::to_string_pretty(&listed)?);
        return Ok(());
    }

    out.header("Available exporters");
    for name in &names {
        if let Some(exporter) = registry.get_exporter(name) {
            let status = if exporter.is_configured().await {
                "configured"
            } else {
                "not configured"
            };
            out.detail(&format!(
                "{:<12} {}  [{}]",
                name,
                exporter.description(),
                status
            ));
        }
    }
    Ok(())
}
