//! Exporter Registry
//!
//! Name-keyed store of exporter factories with lazily-created, cached
//! instances. The registry is an explicitly constructed, process-scoped
//! object threaded through the entry points that need it; there is no
//! module-level singleton.
//!
//! Plugin discovery is a registration table resolved at startup: manifest
//! and directory loading map exporter module names onto the built-in kind
//! table, skipping and warning on anything non-conforming instead of
//! aborting the scan.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::{ConfluenceExporter, Exporter, HtmlExporter, MarkdownExporter, PdfExporter};
use crate::types::Result;

/// Factory closure producing a fresh exporter instance.
pub type ExporterFactory = Box<dyn Fn() -> Arc<dyn Exporter> + Send + Sync>;

#[derive(Default)]
pub struct ExporterRegistry {
    factories: HashMap<String, ExporterFactory>,
    /// Names in registration order; an overwrite keeps the original slot.
    order: Vec<String>,
    instances: HashMap<String, Arc<dyn Exporter>>,
}

impl ExporterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in exporters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// Register the built-in exporters under their self-reported names.
    pub fn register_builtins(&mut self) {
        self.register("confluence", || Arc::new(ConfluenceExporter::new()));
        self.register("markdown", || Arc::new(MarkdownExporter::new()));
        self.register("html", || Arc::new(HtmlExporter::new()));
        self.register("pdf", || Arc::new(PdfExporter::new()));
        info!("Registered built-in exporters");
    }

    /// Register an exporter factory under `name`.
    ///
    /// Overwrites any existing factory for the name and evicts its cached
    /// instance, so the very next lookup constructs through the new factory.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Arc<dyn Exporter> + Send + Sync + 'static,
    {
        if self.factories.contains_key(name) {
            warn!(exporter = name, "overwriting already registered exporter");
        } else {
            self.order.push(name.to_string());
        }
        self.factories.insert(name.to_string(), Box::new(factory));
        self.instances.remove(name);
    }

    pub fn has_exporter(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Look up an exporter instance, constructing and caching it on first
    /// use. At most one instance exists per name for the registry's
    /// lifetime unless re-registration evicts the cache.
    pub fn get_exporter(&mut self, name: &str) -> Option<Arc<dyn Exporter>> {
        if let Some(instance) = self.instances.get(name) {
            return Some(Arc::clone(instance));
        }
        let factory = self.factories.get(name)?;
        let instance = factory();
        self.instances
            .insert(name.to_string(), Arc::clone(&instance));
        Some(instance)
    }

    /// Registered names in registration order.
    pub fn available_exporters(&self) -> Vec<String> {
        self.order.clone()
    }

    // =========================================================================
    // Startup Registration
    // =========================================================================

    /// Load exporters from a JSON manifest `{"exporters": [{name, path}]}`.
    ///
    /// Each entry's `path` is resolved against the built-in kind table by
    /// its file stem; the manifest's `name` wins over the exporter's
    /// self-reported name. Bad entries are skipped with a warning. A missing
    /// or shapeless manifest warns and leaves the registry untouched.
    pub fn load_from_manifest(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            warn!(path = %path.display(), "exporter manifest does not exist");
            return Ok(());
        }

        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot read exporter manifest");
                return Ok(());
            }
        };
        let manifest: ExporterManifest = match serde_json::from_str(&raw) {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "exporter manifest is not valid");
                return Ok(());
            }
        };

        for entry in manifest.exporters {
            let (Some(name), Some(module)) = (entry.name, entry.path) else {
                warn!("manifest entry missing name or path, skipped");
                continue;
            };
            match builtin_kind(&module) {
                Some(factory) => {
                    self.register(&name, factory);
                    info!(exporter = name, module, "loaded exporter from manifest");
                }
                None => {
                    warn!(exporter = name, module, "unknown exporter module, skipped");
                }
            }
        }
        Ok(())
    }

    /// Scan a directory for exporter modules.
    ///
    /// Files whose stem matches the `*exporter` naming convention are
    /// resolved against the built-in kind table and registered under the
    /// exporter's self-reported name. Non-conforming files are skipped with
    /// a warning; the scan never aborts on a single bad file.
    pub fn load_from_directory(&mut self, dir: &Path) -> Result<()> {
        let reader = match fs::read_dir(dir) {
            Ok(reader) => reader,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "cannot read exporter directory");
                return Ok(());
            }
        };

        for dir_entry in reader.flatten() {
            let path = dir_entry.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if !stem.to_lowercase().ends_with("exporter") {
                continue;
            }
            match builtin_kind(stem) {
                Some(factory) => {
                    let instance = factory();
                    let name = instance.name();
                    self.register(name, factory);
                    info!(exporter = name, file = %path.display(), "loaded exporter");
                }
                None => {
                    warn!(file = %path.display(), "not a known exporter module, skipped");
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ExporterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterRegistry")
            .field("registered", &self.order)
            .field("cached", &self.instances.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// Built-in Kind Table
// =============================================================================

/// Resolve a module reference (manifest path or file stem) to a built-in
/// exporter factory. Matching is by file stem with an optional "exporter"
/// suffix, case-insensitive: `markdownExporter.js`, `markdown_exporter`,
/// and `markdown` all resolve to the Markdown backend.
fn builtin_kind(module: &str) -> Option<ExporterFactory> {
    let stem = Path::new(module)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(module)
        .to_lowercase();
    let kind = stem
        .trim_end_matches("exporter")
        .trim_end_matches(['_', '-']);

    match kind {
        "confluence" => Some(Box::new(|| Arc::new(ConfluenceExporter::new()))),
        "markdown" => Some(Box::new(|| Arc::new(MarkdownExporter::new()))),
        "html" => Some(Box::new(|| Arc::new(HtmlExporter::new()))),
        "pdf" => Some(Box::new(|| Arc::new(PdfExporter::new()))),
        _ => None,
    }
}

// =============================================================================
// Manifest Shape
// =============================================================================

#[derive(Debug, Deserialize)]
struct ExporterManifest {
    #[serde(default)]
    exporters: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    name: Option<String>,
    path: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtins_in_registration_order() {
        let registry = ExporterRegistry::with_builtins();
        assert_eq!(
            registry.available_exporters(),
            vec!["confluence", "markdown", "html", "pdf"]
        );
        assert!(registry.has_exporter("markdown"));
        assert!(!registry.has_exporter("wiki"));
    }

    #[test]
    fn test_get_exporter_caches_instance() {
        let mut registry = ExporterRegistry::with_builtins();
        let first = registry.get_exporter("markdown").unwrap();
        let second = registry.get_exporter("markdown").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_reregistration_evicts_cached_instance() {
        let mut registry = ExporterRegistry::with_builtins();
        let before = registry.get_exporter("markdown").unwrap();

        registry.register("markdown", || Arc::new(MarkdownExporter::new()));
        let after = registry.get_exporter("markdown").unwrap();
        assert!(!Arc::ptr_eq(&before, &after));

        // The replacement occupies the original slot.
        assert_eq!(
            registry.available_exporters(),
            vec!["confluence", "markdown", "html", "pdf"]
        );
    }

    #[test]
    fn test_unknown_exporter_lookup() {
        let mut registry = ExporterRegistry::with_builtins();
        assert!(registry.get_exporter("nope").is_none());
    }

    #[test]
    fn test_manifest_name_wins_over_self_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"exporters": [
                {{"name": "wiki", "path": "./exporters/confluenceExporter.js"}},
                {{"name": "broken", "path": "./exporters/teleporter.js"}},
                {{"path": "./exporters/markdownExporter.js"}}
            ]}}"#
        )
        .unwrap();

        let mut registry = ExporterRegistry::new();
        registry.load_from_manifest(file.path()).unwrap();

        // Good entry registered under the manifest name; bad entries skipped.
        assert_eq!(registry.available_exporters(), vec!["wiki"]);
        let exporter = registry.get_exporter("wiki").unwrap();
        assert_eq!(exporter.name(), "confluence");
    }

    #[test]
    fn test_missing_manifest_is_not_an_error() {
        let mut registry = ExporterRegistry::new();
        registry
            .load_from_manifest(Path::new("/nonexistent/exporters.json"))
            .unwrap();
        assert!(registry.available_exporters().is_empty());
    }

    #[test]
    fn test_malformed_manifest_warns_and_continues() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json at all").unwrap();

        let mut registry = ExporterRegistry::new();
        registry.load_from_manifest(file.path()).unwrap();
        assert!(registry.available_exporters().is_empty());
    }

    #[test]
    fn test_unreadable_manifest_warns_and_continues() {
        // A directory passes the existence check but cannot be read as a
        // file, standing in for any I/O failure on the manifest path.
        let dir = tempfile::tempdir().unwrap();

        let mut registry = ExporterRegistry::new();
        registry.load_from_manifest(dir.path()).unwrap();
        assert!(registry.available_exporters().is_empty());
    }

    #[test]
    fn test_directory_scan_skips_non_conforming_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "markdownExporter.js",
            "htmlExporter.js",
            "helpers.js",
            "teleporterExporter.js",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let mut registry = ExporterRegistry::new();
        registry.load_from_directory(dir.path()).unwrap();

        let mut names = registry.available_exporters();
        names.sort();
        assert_eq!(names, vec!["html", "markdown"]);
    }

    #[test]
    fn test_builtin_kind_naming_variants() {
        for module in [
            "markdown",
            "markdownExporter",
            "markdown_exporter",
            "./plugins/markdownExporter.js",
        ] {
            assert!(builtin_kind(module).is_some(), "should resolve: {}", module);
        }
        assert!(builtin_kind("teleporter").is_none());
    }
}
