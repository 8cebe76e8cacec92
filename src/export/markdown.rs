//! Markdown Exporter
//!
//! Generates Markdown documentation from export content, with an optional
//! table of contents, category grouping and fenced code blocks. Writes to
//! `output_file` when given, otherwise returns the generated document in
//! the result details.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use super::{validation_gate, ExportContent, ExportOptions, ExportResult, Exporter};
use crate::types::{DocError, Entry, Result};

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkdownConfig {
    /// Markdown flavor; cosmetic, recorded in the config for consumers.
    pub flavor: String,

    /// Heading level for section titles.
    pub heading_level: u8,

    /// Character used for bullet points.
    pub bullet_char: String,

    /// Whether to prepend a table of contents.
    pub table_of_contents: bool,

    pub code_blocks: CodeBlockConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodeBlockConfig {
    /// Add language identifiers to fenced code blocks.
    pub add_language: bool,

    /// Language used when an entry's code map key is empty.
    pub default_language: String,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            flavor: "github".to_string(),
            heading_level: 2,
            bullet_char: "-".to_string(),
            table_of_contents: true,
            code_blocks: CodeBlockConfig::default(),
        }
    }
}

impl Default for CodeBlockConfig {
    fn default() -> Self {
        Self {
            add_language: true,
            default_language: "text".to_string(),
        }
    }
}

impl MarkdownConfig {
    /// Deep-merge a loaded JSON object over the defaults. Known sub-objects
    /// are merged field-wise rather than shallow-overwritten.
    fn merged_with(mut self, loaded: &Value) -> Self {
        if let Some(s) = loaded.get("flavor").and_then(Value::as_str) {
            self.flavor = s.to_string();
        }
        if let Some(n) = loaded.get("headingLevel").and_then(Value::as_u64) {
            self.heading_level = n.min(u8::MAX as u64) as u8;
        }
        if let Some(s) = loaded.get("bulletChar").and_then(Value::as_str) {
            self.bullet_char = s.to_string();
        }
        if let Some(b) = loaded.get("tableOfContents").and_then(Value::as_bool) {
            self.table_of_contents = b;
        }
        if let Some(blocks) = loaded.get("codeBlocks") {
            if let Some(b) = blocks.get("addLanguage").and_then(Value::as_bool) {
                self.code_blocks.add_language = b;
            }
            if let Some(s) = blocks.get("defaultLanguage").and_then(Value::as_str) {
                self.code_blocks.default_language = s.to_string();
            }
        }
        self
    }
}

// =============================================================================
// Exporter
// =============================================================================

#[derive(Debug, Default)]
pub struct MarkdownExporter;

impl MarkdownExporter {
    pub fn new() -> Self {
        Self
    }

    /// Load and deep-merge the typed configuration. A missing file falls
    /// back to defaults; malformed JSON is a hard failure of the call.
    fn load_typed_config(&self, config_path: Option<&Path>) -> Result<MarkdownConfig> {
        let default_path = self.default_config_path();
        let path = config_path.unwrap_or(&default_path);
        if !path.exists() {
            return Ok(MarkdownConfig::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| DocError::exporter_config("markdown", e.to_string()))?;
        let loaded: Value = serde_json::from_str(&raw)
            .map_err(|e| DocError::exporter_config("markdown", e.to_string()))?;
        Ok(MarkdownConfig::default().merged_with(&loaded))
    }

    fn generate(
        &self,
        config: &MarkdownConfig,
        content: &ExportContent,
        options: &ExportOptions,
    ) -> String {
        let mut markdown = String::new();

        if let Some(title) = &options.title {
            markdown.push_str(&format!("# {}\n\n", title));
        }

        let entries = content.entries.as_deref().unwrap_or(&[]);

        if config.table_of_contents && !entries.is_empty() {
            markdown.push_str(&self.table_of_contents(config, entries));
        }

        // Raw content bypasses entry-based rendering entirely.
        if let Some(raw) = &content.raw_content {
            markdown.push_str(raw);
            return markdown;
        }

        if options.by_category {
            for (category, members) in categorized(entries) {
                markdown.push_str(&format!(
                    "{} {}\n\n",
                    "#".repeat(config.heading_level as usize),
                    category
                ));
                for entry in members {
                    self.push_entry(&mut markdown, config, entry, config.heading_level + 1);
                }
            }
        } else {
            for entry in entries {
                self.push_entry(&mut markdown, config, entry, config.heading_level);
            }
        }

        markdown
    }

    fn push_entry(&self, markdown: &mut String, config: &MarkdownConfig, entry: &Entry, level: u8) {
        markdown.push_str(&format!(
            "{} {}\n\n",
            "#".repeat(level as usize),
            entry.title.as_deref().unwrap_or_default()
        ));
        markdown.push_str(&format!(
            "{}\n\n",
            entry.content.as_deref().unwrap_or_default()
        ));
        if let Some(code) = &entry.code {
            for (lang, snippet) in code {
                let indicator = if config.code_blocks.add_language {
                    if lang.is_empty() {
                        config.code_blocks.default_language.as_str()
                    } else {
                        lang.as_str()
                    }
                } else {
                    ""
                };
                markdown.push_str(&format!("```{}\n{}\n```\n\n", indicator, snippet));
            }
        }
    }

    fn table_of_contents(&self, config: &MarkdownConfig, entries: &[Entry]) -> String {
        let bullet = &config.bullet_char;
        let mut toc = String::from("## Table of Contents\n\n");
        let has_categories = entries.iter().any(|e| e.category.is_some());

        if has_categories {
            // Grouped mode lists real categories only; entries without one
            // are left out of the table of contents.
            let mut categories: Vec<&str> = Vec::new();
            for entry in entries {
                if let Some(category) = entry.category.as_deref() {
                    if !categories.contains(&category) {
                        categories.push(category);
                    }
                }
            }
            for category in categories {
                toc.push_str(&format!("{} [{}](#{})\n", bullet, category, slugify(category)));
                for entry in entries
                    .iter()
                    .filter(|e| e.category.as_deref() == Some(category))
                {
                    if let Some(title) = &entry.title {
                        toc.push_str(&format!(
                            "  {} [{}](#{})\n",
                            bullet,
                            title,
                            slugify(title)
                        ));
                    }
                }
            }
        } else {
            for entry in entries {
                if let Some(title) = &entry.title {
                    toc.push_str(&format!("{} [{}](#{})\n", bullet, title, slugify(title)));
                }
            }
        }
        toc.push_str("\n\n");
        toc
    }
}

/// Group entries by category in first-seen order, keeping uncategorized
/// entries under "Uncategorized".
fn categorized(entries: &[Entry]) -> Vec<(String, Vec<&Entry>)> {
    let mut groups: Vec<(String, Vec<&Entry>)> = Vec::new();
    for entry in entries {
        let category = entry
            .category
            .clone()
            .unwrap_or_else(|| "Uncategorized".to_string());
        match groups.iter_mut().find(|(name, _)| *name == category) {
            Some((_, members)) => members.push(entry),
            None => groups.push((category, vec![entry])),
        }
    }
    groups
}

/// URL-friendly anchor slug.
fn slugify(text: &str) -> String {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();
    static HYPHENS: OnceLock<Regex> = OnceLock::new();

    let non_word = NON_WORD.get_or_init(|| Regex::new(r"[^\w\s-]").expect("static regex"));
    let spaces = SPACES.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    let hyphens = HYPHENS.get_or_init(|| Regex::new(r"--+").expect("static regex"));

    let lowered = text.to_lowercase();
    let cleaned = non_word.replace_all(&lowered, "");
    let dashed = spaces.replace_all(&cleaned, "-");
    hyphens.replace_all(&dashed, "-").into_owned()
}

#[async_trait]
impl Exporter for MarkdownExporter {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn description(&self) -> &'static str {
        "Exports documentation to Markdown files"
    }

    fn supported_formats(&self) -> &'static [&'static str] {
        &["md", "markdown", "gfm", "commonmark"]
    }

    fn default_config_path(&self) -> PathBuf {
        PathBuf::from("config/markdown.json")
    }

    async fn is_configured(&self) -> bool {
        // No external connection required; always ready.
        true
    }

    async fn load_config(&self, config_path: Option<&Path>) -> Result<Value> {
        let config = self.load_typed_config(config_path)?;
        Ok(serde_json::to_value(config)?)
    }

    async fn export(&self, content: &ExportContent, options: &ExportOptions) -> ExportResult {
        let config = match self.load_typed_config(options.config_path.as_deref()) {
            Ok(config) => config,
            Err(err) => {
                // Per-call config failure should not lose the export; fall
                // back to defaults, matching the established behavior.
                warn!(error = %err, "could not load Markdown config, using defaults");
                MarkdownConfig::default()
            }
        };

        if let Some(failure) = validation_gate(self, content, options) {
            return failure;
        }

        let markdown = self.generate(&config, content, options);
        let byte_count = markdown.len();
        let line_count = markdown.lines().count();

        if let Some(output_file) = &options.output_file {
            if let Some(parent) = output_file.parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(err) = fs::create_dir_all(parent) {
                        return ExportResult::fail(format!(
                            "Failed to export to Markdown: {}",
                            err
                        ));
                    }
                }
            }
            if let Err(err) = fs::write(output_file, &markdown) {
                return ExportResult::fail(format!("Failed to export to Markdown: {}", err));
            }
            return ExportResult::ok(json!({
                "outputFile": output_file,
                "byteCount": byte_count,
                "lineCount": line_count,
            }));
        }

        ExportResult::ok(json!({
            "content": markdown,
            "byteCount": byte_count,
            "lineCount": line_count,
        }))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn entries() -> Vec<Entry> {
        vec![
            Entry::new("Login", "How to log in").with_category("Auth"),
            Entry::new("Logout", "How to log out").with_category("Auth"),
            Entry::new("Ports", "Open ports").with_category("Network"),
        ]
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("API & Auth!"), "api-auth");
        assert_eq!(slugify("a  -  b"), "a-b");
    }

    #[test]
    fn test_toc_flat_list_when_no_entry_has_a_category() {
        let exporter = MarkdownExporter::new();
        let entries = vec![Entry::new("First", "a"), Entry::new("Second", "b")];
        let toc = exporter.table_of_contents(&MarkdownConfig::default(), &entries);
        assert!(toc.contains("- [First](#first)\n"));
        assert!(toc.contains("- [Second](#second)\n"));
        assert!(!toc.contains("Uncategorized"));
        assert!(!toc.contains("  - "));
    }

    #[test]
    fn test_toc_grouped_omits_uncategorized_entries() {
        let exporter = MarkdownExporter::new();
        let entries = vec![
            Entry::new("Login", "a").with_category("Auth"),
            Entry::new("Orphan", "b"),
        ];
        let toc = exporter.table_of_contents(&MarkdownConfig::default(), &entries);
        assert!(toc.contains("- [Auth](#auth)\n"));
        assert!(toc.contains("  - [Login](#login)\n"));
        assert!(!toc.contains("Orphan"));
    }

    #[test]
    fn test_config_deep_merge() {
        let loaded = json!({"headingLevel": 3, "codeBlocks": {"addLanguage": false}});
        let config = MarkdownConfig::default().merged_with(&loaded);
        assert_eq!(config.heading_level, 3);
        assert!(!config.code_blocks.add_language);
        // Untouched nested field keeps its default.
        assert_eq!(config.code_blocks.default_language, "text");
        assert_eq!(config.bullet_char, "-");
    }

    #[tokio::test]
    async fn test_load_config_missing_file_yields_defaults() {
        let exporter = MarkdownExporter::new();
        let config = exporter
            .load_config(Some(Path::new("/nonexistent/markdown.json")))
            .await
            .unwrap();
        assert_eq!(config["headingLevel"], 2);
    }

    #[tokio::test]
    async fn test_load_config_malformed_json_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ nope").unwrap();
        let exporter = MarkdownExporter::new();
        let err = exporter.load_config(Some(file.path())).await.unwrap_err();
        assert!(matches!(err, DocError::ExporterConfig { .. }));
    }

    #[tokio::test]
    async fn test_export_returns_content_with_counts() {
        let exporter = MarkdownExporter::new();
        let content = ExportContent::from_entries(entries());
        let result = exporter.export(&content, &ExportOptions::default()).await;
        assert!(result.success);
        let details = result.details.unwrap();
        let md = details["content"].as_str().unwrap();
        assert!(md.contains("## Login"));
        assert!(details["byteCount"].as_u64().unwrap() > 0);
        assert!(details["lineCount"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_export_by_category_groups_entries() {
        let exporter = MarkdownExporter::new();
        let content = ExportContent::from_entries(entries());
        let options = ExportOptions {
            by_category: true,
            title: Some("Handbook".into()),
            ..Default::default()
        };
        let result = exporter.export(&content, &options).await;
        let details = result.details.unwrap();
        let md = details["content"].as_str().unwrap();
        assert!(md.starts_with("# Handbook"));
        assert!(md.contains("## Auth"));
        assert!(md.contains("### Login"));
        assert!(md.contains("## Network"));
    }

    #[tokio::test]
    async fn test_export_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("docs/out.md");
        let exporter = MarkdownExporter::new();
        let content = ExportContent::from_raw("# Raw document\n");
        let options = ExportOptions {
            output_file: Some(target.clone()),
            ..Default::default()
        };
        let result = exporter.export(&content, &options).await;
        assert!(result.success);
        assert_eq!(fs::read_to_string(&target).unwrap(), "# Raw document\n");
        assert_eq!(
            result.details.unwrap()["outputFile"],
            json!(target)
        );
    }

    #[tokio::test]
    async fn test_validate_before_export_fails_closed() {
        let exporter = MarkdownExporter::new();
        let content = ExportContent::default();
        let options = ExportOptions {
            validate_before_export: true,
            ..Default::default()
        };
        let result = exporter.export(&content, &options).await;
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Validation failed"));
        let details = result.details.unwrap();
        assert_eq!(details["validation"]["valid"], json!(false));
    }

    #[tokio::test]
    async fn test_raw_content_bypasses_entries() {
        let exporter = MarkdownExporter::new();
        let content = ExportContent {
            entries: Some(entries()),
            raw_content: Some("pass-through".into()),
        };
        let result = exporter.export(&content, &ExportOptions::default()).await;
        let details = result.details.unwrap();
        let md = details["content"].as_str().unwrap();
        assert!(md.contains("pass-through"));
        assert!(!md.contains("## Login"));
    }
}
