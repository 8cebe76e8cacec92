//! PDF Exporter
//!
//! Renders export content into a paginated A4 PDF using the built-in
//! Helvetica fonts. Text is flowed line by line with manual page breaks;
//! code snippets use Courier. This exporter always writes to a file, so
//! `output_file` is required.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex, PdfPageIndex};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use super::{validation_gate, ExportContent, ExportOptions, ExportResult, Exporter};
use crate::types::{DocError, Entry, Result};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PdfConfig {
    pub font_size: FontSizes,

    /// Page margin in millimeters on all four sides.
    pub page_margin_mm: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontSizes {
    pub title: f32,
    pub heading: f32,
    pub body: f32,
    pub code: f32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            font_size: FontSizes::default(),
            page_margin_mm: 20.0,
        }
    }
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            title: 24.0,
            heading: 18.0,
            body: 12.0,
            code: 10.0,
        }
    }
}

impl PdfConfig {
    fn merged_with(mut self, loaded: &Value) -> Self {
        if let Some(sizes) = loaded.get("fontSize") {
            if let Some(n) = sizes.get("title").and_then(Value::as_f64) {
                self.font_size.title = n as f32;
            }
            if let Some(n) = sizes.get("heading").and_then(Value::as_f64) {
                self.font_size.heading = n as f32;
            }
            if let Some(n) = sizes.get("body").and_then(Value::as_f64) {
                self.font_size.body = n as f32;
            }
            if let Some(n) = sizes.get("code").and_then(Value::as_f64) {
                self.font_size.code = n as f32;
            }
        }
        if let Some(n) = loaded.get("pageMarginMm").and_then(Value::as_f64) {
            self.page_margin_mm = n as f32;
        }
        self
    }
}

// =============================================================================
// Page Writer
// =============================================================================

/// Tracks the text cursor across pages, breaking to a fresh page when the
/// bottom margin is reached.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    page: PdfPageIndex,
    layer: PdfLayerIndex,
    cursor_y: f32,
    margin: f32,
}

impl<'a> PageWriter<'a> {
    fn new(
        doc: &'a PdfDocumentReference,
        page: PdfPageIndex,
        layer: PdfLayerIndex,
        margin: f32,
    ) -> Self {
        Self {
            doc,
            page,
            layer,
            cursor_y: PAGE_HEIGHT_MM - margin,
            margin,
        }
    }

    fn advance(&mut self, line_height: f32) {
        if self.cursor_y - line_height < self.margin {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.page = page;
            self.layer = layer;
            self.cursor_y = PAGE_HEIGHT_MM - self.margin;
        }
        self.cursor_y -= line_height;
    }

    fn write_line(&mut self, text: &str, font: &IndirectFontRef, size: f32) {
        let line_height = size * 0.5;
        self.advance(line_height);
        let layer = self.doc.get_page(self.page).get_layer(self.layer);
        layer.use_text(text, size, Mm(self.margin), Mm(self.cursor_y), font);
    }

    fn blank(&mut self, height: f32) {
        self.cursor_y -= height;
    }
}

/// Greedy character-count wrap. Helvetica is proportional so this is an
/// approximation, sized for the body font on an A4 text column.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        if paragraph.len() <= max_chars {
            lines.push(paragraph.to_string());
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if !current.is_empty() && current.len() + word.len() + 1 > max_chars {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

// =============================================================================
// Exporter
// =============================================================================

#[derive(Debug, Default)]
pub struct PdfExporter;

impl PdfExporter {
    pub fn new() -> Self {
        Self
    }

    fn load_typed_config(&self, config_path: Option<&Path>) -> Result<PdfConfig> {
        let default_path = self.default_config_path();
        let path = config_path.unwrap_or(&default_path);
        if !path.exists() {
            return Ok(PdfConfig::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| DocError::exporter_config("pdf", e.to_string()))?;
        let loaded: Value = serde_json::from_str(&raw)
            .map_err(|e| DocError::exporter_config("pdf", e.to_string()))?;
        Ok(PdfConfig::default().merged_with(&loaded))
    }

    fn build_document(
        &self,
        config: &PdfConfig,
        content: &ExportContent,
        options: &ExportOptions,
    ) -> Result<(PdfDocumentReference, usize)> {
        let title = options.title.as_deref().unwrap_or("Documentation");
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| DocError::exporter_config("pdf", e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| DocError::exporter_config("pdf", e.to_string()))?;
        let mono = doc
            .add_builtin_font(BuiltinFont::Courier)
            .map_err(|e| DocError::exporter_config("pdf", e.to_string()))?;

        let mut writer = PageWriter::new(&doc, page, layer, config.page_margin_mm);

        // Title block with a generation date line.
        writer.write_line(title, &bold, config.font_size.title);
        writer.write_line(
            &format!("Generated on {}", Local::now().format("%Y-%m-%d")),
            &regular,
            config.font_size.body,
        );
        writer.blank(config.font_size.body);

        let mut entry_count = 0;
        if let Some(raw) = &content.raw_content {
            for line in wrap(raw, 90) {
                writer.write_line(&line, &regular, config.font_size.body);
            }
        } else if let Some(entries) = &content.entries {
            let sections = sectioned(entries, options.by_category);
            for (category, members) in sections {
                if let Some(category) = category {
                    writer.blank(config.font_size.heading * 0.3);
                    writer.write_line(&category, &bold, config.font_size.heading);
                }
                for entry in members {
                    entry_count += 1;
                    writer.blank(config.font_size.body * 0.3);
                    writer.write_line(
                        entry.title.as_deref().unwrap_or_default(),
                        &bold,
                        config.font_size.heading * 0.8,
                    );
                    for line in wrap(entry.content.as_deref().unwrap_or_default(), 90) {
                        writer.write_line(&line, &regular, config.font_size.body);
                    }
                    if let Some(code) = &entry.code {
                        for (lang, snippet) in code {
                            writer.blank(config.font_size.code * 0.3);
                            writer.write_line(
                                &format!("[{}]", lang),
                                &mono,
                                config.font_size.code,
                            );
                            for line in snippet.lines() {
                                writer.write_line(line, &mono, config.font_size.code);
                            }
                        }
                    }
                }
            }
        }

        Ok((doc, entry_count))
    }
}

/// Split entries into optional category sections. Without grouping there is
/// one anonymous section in input order.
fn sectioned(entries: &[Entry], by_category: bool) -> Vec<(Option<String>, Vec<&Entry>)> {
    if !by_category {
        return vec![(None, entries.iter().collect())];
    }
    let mut groups: Vec<(Option<String>, Vec<&Entry>)> = Vec::new();
    for entry in entries {
        let category = entry
            .category
            .clone()
            .unwrap_or_else(|| "Uncategorized".to_string());
        match groups
            .iter_mut()
            .find(|(name, _)| name.as_deref() == Some(category.as_str()))
        {
            Some((_, members)) => members.push(entry),
            None => groups.push((Some(category), vec![entry])),
        }
    }
    groups
}

#[async_trait]
impl Exporter for PdfExporter {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn description(&self) -> &'static str {
        "Exports documentation to PDF files"
    }

    fn supported_formats(&self) -> &'static [&'static str] {
        &["pdf"]
    }

    fn default_config_path(&self) -> PathBuf {
        PathBuf::from("config/pdf.json")
    }

    async fn is_configured(&self) -> bool {
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
                warn!(error = %err, "could not load PDF config, using defaults");
                PdfConfig::default()
            }
        };

        if let Some(failure) = validation_gate(self, content, options) {
            return failure;
        }

        let Some(output_file) = &options.output_file else {
            return ExportResult::fail("PDF export requires an output file");
        };

        let (doc, entry_count) = match self.build_document(&config, content, options) {
            Ok(built) => built,
            Err(err) => return ExportResult::fail(format!("Failed to export to PDF: {}", err)),
        };

        if let Some(parent) = output_file.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = fs::create_dir_all(parent) {
                    return ExportResult::fail(format!("Failed to export to PDF: {}", err));
                }
            }
        }
        let file = match File::create(output_file) {
            Ok(file) => file,
            Err(err) => return ExportResult::fail(format!("Failed to export to PDF: {}", err)),
        };
        if let Err(err) = doc.save(&mut BufWriter::new(file)) {
            return ExportResult::fail(format!("Failed to export to PDF: {}", err));
        }

        ExportResult::ok(json!({
            "outputFile": output_file,
            "entryCount": entry_count,
        }))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<Entry> {
        vec![
            Entry::new("Login", "How to log in").with_category("Auth"),
            Entry::new("Ports", "Open ports").with_category("Network"),
        ]
    }

    #[test]
    fn test_wrap_long_paragraph() {
        let lines = wrap("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
    }

    #[test]
    fn test_wrap_keeps_short_lines() {
        assert_eq!(wrap("short\nlines", 90), vec!["short", "lines"]);
    }

    #[test]
    fn test_config_merge() {
        let loaded = json!({"fontSize": {"body": 11}, "pageMarginMm": 15});
        let config = PdfConfig::default().merged_with(&loaded);
        assert_eq!(config.font_size.body, 11.0);
        assert_eq!(config.font_size.title, 24.0);
        assert_eq!(config.page_margin_mm, 15.0);
    }

    #[test]
    fn test_sectioned_grouping() {
        let all = entries();
        let flat = sectioned(&all, false);
        assert_eq!(flat.len(), 1);
        assert!(flat[0].0.is_none());

        let grouped = sectioned(&all, true);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0.as_deref(), Some("Auth"));
    }

    #[tokio::test]
    async fn test_export_requires_output_file() {
        let exporter = PdfExporter::new();
        let content = ExportContent::from_entries(entries());
        let result = exporter.export(&content, &ExportOptions::default()).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("output file"));
    }

    #[tokio::test]
    async fn test_export_writes_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out/manual.pdf");
        let exporter = PdfExporter::new();
        let content = ExportContent::from_entries(entries());
        let options = ExportOptions {
            title: Some("Manual".into()),
            output_file: Some(target.clone()),
            by_category: true,
            ..Default::default()
        };
        let result = exporter.export(&content, &options).await;
        assert!(result.success, "{:?}", result.error);
        let bytes = fs::read(&target).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(result.details.unwrap()["entryCount"], 2);
    }

    #[tokio::test]
    async fn test_validate_before_export_fails_closed() {
        let exporter = PdfExporter::new();
        let options = ExportOptions {
            validate_before_export: true,
            output_file: Some(PathBuf::from("/tmp/never-written.pdf")),
            ..Default::default()
        };
        let result = exporter.export(&ExportContent::default(), &options).await;
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("Validation failed"));
    }
}
