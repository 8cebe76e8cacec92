//! HTML Exporter
//!
//! Renders export content into a single self-contained HTML page with an
//! embedded stylesheet, an optional table of contents and a generation
//! footer. All entry text is HTML-escaped before insertion.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use super::{validation_gate, ExportContent, ExportOptions, ExportResult, Exporter};
use crate::types::{DocError, Entry, Result};

const DEFAULT_STYLES: &str = r#"
body {
  font-family: system-ui, -apple-system, 'Segoe UI', Roboto, sans-serif;
  line-height: 1.6;
  margin: 0;
  color: #333;
}
.theme-dark { background-color: #222; color: #eee; }
.theme-light { background-color: #fff; color: #333; }
.container { display: flex; max-width: 1200px; margin: 0 auto; padding: 1rem; }
header { background-color: #f4f4f4; padding: 1rem; border-bottom: 1px solid #ddd; }
.theme-dark header { background-color: #333; border-bottom: 1px solid #444; }
nav.toc { width: 250px; padding-right: 1rem; position: sticky; top: 0; align-self: flex-start; }
main { flex: 1; min-width: 0; }
footer { text-align: center; padding: 1rem; font-size: 0.875rem; color: #777; border-top: 1px solid #ddd; }
pre { background-color: #f5f5f5; padding: 1rem; border-radius: 5px; overflow-x: auto; }
.theme-dark pre { background-color: #333; }
.toc ul { list-style-type: none; padding-left: 1.5rem; }
.toc a { text-decoration: none; color: #0066cc; }
"#;

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HtmlConfig {
    pub styles: StyleConfig,
    pub scripts: ScriptConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    /// Theme class on `<body>`: light, dark or auto.
    pub theme: String,

    /// Replacement for the embedded stylesheet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_styles: Option<String>,

    /// Stylesheet URLs linked from `<head>`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_stylesheets: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScriptConfig {
    /// Script body emitted in a trailing `<script>` tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_script: Option<String>,

    /// Script URLs included before the inline script.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_scripts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DisplayConfig {
    pub table_of_contents: bool,

    /// Generation date footer.
    pub meta_info: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            inline_styles: None,
            external_stylesheets: Vec::new(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            table_of_contents: true,
            meta_info: true,
        }
    }
}

impl HtmlConfig {
    /// Deep-merge a loaded JSON object over the defaults; each sub-object
    /// merges field-wise so partial configs keep the remaining defaults.
    fn merged_with(mut self, loaded: &Value) -> Self {
        if let Some(styles) = loaded.get("styles") {
            if let Some(s) = styles.get("theme").and_then(Value::as_str) {
                self.styles.theme = s.to_string();
            }
            if let Some(s) = styles.get("inlineStyles").and_then(Value::as_str) {
                self.styles.inline_styles = Some(s.to_string());
            }
            if let Some(list) = styles.get("externalStylesheets").and_then(Value::as_array) {
                self.styles.external_stylesheets = list
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
            }
        }
        if let Some(scripts) = loaded.get("scripts") {
            if let Some(s) = scripts.get("inlineScript").and_then(Value::as_str) {
                self.scripts.inline_script = Some(s.to_string());
            }
            if let Some(list) = scripts.get("externalScripts").and_then(Value::as_array) {
                self.scripts.external_scripts = list
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
            }
        }
        if let Some(display) = loaded.get("display") {
            if let Some(b) = display.get("tableOfContents").and_then(Value::as_bool) {
                self.display.table_of_contents = b;
            }
            if let Some(b) = display.get("metaInfo").and_then(Value::as_bool) {
                self.display.meta_info = b;
            }
        }
        self
    }
}

// =============================================================================
// Exporter
// =============================================================================

#[derive(Debug, Default)]
pub struct HtmlExporter;

impl HtmlExporter {
    pub fn new() -> Self {
        Self
    }

    fn load_typed_config(&self, config_path: Option<&Path>) -> Result<HtmlConfig> {
        let default_path = self.default_config_path();
        let path = config_path.unwrap_or(&default_path);
        if !path.exists() {
            return Ok(HtmlConfig::default());
        }
        let raw = fs::read_to_string(path)
            .map_err(|e| DocError::exporter_config("html", e.to_string()))?;
        let loaded: Value = serde_json::from_str(&raw)
            .map_err(|e| DocError::exporter_config("html", e.to_string()))?;
        Ok(HtmlConfig::default().merged_with(&loaded))
    }

    fn generate(
        &self,
        config: &HtmlConfig,
        content: &ExportContent,
        options: &ExportOptions,
    ) -> String {
        let title = options.title.as_deref().unwrap_or("Documentation");
        let entries = content.entries.as_deref().unwrap_or(&[]);
        let show_toc = config.display.table_of_contents && !entries.is_empty();

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str("  <meta charset=\"UTF-8\">\n");
        html.push_str(
            "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        html.push_str(&format!("  <title>{}</title>\n", escape_html(title)));
        for sheet in &config.styles.external_stylesheets {
            html.push_str(&format!(
                "  <link rel=\"stylesheet\" href=\"{}\">\n",
                escape_html(sheet)
            ));
        }
        let styles = config
            .styles
            .inline_styles
            .as_deref()
            .unwrap_or(DEFAULT_STYLES);
        html.push_str(&format!("  <style>{}</style>\n", styles));
        html.push_str("</head>\n");
        html.push_str(&format!("<body class=\"theme-{}\">\n", config.styles.theme));
        html.push_str(&format!(
            "<header>\n  <h1>{}</h1>\n</header>\n",
            escape_html(title)
        ));
        html.push_str("<div class=\"container\">\n");

        if show_toc {
            html.push_str("<nav class=\"toc\">\n<h2>Table of Contents</h2>\n");
            html.push_str(&self.table_of_contents(entries, options.by_category));
            html.push_str("</nav>\n");
        }

        html.push_str("<main>\n");
        if let Some(raw) = &content.raw_content {
            html.push_str(raw);
        } else if options.by_category {
            for (category, members) in categorized(entries) {
                html.push_str(&format!(
                    "<section id=\"{}\" class=\"category\">\n<h2>{}</h2>\n",
                    slugify(&category),
                    escape_html(&category)
                ));
                for entry in members {
                    html.push_str(&entry_section(entry, 3));
                }
                html.push_str("</section>\n");
            }
        } else {
            for entry in entries {
                html.push_str(&entry_section(entry, 2));
            }
        }
        html.push_str("</main>\n</div>\n");

        html.push_str("<footer>\n");
        if config.display.meta_info {
            html.push_str(&format!(
                "  <div class=\"meta\">Generated on {}</div>\n",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ));
        }
        html.push_str("</footer>\n");

        for script in &config.scripts.external_scripts {
            html.push_str(&format!(
                "<script src=\"{}\"></script>\n",
                escape_html(script)
            ));
        }
        if let Some(inline) = &config.scripts.inline_script {
            html.push_str(&format!("<script>{}</script>\n", inline));
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    fn table_of_contents(&self, entries: &[Entry], by_category: bool) -> String {
        let mut toc = String::from("<ul>\n");
        if by_category {
            for (category, members) in categorized(entries) {
                toc.push_str(&format!(
                    "<li><a href=\"#{}\">{}</a><ul>\n",
                    slugify(&category),
                    escape_html(&category)
                ));
                for entry in members {
                    if let Some(title) = &entry.title {
                        toc.push_str(&format!(
                            "<li><a href=\"#{}\">{}</a></li>\n",
                            slugify(title),
                            escape_html(title)
                        ));
                    }
                }
                toc.push_str("</ul></li>\n");
            }
        } else {
            for entry in entries {
                if let Some(title) = &entry.title {
                    toc.push_str(&format!(
                        "<li><a href=\"#{}\">{}</a></li>\n",
                        slugify(title),
                        escape_html(title)
                    ));
                }
            }
        }
        toc.push_str("</ul>\n");
        toc
    }
}

fn entry_section(entry: &Entry, heading_level: u8) -> String {
    let title = entry.title.as_deref().unwrap_or_default();
    let mut section = format!(
        "<section id=\"{}\" class=\"entry\">\n<h{lvl}>{}</h{lvl}>\n",
        slugify(title),
        escape_html(title),
        lvl = heading_level
    );
    section.push_str(&format!(
        "<div class=\"content\">{}</div>\n",
        escape_html(entry.content.as_deref().unwrap_or_default())
    ));
    if let Some(code) = &entry.code {
        if !code.is_empty() {
            section.push_str("<div class=\"code-examples\">\n");
            for (lang, snippet) in code {
                section.push_str(&format!(
                    "<h4>{}</h4>\n<pre><code class=\"language-{}\">{}</code></pre>\n",
                    escape_html(lang),
                    escape_html(lang),
                    escape_html(snippet)
                ));
            }
            section.push_str("</div>\n");
        }
    }
    section.push_str("</section>\n");
    section
}

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

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_dash = false;
    for ch in text.to_lowercase().chars() {
        if ch.is_alphanumeric() || ch == '_' {
            slug.push(ch);
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-') && !last_dash && !slug.is_empty() {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

#[async_trait]
impl Exporter for HtmlExporter {
    fn name(&self) -> &'static str {
        "html"
    }

    fn description(&self) -> &'static str {
        "Exports documentation to HTML files"
    }

    fn supported_formats(&self) -> &'static [&'static str] {
        &["html", "htm", "xhtml"]
    }

    fn default_config_path(&self) -> PathBuf {
        PathBuf::from("config/html.json")
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
                warn!(error = %err, "could not load HTML config, using defaults");
                HtmlConfig::default()
            }
        };

        if let Some(failure) = validation_gate(self, content, options) {
            return failure;
        }

        let html = self.generate(&config, content, options);
        let byte_count = html.len();
        let line_count = html.lines().count();

        if let Some(output_file) = &options.output_file {
            if let Some(parent) = output_file.parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(err) = fs::create_dir_all(parent) {
                        return ExportResult::fail(format!("Failed to export to HTML: {}", err));
                    }
                }
            }
            if let Err(err) = fs::write(output_file, &html) {
                return ExportResult::fail(format!("Failed to export to HTML: {}", err));
            }
            return ExportResult::ok(json!({
                "outputFile": output_file,
                "byteCount": byte_count,
                "lineCount": line_count,
            }));
        }

        ExportResult::ok(json!({
            "content": html,
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
            Entry::new("Login", "How to <log> in").with_category("Auth"),
            Entry::new("Ports", "Open ports").with_category("Network"),
        ]
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#039;"
        );
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("API & Auth!"), "api-auth");
    }

    #[test]
    fn test_config_deep_merge_keeps_sibling_defaults() {
        let loaded = json!({"styles": {"theme": "dark"}, "display": {"metaInfo": false}});
        let config = HtmlConfig::default().merged_with(&loaded);
        assert_eq!(config.styles.theme, "dark");
        assert!(!config.display.meta_info);
        // Untouched nested field keeps its default.
        assert!(config.display.table_of_contents);
    }

    #[tokio::test]
    async fn test_export_escapes_entry_content() {
        let exporter = HtmlExporter::new();
        let content = ExportContent::from_entries(entries());
        let result = exporter.export(&content, &ExportOptions::default()).await;
        assert!(result.success);
        let details = result.details.unwrap();
        let html = details["content"].as_str().unwrap();
        assert!(html.contains("How to &lt;log&gt; in"));
        assert!(html.contains("class=\"theme-light\""));
        assert!(html.contains("<h2>Table of Contents</h2>"));
    }

    #[tokio::test]
    async fn test_export_by_category_sections() {
        let exporter = HtmlExporter::new();
        let content = ExportContent::from_entries(entries());
        let options = ExportOptions {
            by_category: true,
            ..Default::default()
        };
        let result = exporter.export(&content, &options).await;
        let details = result.details.unwrap();
        let html = details["content"].as_str().unwrap();
        assert!(html.contains("<section id=\"auth\" class=\"category\">"));
        assert!(html.contains("<h3>Login</h3>"));
    }

    #[tokio::test]
    async fn test_export_with_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"styles": {{"theme": "dark"}}, "display": {{"tableOfContents": false}}}}"#
        )
        .unwrap();

        let exporter = HtmlExporter::new();
        let content = ExportContent::from_entries(entries());
        let options = ExportOptions {
            config_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let result = exporter.export(&content, &options).await;
        let details = result.details.unwrap();
        let html = details["content"].as_str().unwrap();
        assert!(html.contains("class=\"theme-dark\""));
        assert!(!html.contains("Table of Contents"));
    }

    #[tokio::test]
    async fn test_export_writes_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("site/index.html");
        let exporter = HtmlExporter::new();
        let content = ExportContent::from_raw("<p>raw</p>");
        let options = ExportOptions {
            output_file: Some(target.clone()),
            ..Default::default()
        };
        let result = exporter.export(&content, &options).await;
        assert!(result.success);
        let written = fs::read_to_string(&target).unwrap();
        assert!(written.contains("<p>raw</p>"));
    }

    #[tokio::test]
    async fn test_validate_before_export_fails_closed() {
        let exporter = HtmlExporter::new();
        let options = ExportOptions {
            validate_before_export: true,
            ..Default::default()
        };
        let result = exporter.export(&ExportContent::default(), &options).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("No content to export"));
    }
}
