//! Confluence Exporter
//!
//! Pushes documentation to Confluence pages over the REST API. Pages are
//! matched by title within the configured space: an existing page is
//! updated with a bumped version number, otherwise a new page is created
//! under the optional parent. Markdown content is converted to Confluence
//! storage format before upload.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use super::{validation_gate, ExportContent, ExportOptions, ExportResult, Exporter};
use crate::types::{DocError, Entry, Result};

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfluenceConfig {
    pub base_url: String,
    pub space_key: String,

    /// Parent page for newly created pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_page_id: Option<String>,

    pub auth: ConfluenceAuth,

    /// Labels applied to every exported page.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub default_labels: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfluenceAuth {
    /// "token" (bearer) or "basic".
    pub method: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ConfluenceConfig {
    /// A `$VAR` token value is an indirection through the environment.
    /// An unset variable resolves to an empty token with a warning, which
    /// later fails the configured-check rather than the load.
    fn resolve_env_token(&mut self) {
        if let Some(token) = &self.auth.token {
            if let Some(var) = token.strip_prefix('$') {
                match env::var(var) {
                    Ok(resolved) => self.auth.token = Some(resolved),
                    Err(_) => {
                        warn!(var, "environment variable not found for Confluence token");
                        self.auth.token = Some(String::new());
                    }
                }
            }
        }
    }

    /// Minimum settings for API access: base URL, space key and a complete
    /// auth block for the chosen method.
    fn is_complete(&self) -> bool {
        if self.base_url.is_empty() || self.space_key.is_empty() {
            return false;
        }
        match self.auth.method.as_str() {
            "token" => self.auth.token.as_ref().is_some_and(|t| !t.is_empty()),
            "basic" => {
                self.auth.username.as_ref().is_some_and(|u| !u.is_empty())
                    && self.auth.password.as_ref().is_some_and(|p| !p.is_empty())
            }
            _ => false,
        }
    }
}

// =============================================================================
// Exporter
// =============================================================================

#[derive(Debug, Default)]
pub struct ConfluenceExporter;

impl ConfluenceExporter {
    pub fn new() -> Self {
        Self
    }

    /// Load the typed configuration with the `$VAR` token resolved. Unlike
    /// the file exporters, a missing config file is an error here: there
    /// are no usable compiled-in defaults for a remote endpoint.
    fn load_typed_config(&self, config_path: Option<&Path>) -> Result<ConfluenceConfig> {
        let default_path = self.default_config_path();
        let path = config_path.unwrap_or(&default_path);
        let raw = fs::read_to_string(path)
            .map_err(|e| DocError::exporter_config("confluence", e.to_string()))?;
        let mut config: ConfluenceConfig = serde_json::from_str(&raw)
            .map_err(|e| DocError::exporter_config("confluence", e.to_string()))?;
        config.resolve_env_token();
        Ok(config)
    }

    fn request(
        &self,
        client: &reqwest::Client,
        config: &ConfluenceConfig,
        method: reqwest::Method,
        api_path: &str,
    ) -> Result<reqwest::RequestBuilder> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| DocError::exporter_config("confluence", e.to_string()))?;
        let url = base
            .join(api_path)
            .map_err(|e| DocError::exporter_config("confluence", e.to_string()))?;

        let mut builder = client.request(method, url).header("Accept", "application/json");
        builder = match config.auth.method.as_str() {
            "basic" => builder.basic_auth(
                config.auth.username.as_deref().unwrap_or_default(),
                config.auth.password.as_deref(),
            ),
            _ => builder.bearer_auth(config.auth.token.as_deref().unwrap_or_default()),
        };
        Ok(builder)
    }

    /// Look up a page by title in the configured space. API errors are
    /// logged and treated as "not found" so the export falls through to
    /// page creation.
    async fn find_page_by_title(
        &self,
        client: &reqwest::Client,
        config: &ConfluenceConfig,
        title: &str,
    ) -> Option<Value> {
        let api_path = format!(
            "/rest/api/content?spaceKey={}&title={}&expand=version",
            config.space_key,
            urlencode(title)
        );
        let request = match self.request(client, config, reqwest::Method::GET, &api_path) {
            Ok(request) => request,
            Err(err) => {
                warn!(title, error = %err, "cannot build Confluence lookup request");
                return None;
            }
        };
        let response = match request.send().await.and_then(|r| r.error_for_status()) {
            Ok(response) => response,
            Err(err) => {
                warn!(title, error = %err, "error finding Confluence page");
                return None;
            }
        };
        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                warn!(title, error = %err, "invalid Confluence lookup response");
                return None;
            }
        };
        body.get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
            .cloned()
    }

    /// Create or update a single page and return its identifier.
    async fn push_page(
        &self,
        client: &reqwest::Client,
        config: &ConfluenceConfig,
        title: &str,
        storage_body: &str,
        labels: &[String],
    ) -> Result<String> {
        let label_objects: Vec<Value> = labels.iter().map(|name| json!({"name": name})).collect();
        let body = json!({
            "storage": {"value": storage_body, "representation": "storage"}
        });

        if let Some(existing) = self.find_page_by_title(client, config, title).await {
            let page_id = existing
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let version = existing
                .pointer("/version/number")
                .and_then(Value::as_u64)
                .unwrap_or(1);
            debug!(title, page_id, version, "updating existing Confluence page");

            let update = json!({
                "id": page_id,
                "type": "page",
                "title": title,
                "space": {"key": config.space_key},
                "body": body,
                "version": {"number": version + 1},
                "metadata": {"labels": label_objects},
            });
            let api_path = format!("/rest/api/content/{}", page_id);
            self.request(client, config, reqwest::Method::PUT, &api_path)?
                .json(&update)
                .send()
                .await?
                .error_for_status()?;
            return Ok(page_id);
        }

        debug!(title, "creating new Confluence page");
        let mut create = json!({
            "type": "page",
            "title": title,
            "space": {"key": config.space_key},
            "body": body,
            "metadata": {"labels": label_objects},
        });
        if let Some(parent) = &config.parent_page_id {
            create["ancestors"] = json!([{"id": parent}]);
        }
        let response: Value = self
            .request(client, config, reqwest::Method::POST, "/rest/api/content")?
            .json(&create)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

/// Render a batch of entries as Markdown for conversion to storage format.
fn entries_to_markdown(entries: &[Entry]) -> String {
    let mut markdown = String::new();
    for entry in entries {
        markdown.push_str(&format!(
            "## {}\n\n{}\n\n",
            entry.title.as_deref().unwrap_or_default(),
            entry.content.as_deref().unwrap_or_default()
        ));
        if let Some(code) = &entry.code {
            for (lang, snippet) in code {
                markdown.push_str(&format!("```{}\n{}\n```\n\n", lang, snippet));
            }
        }
    }
    markdown
}

/// Percent-encode a query value. Only the characters that matter for the
/// content API title parameter.
fn urlencode(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[async_trait]
impl Exporter for ConfluenceExporter {
    fn name(&self) -> &'static str {
        "confluence"
    }

    fn description(&self) -> &'static str {
        "Exports documentation to Confluence pages"
    }

    fn supported_formats(&self) -> &'static [&'static str] {
        &["confluence", "wiki"]
    }

    fn default_config_path(&self) -> PathBuf {
        PathBuf::from("config/confluence.json")
    }

    /// Configured means a loadable config with base URL, space key and a
    /// complete auth block. Any failure along the way is a plain `false`.
    async fn is_configured(&self) -> bool {
        match self.load_typed_config(None) {
            Ok(config) => config.is_complete(),
            Err(_) => false,
        }
    }

    async fn load_config(&self, config_path: Option<&Path>) -> Result<Value> {
        let config = self.load_typed_config(config_path)?;
        Ok(serde_json::to_value(config)?)
    }

    async fn export(&self, content: &ExportContent, options: &ExportOptions) -> ExportResult {
        let config = match self.load_typed_config(options.config_path.as_deref()) {
            Ok(config) => config,
            Err(err) => return ExportResult::fail(err.to_string()),
        };
        if !config.is_complete() {
            return ExportResult::fail(
                "Confluence exporter is not configured: baseUrl, spaceKey and auth are required",
            );
        }

        if let Some(failure) = validation_gate(self, content, options) {
            return failure;
        }

        let title = options.title.as_deref().unwrap_or("Documentation");
        let mut labels = config.default_labels.clone();
        labels.extend(options.labels.iter().cloned());

        // One page per category, or a single page for everything.
        let mut pages: Vec<(String, String)> = Vec::new();
        if let Some(raw) = &content.raw_content {
            pages.push((title.to_string(), markdown_to_storage(raw)));
        } else {
            let entries = content.entries.as_deref().unwrap_or(&[]);
            if options.by_category {
                let mut groups: Vec<(String, Vec<Entry>)> = Vec::new();
                for entry in entries {
                    let category = entry
                        .category
                        .clone()
                        .unwrap_or_else(|| "Uncategorized".to_string());
                    match groups.iter_mut().find(|(name, _)| *name == category) {
                        Some((_, members)) => members.push(entry.clone()),
                        None => groups.push((category, vec![entry.clone()])),
                    }
                }
                for (category, members) in groups {
                    pages.push((
                        format!("{} - {}", title, category),
                        markdown_to_storage(&entries_to_markdown(&members)),
                    ));
                }
            } else {
                pages.push((
                    title.to_string(),
                    markdown_to_storage(&entries_to_markdown(entries)),
                ));
            }
        }

        let client = reqwest::Client::new();
        let mut exported: Vec<Value> = Vec::new();
        for (page_title, storage_body) in &pages {
            match self
                .push_page(&client, &config, page_title, storage_body, &labels)
                .await
            {
                Ok(id) => exported.push(json!({"title": page_title, "id": id})),
                Err(err) => {
                    return ExportResult::fail_with_details(
                        format!("Failed to export to Confluence: {}", err),
                        json!({"pages": exported}),
                    );
                }
            }
        }

        ExportResult::ok(json!({
            "spaceKey": config.space_key,
            "pageCount": exported.len(),
            "pages": exported,
        }))
    }
}

// =============================================================================
// Markdown to Storage Format
// =============================================================================

/// Convert Markdown to Confluence storage format.
///
/// Covers the constructs the pipeline emits: ATX headings, fenced code
/// blocks as code macros, bold/italic/inline code, links (with the
/// `confluence:` scheme for internal page links), bullet lists and
/// paragraphs.
pub fn markdown_to_storage(markdown: &str) -> String {
    let mut html = String::new();
    let mut lines = markdown.lines().peekable();
    let mut in_list = false;

    while let Some(line) = lines.next() {
        // Fenced code block as a code macro.
        if let Some(fence) = line.strip_prefix("```") {
            let language = fence.trim();
            let mut code = String::new();
            for code_line in lines.by_ref() {
                if code_line.starts_with("```") {
                    break;
                }
                code.push_str(code_line);
                code.push('\n');
            }
            close_list(&mut html, &mut in_list);
            html.push_str("<ac:structured-macro ac:name=\"code\">");
            if !language.is_empty() {
                html.push_str(&format!(
                    "<ac:parameter ac:name=\"language\">{}</ac:parameter>",
                    language
                ));
            }
            html.push_str(&format!(
                "<ac:plain-text-body><![CDATA[{}]]></ac:plain-text-body></ac:structured-macro>\n",
                code.trim_end_matches('\n')
            ));
            continue;
        }

        let trimmed = line.trim_start();
        if let Some(rest) = heading(trimmed) {
            close_list(&mut html, &mut in_list);
            let (level, text) = rest;
            html.push_str(&format!(
                "<h{lvl}>{}</h{lvl}>\n",
                inline_to_storage(text),
                lvl = level
            ));
        } else if let Some(item) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* "))
        {
            if !in_list {
                html.push_str("<ul>");
                in_list = true;
            }
            html.push_str(&format!("<li>{}</li>", inline_to_storage(item)));
        } else if trimmed.is_empty() {
            close_list(&mut html, &mut in_list);
        } else {
            close_list(&mut html, &mut in_list);
            html.push_str(&format!("<p>{}</p>\n", inline_to_storage(trimmed)));
        }
    }
    close_list(&mut html, &mut in_list);
    html
}

fn close_list(html: &mut String, in_list: &mut bool) {
    if *in_list {
        html.push_str("</ul>\n");
        *in_list = false;
    }
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if (1..=6).contains(&hashes) {
        if let Some(text) = line[hashes..].strip_prefix(' ') {
            return Some((hashes, text));
        }
    }
    None
}

fn inline_to_storage(text: &str) -> String {
    use std::sync::OnceLock;
    static BOLD: OnceLock<regex::Regex> = OnceLock::new();
    static ITALIC: OnceLock<regex::Regex> = OnceLock::new();
    static CODE: OnceLock<regex::Regex> = OnceLock::new();
    static LINK: OnceLock<regex::Regex> = OnceLock::new();

    let bold = BOLD.get_or_init(|| regex::Regex::new(r"\*\*(.+?)\*\*").expect("static regex"));
    let italic = ITALIC.get_or_init(|| regex::Regex::new(r"\*(.+?)\*").expect("static regex"));
    let code = CODE.get_or_init(|| regex::Regex::new(r"`([^`]+)`").expect("static regex"));
    let link =
        LINK.get_or_init(|| regex::Regex::new(r"\[(.*?)\]\((.*?)\)").expect("static regex"));

    let mut escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    escaped = link
        .replace_all(&escaped, |caps: &regex::Captures<'_>| {
            let label = &caps[1];
            let href = &caps[2];
            match href.strip_prefix("confluence:") {
                Some(page) => format!(
                    "<ac:link><ri:page ri:content-title=\"{}\" /></ac:link>",
                    page
                ),
                None => format!("<a href=\"{}\">{}</a>", href, label),
            }
        })
        .into_owned();
    escaped = bold.replace_all(&escaped, "<strong>$1</strong>").into_owned();
    escaped = italic.replace_all(&escaped, "<em>$1</em>").into_owned();
    code.replace_all(&escaped, "<code>$1</code>").into_owned()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(json_text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", json_text).unwrap();
        file
    }

    #[test]
    fn test_config_completeness_token_auth() {
        let mut config = ConfluenceConfig {
            base_url: "https://wiki.example.com".into(),
            space_key: "DOC".into(),
            ..Default::default()
        };
        config.auth.method = "token".into();
        assert!(!config.is_complete());
        config.auth.token = Some("secret".into());
        assert!(config.is_complete());
    }

    #[test]
    fn test_config_completeness_basic_auth() {
        let mut config = ConfluenceConfig {
            base_url: "https://wiki.example.com".into(),
            space_key: "DOC".into(),
            ..Default::default()
        };
        config.auth.method = "basic".into();
        config.auth.username = Some("bot".into());
        assert!(!config.is_complete());
        config.auth.password = Some("hunter2".into());
        assert!(config.is_complete());
    }

    #[test]
    fn test_env_token_resolution() {
        env::set_var("GENDOC_TEST_CONFLUENCE_TOKEN", "resolved-secret");
        let mut config = ConfluenceConfig::default();
        config.auth.token = Some("$GENDOC_TEST_CONFLUENCE_TOKEN".into());
        config.resolve_env_token();
        assert_eq!(config.auth.token.as_deref(), Some("resolved-secret"));
        env::remove_var("GENDOC_TEST_CONFLUENCE_TOKEN");
    }

    #[test]
    fn test_env_token_missing_resolves_empty() {
        let mut config = ConfluenceConfig::default();
        config.auth.token = Some("$GENDOC_TEST_NO_SUCH_VAR".into());
        config.resolve_env_token();
        assert_eq!(config.auth.token.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_load_config_resolves_token() {
        env::set_var("GENDOC_TEST_CONF_LOAD", "tok");
        let file = write_config(
            r#"{"baseUrl": "https://wiki.example.com", "spaceKey": "DOC",
                "auth": {"method": "token", "token": "$GENDOC_TEST_CONF_LOAD"}}"#,
        );
        let exporter = ConfluenceExporter::new();
        let config = exporter.load_config(Some(file.path())).await.unwrap();
        assert_eq!(config["auth"]["token"], "tok");
        env::remove_var("GENDOC_TEST_CONF_LOAD");
    }

    #[tokio::test]
    async fn test_export_without_config_fails_gracefully() {
        let exporter = ConfluenceExporter::new();
        let content = ExportContent::from_raw("# Doc");
        let options = ExportOptions {
            config_path: Some(PathBuf::from("/nonexistent/confluence.json")),
            ..Default::default()
        };
        let result = exporter.export(&content, &options).await;
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_export_with_incomplete_config_fails() {
        let file = write_config(r#"{"baseUrl": "https://wiki.example.com"}"#);
        let exporter = ConfluenceExporter::new();
        let content = ExportContent::from_raw("# Doc");
        let options = ExportOptions {
            config_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let result = exporter.export(&content, &options).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not configured"));
    }

    #[test]
    fn test_markdown_to_storage_code_macro() {
        let storage = markdown_to_storage("# Title\n\n```rust\nfn main() {}\n```\n");
        assert!(storage.contains("<h1>Title</h1>"));
        assert!(storage.contains("<ac:parameter ac:name=\"language\">rust</ac:parameter>"));
        assert!(storage.contains("<![CDATA[fn main() {}]]>"));
    }

    #[test]
    fn test_markdown_to_storage_inline_and_lists() {
        let storage = markdown_to_storage("- **bold** and *em*\n- `code`\n\nplain < text\n");
        assert!(storage.contains("<ul><li><strong>bold</strong> and <em>em</em></li>"));
        assert!(storage.contains("<li><code>code</code></li></ul>"));
        assert!(storage.contains("<p>plain &lt; text</p>"));
    }

    #[test]
    fn test_markdown_to_storage_confluence_links() {
        let storage = markdown_to_storage("See [Setup](confluence:Setup Guide) or [web](https://x.y)\n");
        assert!(storage.contains("<ac:link><ri:page ri:content-title=\"Setup Guide\" /></ac:link>"));
        assert!(storage.contains("<a href=\"https://x.y\">web</a>"));
    }

    #[test]
    fn test_urlencode() {
        assert_eq!(urlencode("My Page & More"), "My%20Page%20%26%20More");
    }
}
