//! Exporter Plugin System
//!
//! Output backends (Confluence, Markdown, HTML, PDF, user-supplied)
//! implement the [`Exporter`] capability trait and are looked up through a
//! name-keyed [`ExporterRegistry`]. `export()` is the only operation with
//! externally visible side effects; it converts its own I/O failures into a
//! failed [`ExportResult`] instead of propagating them.

pub mod confluence;
pub mod html;
pub mod markdown;
pub mod pdf;
pub mod registry;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Entry, Result};

pub use confluence::ConfluenceExporter;
pub use html::HtmlExporter;
pub use markdown::MarkdownExporter;
pub use pdf::PdfExporter;
pub use registry::{ExporterFactory, ExporterRegistry};

// =============================================================================
// Payload Types
// =============================================================================

/// The normalized payload handed to an exporter.
///
/// `raw_content` bypasses entry-based rendering entirely, e.g. for direct
/// Markdown pass-through.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<Entry>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
}

impl ExportContent {
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self {
            entries: Some(entries),
            raw_content: None,
        }
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self {
            entries: None,
            raw_content: Some(raw.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw_content.is_none() && self.entries.as_ref().is_none_or(|e| e.is_empty())
    }
}

/// Options recognized by all built-in exporters. Exporter-specific extras
/// travel in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Path to the exporter's configuration file, overriding its default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,

    /// Partition output into one section/page per category.
    #[serde(default)]
    pub by_category: bool,

    /// Additional labels/tags for the exported document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    /// Run `validate_content` first and fail closed on invalid content.
    #[serde(default)]
    pub validate_before_export: bool,

    /// Target file for file-producing exporters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Outcome of an export attempt. `details` carries exporter-specific
/// artifacts: written file path, byte/line counts, remote page identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ExportResult {
    pub fn ok(details: Value) -> Self {
        Self {
            success: true,
            error: None,
            details: Some(details),
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            details: None,
        }
    }

    pub fn fail_with_details(error: impl Into<String>, details: Value) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            details: Some(details),
        }
    }
}

// =============================================================================
// Validation Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

/// Content validation outcome. `valid` is true iff there are zero
/// error-severity issues; warnings never block an export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

impl Validation {
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self {
            valid: !issues.iter().any(|i| i.severity == Severity::Error),
            issues,
        }
    }

    /// Joined messages for a failure summary.
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(|i| i.message.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Canonical content checks shared by the built-in exporters: the payload
/// must carry at least one entry or raw content; every entry needs a title
/// (error) and content (warning).
pub fn validate_export_content(content: &ExportContent) -> Validation {
    let mut issues = Vec::new();

    if content.is_empty() {
        issues.push(ValidationIssue::error("No content to export"));
    }

    if let Some(entries) = &content.entries {
        for (index, entry) in entries.iter().enumerate() {
            if entry.title.is_none() {
                issues.push(ValidationIssue::error(format!(
                    "Entry at index {} has no title",
                    index
                )));
            }
            if entry.content.is_none() {
                issues.push(ValidationIssue::warning(format!(
                    "Entry at index {} has no content",
                    index
                )));
            }
        }
    }

    Validation::from_issues(issues)
}

// =============================================================================
// Exporter Capability Trait
// =============================================================================

/// Capability contract every output backend satisfies.
///
/// Lifecycle of a single instance across one export call:
/// Unconfigured → Configured → (optionally Validated) → Exported | Failed.
/// There is no retry state; a failed export returns a failed result and the
/// caller decides whether to try again.
#[async_trait]
pub trait Exporter: Send + Sync {
    /// Unique name the exporter self-reports for registration.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Supported file extensions or target formats.
    fn supported_formats(&self) -> &'static [&'static str];

    /// Default configuration file for this exporter.
    fn default_config_path(&self) -> PathBuf;

    /// Whether the backend has the minimum settings to operate. Absence of
    /// configuration is a normal `false`, never an error.
    async fn is_configured(&self) -> bool;

    /// Load the exporter configuration as a JSON object, deep-merging the
    /// file's contents over compiled-in defaults. A missing file silently
    /// yields the defaults; a parse failure is an error.
    async fn load_config(&self, config_path: Option<&Path>) -> Result<Value>;

    /// Validate content prior to export. Default: the canonical checks.
    fn validate_content(&self, content: &ExportContent) -> Validation {
        validate_export_content(content)
    }

    /// Perform the export. When `options.validate_before_export` is set the
    /// implementation must run `validate_content` first and fail closed,
    /// attaching the issues to the result's `details`.
    async fn export(&self, content: &ExportContent, options: &ExportOptions) -> ExportResult;
}

/// Shared pre-export validation gate used by the built-in exporters.
/// Returns the failure result to hand back when validation blocks the
/// export, or `None` when the export may proceed.
pub(crate) fn validation_gate(
    exporter: &dyn Exporter,
    content: &ExportContent,
    options: &ExportOptions,
) -> Option<ExportResult> {
    if !options.validate_before_export {
        return None;
    }
    let validation = exporter.validate_content(content);
    if validation.valid {
        return None;
    }
    let summary = validation.summary();
    let details = serde_json::json!({ "validation": validation });
    Some(ExportResult::fail_with_details(
        format!("Validation failed: {}", summary),
        details,
    ))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Entry;

    #[test]
    fn test_empty_content_is_error() {
        let validation = validate_export_content(&ExportContent::default());
        assert!(!validation.valid);
        assert_eq!(validation.issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_raw_content_alone_is_valid() {
        let validation = validate_export_content(&ExportContent::from_raw("# Hello"));
        assert!(validation.valid);
        assert!(validation.issues.is_empty());
    }

    #[test]
    fn test_missing_title_blocks_missing_content_warns() {
        let entries = vec![
            Entry {
                content: Some("no title".into()),
                ..Default::default()
            },
            Entry {
                title: Some("no content".into()),
                ..Default::default()
            },
        ];
        let validation = validate_export_content(&ExportContent::from_entries(entries));
        assert!(!validation.valid);
        assert_eq!(validation.issues.len(), 2);
        assert_eq!(validation.issues[0].severity, Severity::Error);
        assert!(validation.issues[0].message.contains("index 0"));
        assert_eq!(validation.issues[1].severity, Severity::Warning);
    }

    #[test]
    fn test_warnings_do_not_block() {
        let entries = vec![Entry {
            title: Some("titled".into()),
            ..Default::default()
        }];
        let validation = validate_export_content(&ExportContent::from_entries(entries));
        assert!(validation.valid);
        assert_eq!(validation.issues.len(), 1);
    }

    #[test]
    fn test_export_result_constructors() {
        let ok = ExportResult::ok(serde_json::json!({"pages": 1}));
        assert!(ok.success);
        assert!(ok.error.is_none());

        let fail = ExportResult::fail("boom");
        assert!(!fail.success);
        assert_eq!(fail.error.as_deref(), Some("boom"));
    }
}
