//! High-Level Documentation Operations
//!
//! Orchestrates the normalization pipeline end to end: raw input to
//! rendered Markdown/JSON, snapshot validation, and documentation diffs.
//! The renderer and diff engine stay pure; this module owns the plumbing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::diff;
use crate::normalize::{detect_format, normalize, normalize_entries};
use crate::render::{render_json, render_markdown, RenderStyle};
use crate::types::{Entry, Format, Lang, Result};

/// Target output of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Unknown output format: {}. Valid values: markdown, json",
                s
            )),
        }
    }
}

/// Rendered output, matching the requested [`OutputFormat`].
#[derive(Debug, Clone, PartialEq)]
pub enum DocOutput {
    Markdown(String),
    Json(Value),
}

impl DocOutput {
    /// Serialize for writing to a file or stdout.
    pub fn to_display_string(&self) -> String {
        match self {
            DocOutput::Markdown(md) => md.clone(),
            DocOutput::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// Arguments for a documentation generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub input: Value,
    pub output_format: OutputFormat,
    pub style: RenderStyle,
    pub lang: Lang,
    pub languages: Vec<String>,
}

/// Detect, normalize and render a raw input object.
///
/// An unrecognized input shape aborts the whole operation with
/// [`crate::types::DocError::UnknownFormat`].
pub fn generate_docs_from_input(request: &GenerateRequest) -> Result<DocOutput> {
    let entries = normalize(&request.input, request.lang)?;
    debug!(entries = entries.len(), "normalized input");

    Ok(match request.output_format {
        OutputFormat::Json => {
            DocOutput::Json(render_json(&entries, request.lang, &request.languages))
        }
        OutputFormat::Markdown => DocOutput::Markdown(render_markdown(
            &entries,
            &request.style,
            request.lang,
            &request.languages,
        )),
    })
}

// =============================================================================
// Snapshot Validation
// =============================================================================

/// A single validation finding with the position and offending entry.
#[derive(Debug, Clone, Serialize)]
pub struct DocIssue {
    pub index: Option<usize>,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<Entry>,
}

/// Result of validating a documentation snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DocValidation {
    pub valid: bool,
    pub issues: Vec<DocIssue>,
    pub message: String,
}

/// Validate a raw documentation snapshot.
///
/// Unlike generation, an unknown format here is reported as a validation
/// failure rather than raised, so callers always get a structured answer.
pub fn validate_documentation(input: &Value, lang: Lang) -> DocValidation {
    let format = detect_format(input);
    if format == Format::Unknown {
        return DocValidation {
            valid: false,
            issues: vec![DocIssue {
                index: None,
                error: lang.unknown_format().to_string(),
                entry: None,
            }],
            message: lang.format_unsupported().to_string(),
        };
    }

    // Known format, so normalization cannot fail.
    let entries = normalize_entries(input, format, lang).unwrap_or_default();

    let mut issues = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        if entry.title.is_none() {
            issues.push(DocIssue {
                index: Some(index),
                error: lang.missing_title().to_string(),
                entry: Some(entry.clone()),
            });
        }
        if entry.content.is_none() {
            issues.push(DocIssue {
                index: Some(index),
                error: lang.missing_content().to_string(),
                entry: Some(entry.clone()),
            });
        }
    }

    let valid = issues.is_empty();
    DocValidation {
        valid,
        message: if valid {
            lang.all_entries_valid().to_string()
        } else {
            lang.some_entries_invalid().to_string()
        },
        issues,
    }
}

// =============================================================================
// Diff Generation
// =============================================================================

/// Arguments for a documentation diff run.
#[derive(Debug, Clone, Default)]
pub struct DiffRequest {
    pub old: Value,
    pub new: Value,
    pub output_format: OutputFormat,
    pub lang: Lang,
}

/// Normalize two snapshots independently, diff them, and render the result.
///
/// Either side having an unrecognized shape aborts the whole operation.
pub fn generate_docs_from_diff(request: &DiffRequest) -> Result<DocOutput> {
    let old_entries = normalize(&request.old, request.lang)?;
    let new_entries = normalize(&request.new, request.lang)?;

    let result = diff::diff(&old_entries, &new_entries);
    debug!(
        added = result.added.len(),
        changed = result.changed.len(),
        removed = result.removed.len(),
        "computed documentation diff"
    );

    Ok(match request.output_format {
        OutputFormat::Json => DocOutput::Json(diff::to_json(&result)),
        OutputFormat::Markdown => DocOutput::Markdown(diff::render_markdown(&result, request.lang)),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocError;
    use serde_json::json;

    #[test]
    fn test_generate_markdown_scenario() {
        let request = GenerateRequest {
            input: json!({"entries": [{"title": "T", "content": "C"}]}),
            ..Default::default()
        };
        let output = generate_docs_from_input(&request).unwrap();
        let md = match output {
            DocOutput::Markdown(md) => md,
            other => panic!("expected markdown, got {:?}", other),
        };
        assert!(md.contains("## Allgemein"));
        assert!(md.contains("### T"));
        assert!(md.contains("\nC\n"));
    }

    #[test]
    fn test_generate_rules_scenario() {
        let request = GenerateRequest {
            input: json!({"rules": [{"name": "Rule 1", "description": "Desc"}]}),
            output_format: OutputFormat::Json,
            lang: Lang::En,
            ..Default::default()
        };
        let output = generate_docs_from_input(&request).unwrap();
        let value = match output {
            DocOutput::Json(v) => v,
            other => panic!("expected json, got {:?}", other),
        };
        assert_eq!(value["documentation"]["Rules"][0]["title"], "Rule 1");
        assert_eq!(value["documentation"]["Rules"][0]["content"], "Desc");
    }

    #[test]
    fn test_generate_unknown_format_aborts() {
        let request = GenerateRequest {
            input: json!({"foo": []}),
            ..Default::default()
        };
        let err = generate_docs_from_input(&request).unwrap_err();
        assert!(matches!(err, DocError::UnknownFormat));
    }

    #[test]
    fn test_validate_reports_missing_fields_with_positions() {
        let input = json!({"entries": [
            {"title": "ok", "content": "fine"},
            {"content": "no title"},
            {"title": "no content"}
        ]});
        let validation = validate_documentation(&input, Lang::En);
        assert!(!validation.valid);
        assert_eq!(validation.issues.len(), 2);
        assert_eq!(validation.issues[0].index, Some(1));
        assert_eq!(validation.issues[0].error, "Missing title");
        assert_eq!(validation.issues[1].index, Some(2));
        assert_eq!(validation.issues[1].error, "Missing content");
        assert_eq!(validation.message, "Some entries are invalid.");
    }

    #[test]
    fn test_validate_all_valid() {
        let input = json!({"entries": [{"title": "T", "content": "C"}]});
        let validation = validate_documentation(&input, Lang::De);
        assert!(validation.valid);
        assert!(validation.issues.is_empty());
        assert_eq!(validation.message, "Alle Einträge gültig.");
    }

    #[test]
    fn test_validate_unknown_format_is_structured_not_raised() {
        let validation = validate_documentation(&json!({"foo": []}), Lang::En);
        assert!(!validation.valid);
        assert_eq!(validation.issues[0].index, None);
        assert_eq!(validation.issues[0].error, "Unknown input format");
        assert_eq!(validation.message, "Input format not supported.");
    }

    #[test]
    fn test_diff_request_changed_scenario() {
        let request = DiffRequest {
            old: json!({"entries": [{"title": "T1", "content": "alt"}]}),
            new: json!({"entries": [{"title": "T1", "content": "neu"}]}),
            output_format: OutputFormat::Json,
            lang: Lang::De,
        };
        let output = generate_docs_from_diff(&request).unwrap();
        let value = match output {
            DocOutput::Json(v) => v,
            other => panic!("expected json, got {:?}", other),
        };
        assert_eq!(value["changed"].as_array().unwrap().len(), 1);
        assert_eq!(value["changed"][0]["before"]["content"], "alt");
        assert_eq!(value["changed"][0]["after"]["content"], "neu");
        assert!(value["added"].as_array().unwrap().is_empty());
        assert!(value["removed"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_diff_request_mixed_shapes() {
        // Old snapshot as rules, new as entries: both normalize first.
        let request = DiffRequest {
            old: json!({"rules": [{"name": "R", "description": "alt"}]}),
            new: json!({"entries": [{"title": "R", "content": "alt", "category": "Regeln"}]}),
            output_format: OutputFormat::Markdown,
            lang: Lang::De,
        };
        let output = generate_docs_from_diff(&request).unwrap();
        let md = match output {
            DocOutput::Markdown(md) => md,
            other => panic!("expected markdown, got {:?}", other),
        };
        assert!(md.contains("Keine Änderungen erkannt."));
    }

    #[test]
    fn test_diff_unknown_side_aborts() {
        let request = DiffRequest {
            old: json!({"entries": []}),
            new: json!({"bogus": true}),
            ..Default::default()
        };
        assert!(matches!(
            generate_docs_from_diff(&request).unwrap_err(),
            DocError::UnknownFormat
        ));
    }
}
