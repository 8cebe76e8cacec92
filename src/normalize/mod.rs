//! Format Detection and Normalization
//!
//! Inspects a raw input object, determines which of the four supported
//! shapes it carries, and maps every record into the canonical [`Entry`]
//! model. Detection is structural: no tag field, first matching shape wins.

use serde_json::Value;
use tracing::debug;

use crate::types::{DocError, Entry, Format, Lang, Result};

/// Detect the input format.
///
/// Checks run in a fixed priority order: `entries`, `rules`, `api`,
/// `config`. When an object carries more than one recognized field, the
/// first match is used; this tie-break is deliberate, not an error. A field
/// matches when it is present and a JSON array (an empty array still
/// counts).
pub fn detect_format(input: &Value) -> Format {
    for (field, format) in [
        ("entries", Format::Entries),
        ("rules", Format::Rules),
        ("api", Format::Api),
        ("config", Format::Config),
    ] {
        if input.get(field).is_some_and(Value::is_array) {
            return format;
        }
    }
    Format::Unknown
}

/// Normalize a raw input object of a known format into canonical entries.
///
/// Pure per-record mapping with fallback chains for the required fields.
/// Never drops a record: when no descriptive field is present the full
/// structural dump of the record becomes the content. `Format::Unknown` is
/// a hard failure for the caller to propagate, never silently coerced.
pub fn normalize_entries(input: &Value, format: Format, lang: Lang) -> Result<Vec<Entry>> {
    let records = |field: &str| -> &[Value] {
        input
            .get(field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    };

    let entries = match format {
        // Canonical shape: pass-through, no transformation.
        Format::Entries => records("entries")
            .iter()
            .map(|record| {
                serde_json::from_value(record.clone()).unwrap_or_else(|_| Entry {
                    content: Some(dump(record)),
                    ..Default::default()
                })
            })
            .collect(),
        Format::Rules => records("rules").iter().map(|r| rule_entry(r, lang)).collect(),
        Format::Api => records("api").iter().map(|r| api_entry(r, lang)).collect(),
        Format::Config => records("config")
            .iter()
            .map(|r| config_entry(r, lang))
            .collect(),
        Format::Unknown => return Err(DocError::UnknownFormat),
    };

    Ok(entries)
}

/// Detect and normalize in one step.
pub fn normalize(input: &Value, lang: Lang) -> Result<Vec<Entry>> {
    let format = detect_format(input);
    debug!(%format, "detected input format");
    normalize_entries(input, format, lang)
}

fn rule_entry(rule: &Value, lang: Lang) -> Entry {
    Entry {
        category: Some(
            str_field(rule, "category").unwrap_or_else(|| lang.rules().to_string()),
        ),
        title: Some(
            str_field(rule, "name")
                .or_else(|| str_field(rule, "id"))
                .unwrap_or_else(|| lang.unnamed_rule().to_string()),
        ),
        content: Some(
            str_field(rule, "description")
                .or_else(|| str_field(rule, "text"))
                .unwrap_or_else(|| dump(rule)),
        ),
        ..Default::default()
    }
}

fn api_entry(api: &Value, lang: Lang) -> Entry {
    Entry {
        category: Some(str_field(api, "group").unwrap_or_else(|| "API".to_string())),
        title: Some(str_field(api, "name").unwrap_or_else(|| lang.unnamed_api().to_string())),
        content: Some(str_field(api, "description").unwrap_or_else(|| dump(api))),
        ..Default::default()
    }
}

fn config_entry(cfg: &Value, lang: Lang) -> Entry {
    Entry {
        category: Some(
            str_field(cfg, "section").unwrap_or_else(|| lang.configuration().to_string()),
        ),
        title: Some(str_field(cfg, "key").unwrap_or_else(|| lang.unnamed_key().to_string())),
        content: Some(match cfg.get("value") {
            // String-coerce scalar values; anything else keeps its JSON form.
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => dump(cfg),
            Some(other) => other.to_string(),
        }),
        ..Default::default()
    }
}

fn str_field(record: &Value, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn dump(record: &Value) -> String {
    serde_json::to_string(record).unwrap_or_default()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_each_format() {
        assert_eq!(detect_format(&json!({"entries": []})), Format::Entries);
        assert_eq!(detect_format(&json!({"rules": [{}]})), Format::Rules);
        assert_eq!(detect_format(&json!({"api": [{}]})), Format::Api);
        assert_eq!(detect_format(&json!({"config": [{}]})), Format::Config);
        assert_eq!(detect_format(&json!({"foo": []})), Format::Unknown);
        assert_eq!(detect_format(&json!({"entries": "nope"})), Format::Unknown);
    }

    #[test]
    fn test_detect_priority_order_is_first_match_wins() {
        let input = json!({"rules": [{"name": "r"}], "entries": [{"title": "t"}]});
        assert_eq!(detect_format(&input), Format::Entries);

        let input = json!({"config": [{}], "api": [{}]});
        assert_eq!(detect_format(&input), Format::Api);
    }

    #[test]
    fn test_entries_pass_through() {
        let input = json!({"entries": [{"title": "T", "content": "C", "category": "Cat"}]});
        let entries = normalize(&input, Lang::De).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("T"));
        assert_eq!(entries[0].content.as_deref(), Some("C"));
        assert_eq!(entries[0].category.as_deref(), Some("Cat"));
    }

    #[test]
    fn test_rules_fallback_chain() {
        let input = json!({"rules": [
            {"name": "Rule 1", "description": "Desc"},
            {"id": "r-2", "text": "Text body"},
            {"severity": "high"}
        ]});
        let entries = normalize(&input, Lang::En).unwrap();

        assert_eq!(entries[0].category.as_deref(), Some("Rules"));
        assert_eq!(entries[0].title.as_deref(), Some("Rule 1"));
        assert_eq!(entries[0].content.as_deref(), Some("Desc"));

        assert_eq!(entries[1].title.as_deref(), Some("r-2"));
        assert_eq!(entries[1].content.as_deref(), Some("Text body"));

        assert_eq!(entries[2].title.as_deref(), Some("Unnamed Rule"));
        assert!(entries[2].content.as_deref().unwrap().contains("severity"));
    }

    #[test]
    fn test_rules_localized_category_german() {
        let input = json!({"rules": [{"name": "Rule 1", "description": "Desc"}]});
        let entries = normalize(&input, Lang::De).unwrap();
        assert_eq!(entries[0].category.as_deref(), Some("Regeln"));
    }

    #[test]
    fn test_rule_explicit_category_wins() {
        let input = json!({"rules": [{"category": "Security", "name": "R", "description": "D"}]});
        let entries = normalize(&input, Lang::De).unwrap();
        assert_eq!(entries[0].category.as_deref(), Some("Security"));
    }

    #[test]
    fn test_api_fallback_chain() {
        let input = json!({"api": [
            {"group": "Auth", "name": "login", "description": "Logs in"},
            {"path": "/health"}
        ]});
        let entries = normalize(&input, Lang::En).unwrap();

        assert_eq!(entries[0].category.as_deref(), Some("Auth"));
        assert_eq!(entries[0].title.as_deref(), Some("login"));

        assert_eq!(entries[1].category.as_deref(), Some("API"));
        assert_eq!(entries[1].title.as_deref(), Some("Unnamed API"));
        assert!(entries[1].content.as_deref().unwrap().contains("/health"));
    }

    #[test]
    fn test_config_value_coercion() {
        let input = json!({"config": [
            {"section": "Server", "key": "port", "value": 8080},
            {"key": "host", "value": "localhost"},
            {"key": "bare"}
        ]});
        let entries = normalize(&input, Lang::En).unwrap();

        assert_eq!(entries[0].content.as_deref(), Some("8080"));
        assert_eq!(entries[1].category.as_deref(), Some("Configuration"));
        assert_eq!(entries[1].content.as_deref(), Some("localhost"));
        // No value at all: full structural dump so nothing is lost.
        assert!(entries[2].content.as_deref().unwrap().contains("bare"));
    }

    #[test]
    fn test_unknown_format_is_hard_error() {
        let err = normalize(&json!({"foo": []}), Lang::De).unwrap_err();
        assert!(matches!(err, DocError::UnknownFormat));
        assert!(err.to_string().contains("entries, rules, api, config"));
    }

    #[test]
    fn test_normalization_never_panics_on_malformed_records() {
        // Records of the wrong type still produce content-bearing entries.
        let input = json!({"rules": ["just a string", 42, null]});
        let entries = normalize(&input, Lang::En).unwrap();
        assert_eq!(entries.len(), 3);
        for entry in &entries {
            assert!(entry.title.is_some());
            assert!(entry.content.is_some());
            assert!(entry.category.is_some());
        }
    }
}
