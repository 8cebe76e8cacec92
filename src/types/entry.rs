//! Canonical Documentation Entry
//!
//! Every supported input shape is normalized into a sequence of [`Entry`]
//! values. Entries are immutable once normalized; consumers receive the
//! sequence by value and never mutate shared state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The canonical documentation unit.
///
/// `title` and `content` are logically required, but malformed input keeps
/// them absent rather than being dropped: the renderer surfaces such entries
/// as visible warning blocks and `validate_content` reports them as issues.
/// Unrecognized fields are retained in `extra` so structural dumps and the
/// diff engine's `name`/`id` key fallbacks keep working.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Entry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Per-language code samples (language -> source snippet)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<BTreeMap<String, String>>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Entry {
    /// Build a well-formed entry from title and content.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Attach a category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attach a code sample for a language.
    pub fn with_code(mut self, lang: impl Into<String>, source: impl Into<String>) -> Self {
        self.code
            .get_or_insert_with(BTreeMap::new)
            .insert(lang.into(), source.into());
        self
    }

    /// Whether both required fields are present.
    pub fn is_well_formed(&self) -> bool {
        self.title.is_some() && self.content.is_some()
    }

    /// Identity key used by the diff engine: `title`, falling back to the
    /// retained `name` or `id` fields, falling back to the full structural
    /// serialization. Two anonymous entries that serialize identically
    /// collide into a single key; that ambiguity is inherited behavior and
    /// left as-is.
    pub fn key(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        for field in ["name", "id"] {
            if let Some(value) = self.extra.get(field) {
                return match value.as_str() {
                    Some(s) => s.to_string(),
                    None => value.to_string(),
                };
            }
        }
        self.dump()
    }

    /// Full structural serialization of the entry. Used for identity
    /// fallbacks and for rendering malformed entries verbatim.
    pub fn dump(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

// =============================================================================
// Input Format
// =============================================================================

/// Structurally detected shape of a raw input object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Entries,
    Rules,
    Api,
    Config,
    Unknown,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Entries => write!(f, "entries"),
            Format::Rules => write!(f, "rules"),
            Format::Api => write!(f, "api"),
            Format::Config => write!(f, "config"),
            Format::Unknown => write!(f, "unknown"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
