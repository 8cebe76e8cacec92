//! Renderer
//!
//! Pure rendering of a normalized entry sequence into Markdown or a JSON
//! projection. Grouping is by category in first-seen order; malformed
//! entries stay visible in the output instead of being dropped.

use serde_json::{Map, Value};

use crate::types::{Entry, Lang};

/// Configurable output style for Markdown rendering.
///
/// The document title uses `heading_level - 1`, each category heading uses
/// `heading_level`, each entry title uses `heading_level + 1`.
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub heading_level: u8,
    pub bullet: String,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            heading_level: 2,
            bullet: "-".to_string(),
        }
    }
}

/// Group entries by category, defaulting to the localized "General" label.
///
/// Group order is first-seen-category order; insertion order within a
/// category is preserved.
pub fn group_entries(entries: &[Entry], lang: Lang) -> Vec<(String, Vec<Entry>)> {
    let mut groups: Vec<(String, Vec<Entry>)> = Vec::new();
    for entry in entries {
        let category = entry
            .category
            .clone()
            .unwrap_or_else(|| lang.general().to_string());
        match groups.iter_mut().find(|(name, _)| *name == category) {
            Some((_, members)) => members.push(entry.clone()),
            None => groups.push((category, vec![entry.clone()])),
        }
    }
    groups
}

/// Render grouped entries as a Markdown document.
///
/// When `languages` is non-empty, entries carrying a `code` map emit one
/// fenced code block per requested language, skipping languages the entry
/// does not provide.
pub fn render_markdown(
    entries: &[Entry],
    style: &RenderStyle,
    lang: Lang,
    languages: &[String],
) -> String {
    let title_hashes = "#".repeat(style.heading_level.saturating_sub(1).max(1) as usize);
    let category_hashes = "#".repeat(style.heading_level as usize);
    let entry_hashes = "#".repeat(style.heading_level as usize + 1);

    let mut md = format!("{} {}\n\n", title_hashes, lang.documentation());
    if !languages.is_empty() {
        md.push_str(&format!(
            "{} {}\n\n",
            lang.supported_languages(),
            languages.join(", ")
        ));
    }

    for (category, members) in group_entries(entries, lang) {
        md.push_str(&format!("{} {}\n\n", category_hashes, category));
        for entry in &members {
            // Malformed entries must remain visible, dump and all.
            if !entry.is_well_formed() {
                md.push_str(&format!(
                    "{} ⚠️ {}\n{} {}\n\n",
                    entry_hashes,
                    lang.invalid_entry(),
                    style.bullet,
                    entry.dump()
                ));
                continue;
            }
            md.push_str(&format!(
                "{} {}\n\n",
                entry_hashes,
                entry.title.as_deref().unwrap_or_default()
            ));
            md.push_str(&format!(
                "{}\n\n",
                entry.content.as_deref().unwrap_or_default()
            ));
            if let Some(code) = &entry.code {
                for requested in languages {
                    if let Some(snippet) = code.get(requested) {
                        md.push_str(&format!("```{}\n{}\n```\n\n", requested, snippet));
                    }
                }
            }
        }
    }

    md
}

/// Structural JSON projection of the same canonical groups — no string
/// templating, for machine consumption.
pub fn render_json(entries: &[Entry], lang: Lang, languages: &[String]) -> Value {
    let mut documentation = Map::new();
    for (category, members) in group_entries(entries, lang) {
        documentation.insert(
            category,
            Value::Array(
                members
                    .iter()
                    .map(|e| serde_json::to_value(e).unwrap_or_default())
                    .collect(),
            ),
        );
    }

    let mut root = Map::new();
    root.insert("documentation".to_string(), Value::Object(documentation));
    root.insert(
        "languages".to_string(),
        Value::Array(languages.iter().cloned().map(Value::String).collect()),
    );
    Value::Object(root)
}

// =============================================================================
// Tests
// =============================================================================
