//! Documentation Diff Engine
//!
//! Compares two normalized entry sequences keyed by derived identity and
//! reports additions, removals, and content changes. Decoupled from the
//! renderer/exporter path; diff rendering mirrors the renderer's
//! localization conventions.

use serde::Serialize;
use serde_json::{json, Value};

use crate::types::{Entry, Lang};

/// A changed entry, carrying both versions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangedEntry {
    pub before: Entry,
    pub after: Entry,
}

/// Result of comparing two documentation snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocDiff {
    pub added: Vec<Entry>,
    pub changed: Vec<ChangedEntry>,
    pub removed: Vec<Entry>,
}

impl DocDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Compare two normalized entry sequences.
///
/// Identity per side is [`Entry::key`]. Present only in `new` by key means
/// added; only in `old` means removed; present in both but structurally
/// unequal means changed. Equality covers the whole record, so a category
/// move counts as a change even when the content is untouched.
pub fn diff(old_entries: &[Entry], new_entries: &[Entry]) -> DocDiff {
    let old_keyed = keyed(old_entries);
    let new_keyed = keyed(new_entries);

    fn find<'a>(keyed: &'a [(String, Entry)], key: &str) -> Option<&'a Entry> {
        keyed.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    let mut result = DocDiff::default();

    for (key, entry) in &new_keyed {
        match find(&old_keyed, key) {
            None => result.added.push(entry.clone()),
            Some(before) if before != entry => result.changed.push(ChangedEntry {
                before: before.clone(),
                after: entry.clone(),
            }),
            Some(_) => {}
        }
    }
    for (key, entry) in &old_keyed {
        if find(&new_keyed, key).is_none() {
            result.removed.push(entry.clone());
        }
    }

    result
}

/// Key each entry, collapsing duplicate keys within a snapshot (the later
/// occurrence wins, keeping the first occurrence's position).
fn keyed(entries: &[Entry]) -> Vec<(String, Entry)> {
    let mut keyed: Vec<(String, Entry)> = Vec::with_capacity(entries.len());
    for entry in entries {
        let key = entry.key();
        match keyed.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = entry.clone(),
            None => keyed.push((key, entry.clone())),
        }
    }
    keyed
}

/// Render a diff as localized Markdown.
///
/// Empty sections are omitted entirely; a diff with no changes renders a
/// single "no changes" sentence instead of three empty headings.
pub fn render_markdown(diff: &DocDiff, lang: Lang) -> String {
    let mut md = format!("# {}\n\n", lang.diff_title());

    if !diff.added.is_empty() {
        md.push_str(&format!("## {}\n\n", lang.added()));
        for entry in &diff.added {
            md.push_str(&format!("- {}: {}\n", entry.key(), summary(entry)));
        }
        md.push('\n');
    }
    if !diff.changed.is_empty() {
        md.push_str(&format!("## {}\n\n", lang.changed()));
        for change in &diff.changed {
            md.push_str(&format!("- {}:\n", change.after.key()));
            md.push_str(&format!("  - {}: {}\n", lang.before(), summary(&change.before)));
            md.push_str(&format!("  - {}: {}\n", lang.after(), summary(&change.after)));
        }
        md.push('\n');
    }
    if !diff.removed.is_empty() {
        md.push_str(&format!("## {}\n\n", lang.removed()));
        for entry in &diff.removed {
            md.push_str(&format!("- {}: {}\n", entry.key(), summary(entry)));
        }
        md.push('\n');
    }
    if diff.is_empty() {
        md.push_str(lang.no_changes());
    }

    md
}

/// Structured JSON projection: `{added, changed: [{before, after}], removed}`.
pub fn to_json(diff: &DocDiff) -> Value {
    json!({
        "added": diff.added,
        "changed": diff.changed,
        "removed": diff.removed,
    })
}

fn summary(entry: &Entry) -> String {
    entry
        .content
        .clone()
        .or_else(|| {
            entry
                .extra
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default()
}

// =============================================================================
// Tests
// =============================================================================
