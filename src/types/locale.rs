//! Output Language
//!
//! All user-visible strings exist in German and English. German is the
//! default, matching the behavior the tool shipped with.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    De,
    En,
}

impl std::fmt::Display for Lang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Lang::De => write!(f, "de"),
            Lang::En => write!(f, "en"),
        }
    }
}

impl std::str::FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "de" => Ok(Lang::De),
            "en" => Ok(Lang::En),
            _ => Err(format!("Unknown language: {}. Valid values: de, en", s)),
        }
    }
}

macro_rules! labels {
    ($($fn_name:ident => ($en:expr, $de:expr);)*) => {
        impl Lang {
            $(
                pub fn $fn_name(&self) -> &'static str {
                    match self {
                        Lang::En => $en,
                        Lang::De => $de,
                    }
                }
            )*
        }
    };
}

labels! {
    general => ("General", "Allgemein");
    rules => ("Rules", "Regeln");
    configuration => ("Configuration", "Konfiguration");
    unnamed_rule => ("Unnamed Rule", "Unbenannte Regel");
    unnamed_api => ("Unnamed API", "Unbenannte API");
    unnamed_key => ("Unnamed Key", "Unbenannter Key");
    documentation => ("Documentation", "Dokumentation");
    supported_languages => ("Supported languages:", "Unterstützte Sprachen:");
    invalid_entry => ("Invalid entry", "Ungültiger Eintrag");
    diff_title => ("Documentation Diff", "Dokumentations-Diff");
    added => ("Added", "Hinzugefügt");
    changed => ("Changed", "Geändert");
    removed => ("Removed", "Entfernt");
    before => ("Before", "Vorher");
    after => ("After", "Nachher");
    no_changes => ("No changes detected.", "Keine Änderungen erkannt.");
    missing_title => ("Missing title", "Fehlender Titel");
    missing_content => ("Missing content", "Fehlender Inhalt");
    unknown_format => ("Unknown input format", "Unbekanntes Eingabeformat");
    format_unsupported => ("Input format not supported.", "Eingabeformat wird nicht unterstützt.");
    all_entries_valid => ("All entries valid.", "Alle Einträge gültig.");
    some_entries_invalid => ("Some entries are invalid.", "Einige Einträge sind ungültig.");
}
