//! Caption languages and their NLLB-200 codes.
//!
//! Callers pass display names ("Telugu"); the model needs FLORES-200 codes
//! ("tel_Telu"). Lookup is exact, like the form's dropdown values.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;
use utoipa::ToSchema;

/// A caption language offered to contributors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Language {
    English,
    Hindi,
    Telugu,
    Tamil,
    Kannada,
    Bengali,
}

/// Used when the source language is not in the table.
pub const SOURCE_FALLBACK: Language = Language::English;

/// Used when the target language is not in the table.
pub const TARGET_FALLBACK: Language = Language::Hindi;

impl Language {
    /// All languages, in the order they are offered.
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::Hindi,
        Language::Telugu,
        Language::Tamil,
        Language::Kannada,
        Language::Bengali,
    ];

    /// Name shown to contributors.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Telugu => "Telugu",
            Self::Tamil => "Tamil",
            Self::Kannada => "Kannada",
            Self::Bengali => "Bengali",
        }
    }

    /// FLORES-200 code understood by the NLLB tokenizer.
    pub fn nllb_code(&self) -> &'static str {
        match self {
            Self::English => "eng_Latn",
            Self::Hindi => "hin_Deva",
            Self::Telugu => "tel_Telu",
            Self::Tamil => "tam_Taml",
            Self::Kannada => "kan_Knda",
            Self::Bengali => "ben_Beng",
        }
    }

    /// Exact lookup by display name.
    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.display_name() == name)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Resolve a source language name, falling back to English.
pub fn resolve_source(name: &str) -> Language {
    Language::from_display_name(name).unwrap_or_else(|| {
        warn!(
            "Unknown source language '{}', falling back to {}",
            name, SOURCE_FALLBACK
        );
        SOURCE_FALLBACK
    })
}

/// Resolve a target language name, falling back to Hindi.
pub fn resolve_target(name: &str) -> Language {
    Language::from_display_name(name).unwrap_or_else(|| {
        warn!(
            "Unknown target language '{}', falling back to {}",
            name, TARGET_FALLBACK
        );
        TARGET_FALLBACK
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_table() {
        let codes: Vec<(&str, &str)> = Language::ALL
            .iter()
            .map(|l| (l.display_name(), l.nllb_code()))
            .collect();
        assert_eq!(
            codes,
            vec![
                ("English", "eng_Latn"),
                ("Hindi", "hin_Deva"),
                ("Telugu", "tel_Telu"),
                ("Tamil", "tam_Taml"),
                ("Kannada", "kan_Knda"),
                ("Bengali", "ben_Beng"),
            ]
        );
    }

    #[test]
    fn test_from_display_name_is_exact() {
        assert_eq!(Language::from_display_name("Telugu"), Some(Language::Telugu));
        assert_eq!(Language::from_display_name("telugu"), None);
        assert_eq!(Language::from_display_name(" Telugu"), None);
        assert_eq!(Language::from_display_name(""), None);
    }

    #[test]
    fn test_asymmetric_fallbacks() {
        assert_eq!(resolve_source("Klingon"), Language::English);
        assert_eq!(resolve_target("Klingon"), Language::Hindi);
        assert_eq!(resolve_source("Tamil"), Language::Tamil);
        assert_eq!(resolve_target("Bengali"), Language::Bengali);
    }

    #[test]
    fn test_display() {
        assert_eq!(Language::Kannada.to_string(), "Kannada");
    }
}
