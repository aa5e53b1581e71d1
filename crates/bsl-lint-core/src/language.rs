//! Source dialects and message languages.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Dialect of a source file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    /// 1C:Enterprise module (`.bsl`).
    Bsl,
    /// OneScript script (`.os`).
    Os,
}

impl SourceLanguage {
    /// Extensions recognized by the analyzer, without the leading dot.
    pub const EXTENSIONS: &'static [&'static str] = &["bsl", "os"];

    /// Detects the dialect from a file extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "bsl" => Some(Self::Bsl),
            "os" => Some(Self::Os),
            _ => None,
        }
    }
}

/// Language diagnostics are reported in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLanguage {
    /// Russian.
    #[default]
    Ru,
    /// English.
    En,
}

impl MessageLanguage {
    /// Picks the template for this language.
    #[must_use]
    pub fn pick<'a>(self, ru: &'a str, en: &'a str) -> &'a str {
        match self {
            Self::Ru => ru,
            Self::En => en,
        }
    }
}
