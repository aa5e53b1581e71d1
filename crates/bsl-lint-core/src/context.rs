//! Context types for rule execution.

use crate::language::{MessageLanguage, SourceLanguage};
use std::path::{Path, PathBuf};

/// Context provided to per-file rules.
///
/// Contains metadata about the module being analyzed that rules use to
/// build locations and localized messages.
#[derive(Debug, Clone)]
pub struct FileContext<'a> {
    /// Absolute path to the file.
    pub path: &'a Path,
    /// File contents as a string.
    pub content: &'a str,
    /// Path relative to the project root.
    pub relative_path: PathBuf,
    /// Dialect detected from the file extension.
    pub language: SourceLanguage,
    /// Language rule messages are written in.
    pub message_language: MessageLanguage,
}

impl<'a> FileContext<'a> {
    /// Creates a new file context.
    ///
    /// Files without a recognized extension are treated as `.bsl` modules.
    #[must_use]
    pub fn new(path: &'a Path, content: &'a str, root: &Path) -> Self {
        let relative_path = path
            .strip_prefix(root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf);

        Self {
            path,
            content,
            relative_path,
            language: SourceLanguage::from_path(path).unwrap_or(SourceLanguage::Bsl),
            message_language: MessageLanguage::default(),
        }
    }

    /// Sets the message language.
    #[must_use]
    pub fn with_message_language(mut self, language: MessageLanguage) -> Self {
        self.message_language = language;
        self
    }
}
