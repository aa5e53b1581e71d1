//! Core types for lint violations and results.

use crate::syntax::Span;
use miette::{Diagnostic, SourceSpan};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for lint violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail lint.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to project root.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset in file (for miette integration).
    pub offset: usize,
    /// Length of the span in bytes.
    pub length: usize,
}

impl Location {
    /// Creates a location covering a syntax node's span.
    #[must_use]
    pub fn from_span(file: PathBuf, span: Span) -> Self {
        Self {
            file,
            line: span.line,
            column: span.column,
            offset: span.offset,
            length: span.len,
        }
    }

    /// Creates a new location with explicit values.
    #[must_use]
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset: 0,
            length: 0,
        }
    }

    /// Sets the byte offset and length for this location.
    #[must_use]
    pub fn with_span(mut self, offset: usize, length: usize) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }
}

/// A suggested fix for a violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// Human-readable description of the fix.
    pub message: String,
}

impl Suggestion {
    /// Creates a new suggestion.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A lint violation found during analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Rule code (e.g., "BSL001").
    pub code: String,
    /// Rule name (e.g., "using-object-not-available-unix").
    pub rule: String,
    /// Severity of this violation.
    pub severity: Severity,
    /// Primary location of the violation.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
    /// Optional suggestion for fixing.
    pub suggestion: Option<Suggestion>,
    /// Estimated effort to fix, in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes_to_fix: Option<u32>,
}

impl Violation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            rule: rule.into(),
            severity,
            location,
            message: message.into(),
            suggestion: None,
            minutes_to_fix: None,
        }
    }

    /// Adds a suggestion to this violation.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    /// Sets the estimated effort to fix this violation.
    #[must_use]
    pub fn with_minutes_to_fix(mut self, minutes: u32) -> Self {
        self.minutes_to_fix = Some(minutes);
        self
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.location.file.display(),
            self.location.line,
            self.location.column,
            self.severity,
            self.code,
            self.message
        )
    }
}

/// Converts a Violation to a miette Diagnostic for rich error display.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct ViolationDiagnostic {
    message: String,
    #[help]
    help: Option<String>,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
}

impl From<&Violation> for ViolationDiagnostic {
    fn from(v: &Violation) -> Self {
        Self {
            message: format!("[{}] {}", v.code, v.message),
            help: v.suggestion.as_ref().map(|s| s.message.clone()),
            span: SourceSpan::from((v.location.offset, v.location.length)),
            label_message: v.rule.clone(),
        }
    }
}

/// Result of running lint analysis.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All violations found.
    pub violations: Vec<Violation>,
    /// Number of files checked.
    pub files_checked: usize,
    /// Files that could not be parsed and were skipped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files_skipped: Vec<PathBuf>,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.severity == Severity::Error)
    }

    /// Returns true if there are any warnings or errors.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.severity >= Severity::Warning)
    }

    /// Counts violations by severity.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let errors = self
            .violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .count();
        let warnings = self
            .violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
            .count();
        let infos = self
            .violations
            .iter()
            .filter(|v| v.severity == Severity::Info)
            .count();
        (errors, warnings, infos)
    }

    /// Sums the estimated fix effort of all violations, in minutes.
    #[must_use]
    pub fn total_minutes_to_fix(&self) -> u64 {
        self.violations
            .iter()
            .filter_map(|v| v.minutes_to_fix)
            .map(u64::from)
            .sum()
    }

    /// Checks if any violations meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.violations.iter().any(|v| v.severity >= severity)
    }

    /// Sorts violations by file, then line, then column.
    pub fn sort(&mut self) {
        self.violations.sort_by(|a, b| {
            a.location
                .file
                .cmp(&b.location.file)
                .then(a.location.line.cmp(&b.location.line))
                .then(a.location.column.cmp(&b.location.column))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_violation(severity: Severity) -> Violation {
        Violation::new(
            "BSL001",
            "using-object-not-available-unix",
            severity,
            Location::new(PathBuf::from("CommonModules/Module.bsl"), 42, 10),
            "Object \"COMObject\" is not available on Linux",
        )
    }

    #[test]
    fn location_from_span_copies_all_fields() {
        let span = Span {
            offset: 120,
            len: 25,
            line: 7,
            column: 14,
        };
        let location = Location::from_span(PathBuf::from("a.bsl"), span);
        assert_eq!((location.line, location.column), (7, 14));
        assert_eq!((location.offset, location.length), (120, 25));
    }

    #[test]
    fn violation_display_is_compact() {
        let v = make_violation(Severity::Warning);
        assert_eq!(
            format!("{v}"),
            "CommonModules/Module.bsl:42:10: warning [BSL001] Object \"COMObject\" is not available on Linux"
        );
    }

    #[test]
    fn minutes_to_fix_is_unset_by_default() {
        assert!(make_violation(Severity::Error).minutes_to_fix.is_none());
        let v = make_violation(Severity::Error).with_minutes_to_fix(30);
        assert_eq!(v.minutes_to_fix, Some(30));
    }

    #[test]
    fn diagnostic_carries_span_and_help() {
        let mut v = make_violation(Severity::Error).with_suggestion(Suggestion::new("Guard it"));
        v.location = v.location.with_span(100, 9);
        let diagnostic = ViolationDiagnostic::from(&v);
        assert_eq!(diagnostic.span, SourceSpan::from((100, 9)));
        assert_eq!(diagnostic.help.as_deref(), Some("Guard it"));
        assert!(diagnostic.to_string().starts_with("[BSL001]"));
    }

    #[test]
    fn has_violations_at_error_only() {
        let mut result = LintResult::new();
        result.violations.push(make_violation(Severity::Warning));
        assert!(!result.has_violations_at(Severity::Error));
        assert!(result.has_violations_at(Severity::Warning));
        assert!(result.has_warnings());
        assert!(!result.has_errors());
    }

    #[test]
    fn total_minutes_to_fix_sums_known_efforts() {
        let mut result = LintResult::new();
        result
            .violations
            .push(make_violation(Severity::Error).with_minutes_to_fix(30));
        result
            .violations
            .push(make_violation(Severity::Error).with_minutes_to_fix(30));
        result.violations.push(make_violation(Severity::Info));
        assert_eq!(result.total_minutes_to_fix(), 60);
        assert_eq!(result.count_by_severity(), (2, 0, 1));
    }

    #[test]
    fn sort_orders_by_file_line_column() {
        let mut result = LintResult::new();
        let mut later = make_violation(Severity::Error);
        later.location = Location::new(PathBuf::from("b.bsl"), 1, 1);
        let mut earlier = make_violation(Severity::Error);
        earlier.location = Location::new(PathBuf::from("a.bsl"), 9, 3);
        let mut same_line = make_violation(Severity::Error);
        same_line.location = Location::new(PathBuf::from("a.bsl"), 9, 1);
        result.violations = vec![later, earlier, same_line];

        result.sort();

        let order: Vec<(String, usize)> = result
            .violations
            .iter()
            .map(|v| (v.location.file.display().to_string(), v.location.column))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.bsl".to_string(), 1),
                ("a.bsl".to_string(), 3),
                ("b.bsl".to_string(), 1)
            ]
        );
    }
}
