//! Comment-based allowance directives.
//!
//! Supports directives like:
//! ```text
//! // bsl-lint: allow(using-object-not-available-unix) reason="Windows-only module"
//! ```
//!
//! A directive applies to findings on its own line and on the line that
//! follows it.

use crate::syntax::SyntaxTree;
use std::collections::HashSet;

const DIRECTIVE_PREFIX: &str = "bsl-lint:";

/// Result of checking for allow directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowCheck {
    /// Rule is not allowed.
    Denied,
    /// Rule is allowed with optional reason.
    Allowed {
        /// The reason provided (if any).
        reason: Option<String>,
    },
}

impl AllowCheck {
    /// Returns true if allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Returns the reason if allowed.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed { reason } => reason.as_deref(),
            Self::Denied => None,
        }
    }
}

/// Parsed allowance directive.
#[derive(Debug, Clone)]
pub struct AllowDirective {
    /// Rule names that are allowed.
    pub rules: HashSet<String>,
    /// Optional reason for the allowance.
    pub reason: Option<String>,
}

impl AllowDirective {
    fn covers(&self, rule_name: &str) -> bool {
        self.rules.contains(rule_name) || self.rules.contains("all")
    }
}

/// Checks the comments of a module for an allowance covering `rule_name`
/// at `line` (1-indexed).
///
/// The line itself is checked first, then the line before it.
#[must_use]
pub fn check_allow_with_reason(tree: &SyntaxTree, line: usize, rule_name: &str) -> AllowCheck {
    for check_line in [line, line.saturating_sub(1)] {
        if check_line == 0 {
            continue;
        }
        let directive = tree
            .comments_on_line(check_line)
            .filter_map(parse_allow_directive)
            .find(|d| d.covers(rule_name));
        if let Some(directive) = directive {
            return AllowCheck::Allowed {
                reason: directive.reason,
            };
        }
    }

    AllowCheck::Denied
}

/// Parses an allowance directive from a `//` comment.
#[must_use]
pub fn parse_allow_directive(comment: &str) -> Option<AllowDirective> {
    let body = comment.trim().strip_prefix("//")?.trim_start_matches('/').trim();
    let directive = body.strip_prefix(DIRECTIVE_PREFIX)?.trim();
    let allow_content = directive.strip_prefix("allow(")?.trim();

    let paren_end = allow_content.find(')')?;
    let rules: HashSet<String> = allow_content[..paren_end]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if rules.is_empty() {
        return None;
    }

    let rest = allow_content[paren_end + 1..].trim();
    let reason = rest
        .strip_prefix("reason=")
        .and_then(|r| r.trim().strip_prefix('"'))
        .and_then(|r| r.find('"').map(|end| r[..end].to_string()))
        .filter(|r| !r.trim().is_empty());

    Some(AllowDirective { rules, reason })
}
