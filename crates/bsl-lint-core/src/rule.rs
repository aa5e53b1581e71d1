//! Rule trait and rule metadata.

use crate::context::FileContext;
use crate::language::SourceLanguage;
use crate::syntax::SyntaxTree;
use crate::types::{Severity, Violation};
use serde::{Deserialize, Serialize};

/// What kind of problem a rule detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// Code that fails at runtime.
    Error,
    /// Maintainability problem.
    CodeSmell,
    /// Security problem.
    Vulnerability,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::CodeSmell => write!(f, "code-smell"),
            Self::Vulnerability => write!(f, "vulnerability"),
        }
    }
}

/// Which dialects a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    /// Both `.bsl` and `.os` files.
    All,
    /// Only 1C:Enterprise modules.
    Bsl,
    /// Only OneScript scripts.
    Os,
}

impl std::fmt::Display for RuleScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Bsl => write!(f, "bsl"),
            Self::Os => write!(f, "os"),
        }
    }
}

impl RuleScope {
    /// Returns true if files of `language` are in scope.
    #[must_use]
    pub fn covers(self, language: SourceLanguage) -> bool {
        match self {
            Self::All => true,
            Self::Bsl => language == SourceLanguage::Bsl,
            Self::Os => language == SourceLanguage::Os,
        }
    }
}

/// Static description of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMetadata {
    /// Problem category.
    pub kind: DiagnosticKind,
    /// Estimated effort to fix one finding.
    pub minutes_to_fix: u32,
    /// Dialects the rule runs on.
    pub scope: RuleScope,
}

impl Default for RuleMetadata {
    fn default() -> Self {
        Self {
            kind: DiagnosticKind::CodeSmell,
            minutes_to_fix: 5,
            scope: RuleScope::All,
        }
    }
}

/// A per-file lint rule over the module syntax tree.
///
/// Implement this trait to create rules that analyze individual modules.
/// Rules receive the parsed tree and usually walk it with a
/// [`Visit`](crate::syntax::visit::Visit) implementation.
///
/// # Example
///
/// ```ignore
/// use bsl_lint_core::{Rule, FileContext, Violation};
/// use bsl_lint_core::syntax::{SyntaxTree, visit::Visit};
///
/// pub struct NoExecute;
///
/// impl Rule for NoExecute {
///     fn name(&self) -> &'static str { "no-execute" }
///     fn code(&self) -> &'static str { "BSL100" }
///
///     fn check(&self, ctx: &FileContext, tree: &SyntaxTree) -> Vec<Violation> {
///         let mut visitor = ExecuteVisitor::new(ctx);
///         visitor.visit_tree(tree);
///         visitor.violations
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case name of this rule.
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "BSL001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for violations from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Returns the rule's category, effort estimate and scope.
    fn metadata(&self) -> RuleMetadata {
        RuleMetadata::default()
    }

    /// Whether this rule requires a reason when using allow directives.
    ///
    /// By default, rules with `Severity::Error` require a reason.
    fn requires_allow_reason(&self) -> bool {
        self.default_severity() == Severity::Error
    }

    /// Checks a single module and returns any violations found, in
    /// visitation order.
    fn check(&self, ctx: &FileContext, tree: &SyntaxTree) -> Vec<Violation>;
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;
