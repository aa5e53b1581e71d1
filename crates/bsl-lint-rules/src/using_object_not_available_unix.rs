//! Rule to flag objects that do not exist on Linux unless they are created
//! under a platform check.
//!
//! # Rationale
//!
//! `COMObject` and `Mail` (`COMОбъект`, `Почта`) are Windows-only. Creating
//! them on a Linux server or client raises a runtime error, so every
//! instantiation must sit inside a branch that checks the platform type.
//!
//! ```bsl
//! Если СистемнаяИнформация.ТипПлатформы = ТипПлатформы.Linux_x86 Тогда
//!     Возврат;
//! Иначе
//!     Компонента = Новый COMОбъект("System.Text.UTF8Encoding"); // flagged
//! КонецЕсли;
//! ```
//!
//! # Guard resolution
//!
//! Enclosing `Если ... Тогда` branches are inspected from the innermost
//! outward. The first one whose reconstructed text contains the guard token
//! (case-insensitive) suppresses the finding. The whole branch is searched,
//! body included, so a mention of the token anywhere inside it counts.
//! Code under `ИначеЕсли` or `Иначе` is not inside the `Если` branch, so a
//! check in an `ИначеЕсли` condition does not guard its own body.
//!
//! # Configuration
//!
//! - `type_prefixes`: type names to flag, matched as case-insensitive
//!   prefixes (default: `COMObject`, `COMОбъект`, `Mail`, `Почта`)
//! - `guard_token`: text that marks a platform check (default: `Linux_x86`)
//!
//! # Suppression
//!
//! - `// bsl-lint: allow(using-object-not-available-unix) reason="..."`

use bsl_lint_core::syntax::visit::{walk_children, Visit};
use bsl_lint_core::syntax::{NodeId, SyntaxKind, SyntaxTree};
use bsl_lint_core::utils::allowance::check_allow_with_reason;
use bsl_lint_core::{
    DiagnosticKind, FileContext, Location, MessageLanguage, Rule, RuleConfig, RuleMetadata,
    RuleScope, Severity, Suggestion, Violation,
};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Rule code for using-object-not-available-unix.
pub const CODE: &str = "BSL001";

/// Rule name for using-object-not-available-unix.
pub const NAME: &str = "using-object-not-available-unix";

/// Type names that are unavailable on Linux.
pub const DEFAULT_TYPE_PREFIXES: &[&str] = &["COMObject", "COMОбъект", "Mail", "Почта"];

/// Token whose presence in an enclosing branch marks a platform check.
pub const DEFAULT_GUARD_TOKEN: &str = "Linux_x86";

const MINUTES_TO_FIX: u32 = 30;

static DEFAULT_TYPE_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| prefix_pattern(DEFAULT_TYPE_PREFIXES.iter().copied()).ok().flatten());

static DEFAULT_GUARD_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| token_pattern(DEFAULT_GUARD_TOKEN).ok().flatten());

/// Builds `(?i)^(?:p1|p2|...)` from literal prefixes; `None` when there are
/// no non-empty prefixes.
fn prefix_pattern<'a>(
    prefixes: impl IntoIterator<Item = &'a str>,
) -> Result<Option<Regex>, regex::Error> {
    let alternatives: Vec<String> = prefixes
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    Regex::new(&format!("(?i)^(?:{})", alternatives.join("|"))).map(Some)
}

fn token_pattern(token: &str) -> Result<Option<Regex>, regex::Error> {
    if token.is_empty() {
        return Ok(None);
    }
    Regex::new(&format!("(?i){}", regex::escape(token))).map(Some)
}

/// Decides whether a type name is one of the flagged types.
#[derive(Debug, Clone)]
pub struct TypeNameMatcher {
    pattern: Option<Regex>,
}

impl Default for TypeNameMatcher {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_TYPE_PATTERN.clone(),
        }
    }
}

impl TypeNameMatcher {
    /// Creates a matcher for the given literal prefixes.
    ///
    /// # Errors
    ///
    /// Returns an error if the combined pattern exceeds regex size limits.
    pub fn new<'a>(prefixes: impl IntoIterator<Item = &'a str>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: prefix_pattern(prefixes)?,
        })
    }

    /// Returns true if `type_name` starts with a flagged prefix, ignoring
    /// case. Absent or empty names never match.
    #[must_use]
    pub fn matches(&self, type_name: Option<&str>) -> bool {
        match (type_name, &self.pattern) {
            (Some(name), Some(pattern)) if !name.is_empty() => pattern.is_match(name),
            _ => false,
        }
    }
}

/// Decides whether an instantiation sits under a platform check.
#[derive(Debug, Clone)]
pub struct GuardResolver {
    pattern: Option<Regex>,
}

impl Default for GuardResolver {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_GUARD_PATTERN.clone(),
        }
    }
}

impl GuardResolver {
    /// Creates a resolver for a literal guard token.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern exceeds regex size limits.
    pub fn new(token: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: token_pattern(token)?,
        })
    }

    /// Returns true if some enclosing conditional branch of `node` mentions
    /// the guard token.
    #[must_use]
    pub fn is_guarded(&self, tree: &SyntaxTree, node: NodeId) -> bool {
        let Some(pattern) = &self.pattern else {
            return false;
        };
        tree.ancestors(node)
            .filter(|&ancestor| tree.kind(ancestor).is_conditional_branch())
            .any(|branch| pattern.is_match(&tree.text(branch)))
    }
}

/// Flags `Новый COMОбъект`/`Новый Почта` outside a Linux platform check.
#[derive(Debug, Clone)]
pub struct UsingObjectNotAvailableUnix {
    matcher: TypeNameMatcher,
    guard: GuardResolver,
    guard_token: String,
    /// Custom severity.
    pub severity: Severity,
}

impl Default for UsingObjectNotAvailableUnix {
    fn default() -> Self {
        Self::new()
    }
}

impl UsingObjectNotAvailableUnix {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            matcher: TypeNameMatcher::default(),
            guard: GuardResolver::default(),
            guard_token: DEFAULT_GUARD_TOKEN.to_string(),
            severity: Severity::Error,
        }
    }

    /// Creates the rule from its `[rules.using-object-not-available-unix]`
    /// table.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured pattern cannot be compiled.
    pub fn from_config(config: &RuleConfig) -> Result<Self, regex::Error> {
        let mut rule = Self::new();
        if let Some(prefixes) = config.get_str_array("type_prefixes") {
            rule.matcher = TypeNameMatcher::new(prefixes.iter().map(String::as_str))?;
        }
        let token = config.get_str("guard_token", DEFAULT_GUARD_TOKEN);
        if token != DEFAULT_GUARD_TOKEN {
            rule.guard = GuardResolver::new(token)?;
            rule.guard_token = token.to_string();
        }
        Ok(rule)
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Rule for UsingObjectNotAvailableUnix {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Flags COMObject and Mail instantiations not guarded by a Linux platform check"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn metadata(&self) -> RuleMetadata {
        RuleMetadata {
            kind: DiagnosticKind::Error,
            minutes_to_fix: MINUTES_TO_FIX,
            scope: RuleScope::Bsl,
        }
    }

    fn check(&self, ctx: &FileContext, tree: &SyntaxTree) -> Vec<Violation> {
        let mut visitor = NewExpressionVisitor {
            ctx,
            rule: self,
            violations: Vec::new(),
        };
        visitor.visit_tree(tree);
        visitor.violations
    }
}

struct NewExpressionVisitor<'a> {
    ctx: &'a FileContext<'a>,
    rule: &'a UsingObjectNotAvailableUnix,
    violations: Vec<Violation>,
}

impl NewExpressionVisitor<'_> {
    fn report(&mut self, tree: &SyntaxTree, node: NodeId, type_name: &str) {
        let span = tree.span(node);
        let location = Location::from_span(self.ctx.relative_path.clone(), span);

        let allow_check = check_allow_with_reason(tree, span.line, NAME);
        if allow_check.is_allowed() {
            if self.rule.requires_allow_reason() && allow_check.reason().is_none() {
                self.violations.push(
                    Violation::new(
                        CODE,
                        NAME,
                        Severity::Warning,
                        location,
                        format!("Allow directive for '{NAME}' is missing required reason"),
                    )
                    .with_suggestion(Suggestion::new(
                        "Add reason=\"...\" to explain why this exception is necessary",
                    )),
                );
            }
            return;
        }

        let language = self.ctx.message_language;
        self.violations.push(
            Violation::new(
                CODE,
                NAME,
                self.rule.severity,
                location,
                message(language, type_name),
            )
            .with_suggestion(Suggestion::new(suggestion(language, &self.rule.guard_token))),
        );
    }
}

impl Visit for NewExpressionVisitor<'_> {
    fn visit_new_expression(&mut self, tree: &SyntaxTree, node: NodeId) {
        let type_name = tree
            .child_of_kind(node, SyntaxKind::TypeName)
            .map(|id| tree.text(id));

        if self.rule.matcher.matches(type_name.as_deref()) {
            let type_name = type_name.unwrap_or_default();
            if self.rule.guard.is_guarded(tree, node) {
                debug!(
                    "{}:{}: '{}' is under a platform check",
                    self.ctx.relative_path.display(),
                    tree.span(node).line,
                    type_name
                );
            } else {
                self.report(tree, node, &type_name);
            }
        }

        walk_children(self, tree, node);
    }
}

fn message(language: MessageLanguage, type_name: &str) -> String {
    match language {
        MessageLanguage::Ru => {
            format!("Проверьте использование \"{type_name}\": объект недоступен в Linux")
        }
        MessageLanguage::En => {
            format!("Check the use of \"{type_name}\": the object is not available on Linux")
        }
    }
}

fn suggestion(language: MessageLanguage, guard_token: &str) -> String {
    match language {
        MessageLanguage::Ru => format!(
            "Создавайте объект внутри условия, проверяющего тип платформы ({guard_token})"
        ),
        MessageLanguage::En => {
            format!("Create the object inside a branch that checks the platform type ({guard_token})")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsl_lint_core::syntax::parse;
    use bsl_lint_core::Config;
    use std::path::{Path, PathBuf};

    fn check_with(
        rule: &UsingObjectNotAvailableUnix,
        code: &str,
        language: MessageLanguage,
    ) -> Vec<Violation> {
        let tree = parse(code).expect("Failed to parse");
        let ctx = FileContext::new(Path::new("Module.bsl"), code, Path::new("."))
            .with_message_language(language);
        rule.check(&ctx, &tree)
    }

    fn check_code(code: &str) -> Vec<Violation> {
        check_with(&UsingObjectNotAvailableUnix::new(), code, MessageLanguage::En)
    }

    #[test]
    fn test_detects_top_level_com_object() {
        let violations = check_code("New COMObject(\"X\");");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].code, CODE);
        assert_eq!(violations[0].severity, Severity::Error);
        assert!(violations[0].message.contains("\"COMObject\""));
        assert_eq!(violations[0].location.file, PathBuf::from("Module.bsl"));
        assert_eq!(
            (violations[0].location.line, violations[0].location.column),
            (1, 1)
        );
    }

    #[test]
    fn test_guarded_by_nearest_branch() {
        let violations =
            check_code("If Platform = Linux_x86 Then\n    New COMObject(\"X\");\nEndIf;");
        assert!(violations.is_empty());
    }

    #[test]
    fn test_guarded_by_outer_branch() {
        let code = "If Platform = Linux_x86 Then\n    If OtherCond Then\n        New COMObject(\"X\");\n    EndIf;\nEndIf;";
        assert!(check_code(code).is_empty());
    }

    #[test]
    fn test_unrelated_condition_does_not_guard() {
        let violations = check_code("If OtherCond Then\n    New COMObject(\"X\");\nEndIf;");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location.line, 2);
    }

    #[test]
    fn test_nested_branches_without_guard() {
        let code = "If A Then\n    If B Then\n        Obj = New Mail;\n    EndIf;\nEndIf;";
        let violations = check_code(code);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("\"Mail\""));
    }

    #[test]
    fn test_ignores_unrelated_types() {
        let code = "New SomeUnrelatedObject(\"X\");\nIf A Then\n    B = New Array;\nEndIf;";
        assert!(check_code(code).is_empty());
    }

    #[test]
    fn test_detects_cyrillic_alias() {
        let violations = check_code("Компонента = Новый COMОбъект(\"System.Text.UTF8Encoding\");");
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("\"COMОбъект\""));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let code = "А = Новый comobject(\"X\");\nБ = Новый ПОЧТА;\nЕсли Тип = linux_X86 Тогда\n    В = Новый COMОБЪЕКТ(\"X\");\nКонецЕсли;";
        let violations = check_code(code);
        let lines: Vec<usize> = violations.iter().map(|v| v.location.line).collect();
        assert_eq!(lines, vec![1, 2]);
        assert!(violations[0].message.contains("\"comobject\""));
    }

    #[test]
    fn test_prefix_match_covers_longer_names() {
        let violations = check_code("X = New COMObjectWrapper;\nY = New MailMessage;");
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_prefix_must_start_the_name() {
        assert!(check_code("X = New InternetMail;").is_empty());
    }

    #[test]
    fn test_elsif_condition_does_not_guard() {
        let code = "If Windows Then\n    Path = 1;\nElsIf Platform = Linux_x86 Then\n    New COMObject(\"X\");\nEndIf;";
        let violations = check_code(code);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location.line, 4);
    }

    #[test]
    fn test_if_enclosing_elsif_still_guards() {
        let code = "Если Платформа = Linux_x86 Тогда\n    Если А Тогда\n        Х = 1;\n    ИначеЕсли Б Тогда\n        Новый COMОбъект(\"X\");\n    КонецЕсли;\nКонецЕсли;";
        assert!(check_code(code).is_empty());
    }

    #[test]
    fn test_guard_in_sibling_branch_does_not_count() {
        let code = "If Platform = Linux_x86 Then\n    Return;\nElsIf Other Then\n    New COMObject(\"X\");\nElse\n    New COMObject(\"Y\");\nEndIf;";
        let violations = check_code(code);
        let lines: Vec<usize> = violations.iter().map(|v| v.location.line).collect();
        assert_eq!(lines, vec![4, 6]);
    }

    #[test]
    fn test_guard_token_in_branch_body_suppresses() {
        let code = "If OtherCond Then\n    Message(\"Linux_x86 is not supported\");\n    New COMObject(\"X\");\nEndIf;";
        assert!(check_code(code).is_empty());
    }

    #[test]
    fn test_comment_in_branch_does_not_guard() {
        let code = "If OtherCond Then\n    // Linux_x86\n    New COMObject(\"X\");\nEndIf;";
        assert_eq!(check_code(code).len(), 1);
    }

    #[test]
    fn test_dynamic_type_form_is_ignored() {
        assert!(check_code("Obj = New(\"COMObject\", Params);").is_empty());
    }

    #[test]
    fn test_reports_inside_methods_and_arguments() {
        let code = "Procedure Init()\n    Send(New Mail, New COMObject(\"X\"));\nEndProcedure";
        let violations = check_code(code);
        assert_eq!(violations.len(), 2);
        assert!(violations[0].location.column < violations[1].location.column);
    }

    #[test]
    fn test_russian_message() {
        let violations = check_with(
            &UsingObjectNotAvailableUnix::new(),
            "Компонента = Новый COMОбъект(\"X\");",
            MessageLanguage::Ru,
        );
        assert_eq!(
            violations[0].message,
            "Проверьте использование \"COMОбъект\": объект недоступен в Linux"
        );
        let suggestion = violations[0].suggestion.as_ref().expect("has suggestion");
        assert!(suggestion.message.contains("Linux_x86"));
    }

    #[test]
    fn test_allow_with_reason() {
        let code = "// bsl-lint: allow(using-object-not-available-unix) reason=\"Windows-only server\"\nObj = New COMObject(\"X\");";
        assert!(check_code(code).is_empty());
    }

    #[test]
    fn test_allow_without_reason_warns() {
        let code = "Obj = New COMObject(\"X\"); // bsl-lint: allow(using-object-not-available-unix)";
        let violations = check_code(code);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Warning);
        assert!(violations[0].message.contains("missing required reason"));
    }

    #[test]
    fn test_config_overrides_prefixes_and_token() {
        let config = Config::parse(
            r#"
[rules.using-object-not-available-unix]
type_prefixes = ["AddIn"]
guard_token = "ТипПлатформы.Linux"
"#,
        )
        .expect("parse");
        let rule = UsingObjectNotAvailableUnix::from_config(
            config.rule(NAME).expect("rule table should exist"),
        )
        .expect("patterns should compile");

        let code = "A = New COMObject(\"X\");\nB = New AddInObject;\nЕсли Тип = ТипПлатформы.Linux_x86_64 Тогда\n    C = New AddInObject;\nКонецЕсли;";
        let violations = check_with(&rule, code, MessageLanguage::En);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location.line, 2);
        let suggestion = violations[0].suggestion.as_ref().expect("has suggestion");
        assert!(suggestion.message.contains("ТипПлатформы.Linux"));
    }

    #[test]
    fn test_empty_prefix_list_disables_matching() {
        let matcher = TypeNameMatcher::new(Vec::<&str>::new()).expect("compiles");
        assert!(!matcher.matches(Some("COMObject")));
    }

    #[test]
    fn test_matcher_short_circuits_absent_names() {
        let matcher = TypeNameMatcher::default();
        assert!(!matcher.matches(None));
        assert!(!matcher.matches(Some("")));
        assert!(matcher.matches(Some("Почта")));
    }

    #[test]
    fn test_metadata() {
        let rule = UsingObjectNotAvailableUnix::new();
        let metadata = rule.metadata();
        assert_eq!(metadata.kind, DiagnosticKind::Error);
        assert_eq!(metadata.minutes_to_fix, 30);
        assert_eq!(metadata.scope, RuleScope::Bsl);
        assert!(rule.requires_allow_reason());
        assert_eq!(rule.severity(Severity::Warning).default_severity(), Severity::Warning);
    }
}
