//! Core analyzer for orchestrating lint execution.

use crate::config::Config;
use crate::context::FileContext;
use crate::language::SourceLanguage;
use crate::rule::{Rule, RuleBox};
use crate::syntax::{self, ParseError};
use crate::types::{LintResult, Violation};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reading a specific source file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path to the file that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Error parsing a BSL module.
    #[error("Parse error in {path}: {source}")]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Position and description of the failure.
        source: ParseError,
    },

    /// Directory traversal error.
    #[error("Failed to walk source tree: {0}")]
    Walk(#[from] ignore::Error),

    /// Glob pattern error.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    rules: Vec<RuleBox>,
    exclude_patterns: Vec<String>,
    config: Option<Config>,
    fail_on_parse_error: bool,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds a rule to the analyzer.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the analyzer.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets whether to fail on parse errors (default: false).
    #[must_use]
    pub fn fail_on_parse_error(mut self, fail: bool) -> Self {
        self.fail_on_parse_error = fail;
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be resolved or an
    /// exclude pattern is not a valid glob.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let root = self
            .root
            .or_else(|| self.config.as_ref().map(|c| c.analyzer.root.clone()))
            .unwrap_or_else(|| PathBuf::from("."));

        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        let config = self.config.unwrap_or_default();

        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(config.analyzer.exclude.iter().cloned());
        let exclude = exclude_patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Analyzer {
            root,
            rules: self.rules,
            exclude,
            config,
            fail_on_parse_error: self.fail_on_parse_error,
        })
    }
}

/// The main analyzer that orchestrates lint execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    rules: Vec<RuleBox>,
    exclude: Vec<glob::Pattern>,
    config: Config,
    fail_on_parse_error: bool,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root directory being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Analyzes all modules under the root and returns the results.
    ///
    /// # Errors
    ///
    /// Returns an error if file discovery or reading fails, or if a module
    /// fails to parse while `fail_on_parse_error` is set.
    pub fn analyze(&self) -> Result<LintResult, AnalyzerError> {
        info!("Starting analysis at {:?}", self.root);

        let mut result = LintResult::new();
        let files = self.discover_files()?;

        info!("Found {} files to analyze", files.len());

        for file_path in &files {
            match self.analyze_file(file_path) {
                Ok(violations) => {
                    result.violations.extend(violations);
                    result.files_checked += 1;
                }
                Err(AnalyzerError::Parse { path, source }) => {
                    warn!("Failed to parse {}: {}", path.display(), source);
                    if self.fail_on_parse_error {
                        return Err(AnalyzerError::Parse { path, source });
                    }
                    result.files_skipped.push(self.relative(&path));
                }
                Err(e) => return Err(e),
            }
        }

        result.sort();

        info!(
            "Analysis complete: {} violations in {} files ({} skipped)",
            result.violations.len(),
            result.files_checked,
            result.files_skipped.len()
        );

        Ok(result)
    }

    /// Analyzes a single module given as text.
    ///
    /// `path` is only used for the dialect and for reported locations.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::Parse`] if the module does not parse.
    pub fn analyze_source(&self, path: &Path, content: &str) -> Result<Vec<Violation>, AnalyzerError> {
        let tree = syntax::parse(content).map_err(|source| AnalyzerError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let ctx = FileContext::new(path, content, &self.root)
            .with_message_language(self.config.analyzer.language);
        let mut violations = Vec::new();

        for rule in &self.rules {
            if !self.config.is_rule_enabled(rule.name()) {
                debug!("Skipping disabled rule: {}", rule.name());
                continue;
            }

            let metadata = rule.metadata();
            if !metadata.scope.covers(ctx.language) {
                debug!(
                    "Skipping rule {} for {}: out of scope",
                    rule.name(),
                    ctx.relative_path.display()
                );
                continue;
            }

            let rule_violations = rule
                .check(&ctx, &tree)
                .into_iter()
                .map(|v| v.with_minutes_to_fix(metadata.minutes_to_fix))
                .collect();
            let rule_violations = self.apply_severity_override(rule.name(), rule_violations);
            violations.extend(rule_violations);
        }

        Ok(violations)
    }

    fn analyze_file(&self, path: &Path) -> Result<Vec<Violation>, AnalyzerError> {
        debug!("Analyzing: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|source| AnalyzerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.analyze_source(path, &content)
    }

    /// Applies severity overrides from configuration.
    fn apply_severity_override(
        &self,
        rule_name: &str,
        mut violations: Vec<Violation>,
    ) -> Vec<Violation> {
        if let Some(severity) = self.config.rule_severity(rule_name) {
            for v in &mut violations {
                v.severity = severity;
            }
        }
        violations
    }

    /// Discovers all `.bsl` and `.os` files to analyze, sorted by path.
    fn discover_files(&self) -> Result<Vec<PathBuf>, AnalyzerError> {
        let respect_gitignore = self.config.analyzer.respect_gitignore;
        let mut builder = ignore::WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .git_ignore(respect_gitignore)
            .git_global(respect_gitignore)
            .git_exclude(respect_gitignore)
            .require_git(false);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            let path = entry.path();

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            if SourceLanguage::from_path(path).is_none() {
                continue;
            }
            if self.should_exclude(path) {
                debug!("Excluding: {}", path.display());
                continue;
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Checks if a path matches any exclude pattern, relative to the root
    /// or as an absolute path.
    fn should_exclude(&self, path: &Path) -> bool {
        let relative = self.relative(path);
        self.exclude
            .iter()
            .any(|pattern| pattern.matches_path(&relative) || pattern.matches_path(path))
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{RuleMetadata, RuleScope};
    use crate::syntax::{SyntaxKind, SyntaxTree};
    use crate::types::{Location, Severity};

    /// Reports every `Выполнить` statement.
    struct ExecuteRule {
        scope: RuleScope,
    }

    impl Rule for ExecuteRule {
        fn name(&self) -> &'static str {
            "no-execute"
        }

        fn code(&self) -> &'static str {
            "T001"
        }

        fn metadata(&self) -> RuleMetadata {
            RuleMetadata {
                scope: self.scope,
                minutes_to_fix: 15,
                ..RuleMetadata::default()
            }
        }

        fn check(&self, ctx: &FileContext, tree: &SyntaxTree) -> Vec<Violation> {
            tree.descendants(tree.root())
                .filter(|&n| tree.kind(n) == SyntaxKind::ExecuteStatement)
                .map(|n| {
                    Violation::new(
                        self.code(),
                        self.name(),
                        Severity::Error,
                        Location::from_span(ctx.relative_path.clone(), tree.span(n)),
                        "Execute is forbidden",
                    )
                })
                .collect()
        }
    }

    fn analyzer(scope: RuleScope, config: Config) -> Analyzer {
        Analyzer::builder()
            .root(".")
            .rule(ExecuteRule { scope })
            .config(config)
            .build()
            .expect("Failed to build analyzer")
    }

    #[test]
    fn test_builder() {
        let analyzer = Analyzer::builder()
            .root(".")
            .exclude("**/vendor/**")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.root().exists());
        assert_eq!(analyzer.rule_count(), 0);
    }

    #[test]
    fn invalid_exclude_pattern_fails_build() {
        let result = Analyzer::builder().root(".").exclude("src/[").build();
        assert!(matches!(result, Err(AnalyzerError::Glob(_))));
    }

    #[test]
    fn test_exclude_patterns() {
        let analyzer = Analyzer::builder()
            .root("/project")
            .exclude("**/vendor/**")
            .exclude("**/*Test*.bsl")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.should_exclude(Path::new("/project/vendor/lib/Module.bsl")));
        assert!(analyzer.should_exclude(Path::new("/project/src/ModuleTests.bsl")));
        assert!(!analyzer.should_exclude(Path::new("/project/src/Module.bsl")));
    }

    #[test]
    fn analyze_source_attaches_effort_and_overrides_severity() {
        let config = Config::parse("[rules.no-execute]\nseverity = \"warning\"\n").expect("parse");
        let analyzer = analyzer(RuleScope::All, config);

        let violations = analyzer
            .analyze_source(Path::new("Module.bsl"), "Выполнить(\"Сообщить(1)\");")
            .expect("should analyze");

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Warning);
        assert_eq!(violations[0].minutes_to_fix, Some(15));
    }

    #[test]
    fn out_of_scope_rule_is_skipped() {
        let analyzer = analyzer(RuleScope::Bsl, Config::default());

        let bsl = analyzer
            .analyze_source(Path::new("Module.bsl"), "Выполнить(Код);")
            .expect("should analyze");
        let os = analyzer
            .analyze_source(Path::new("script.os"), "Выполнить(Код);")
            .expect("should analyze");

        assert_eq!(bsl.len(), 1);
        assert!(os.is_empty());
    }

    #[test]
    fn disabled_rule_is_skipped() {
        let config = Config::parse("[rules.no-execute]\nenabled = false\n").expect("parse");
        let analyzer = analyzer(RuleScope::All, config);
        let violations = analyzer
            .analyze_source(Path::new("Module.bsl"), "Выполнить(Код);")
            .expect("should analyze");
        assert!(violations.is_empty());
    }

    #[test]
    fn parse_failure_is_reported_with_path() {
        let analyzer = analyzer(RuleScope::All, Config::default());
        let err = analyzer
            .analyze_source(Path::new("Broken.bsl"), "Если А Тогда")
            .unwrap_err();
        match err {
            AnalyzerError::Parse { path, .. } => assert_eq!(path, PathBuf::from("Broken.bsl")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
