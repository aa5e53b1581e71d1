//! Check command implementation.

use anyhow::{Context, Result};
use bsl_lint_core::{Analyzer, Config, RuleBox};
use bsl_lint_rules::configured_rules;
use std::path::Path;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Command-line options of `check`.
#[derive(Debug, Default)]
pub struct CheckOptions {
    /// Output format.
    pub format: OutputFormat,
    /// Comma-separated rule names or codes to run.
    pub rules: Option<String>,
    /// Extra exclude globs.
    pub exclude: Vec<String>,
}

/// Runs the check command.
///
/// Returns `true` when violations at or above the configured `fail_on`
/// severity were found.
pub fn run(path: &Path, options: &CheckOptions, source: &ConfigSource) -> Result<bool> {
    let config = source.load()?;
    let fail_threshold = config.fail_threshold();

    let rules = select_rules(&config, options.rules.as_deref())?;

    let mut builder = Analyzer::builder()
        .root(path)
        .config(config)
        .excludes(options.exclude.iter().cloned());
    for rule in rules {
        builder = builder.rule_box(rule);
    }

    let analyzer = builder.build().context("Failed to build analyzer")?;

    tracing::info!(
        "Analyzing {} with {} rules",
        analyzer.root().display(),
        analyzer.rule_count()
    );

    let result = analyzer.analyze().context("Analysis failed")?;

    super::output::print(&result, options.format, analyzer.root())?;

    Ok(result.has_violations_at(fail_threshold))
}

/// Builds the configured rules, keeping only those named in `filter`.
fn select_rules(config: &Config, filter: Option<&str>) -> Result<Vec<RuleBox>> {
    let rules = configured_rules(config).context("Invalid rule configuration")?;
    let Some(filter) = filter else {
        return Ok(rules);
    };

    let wanted: Vec<&str> = filter
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    for name in &wanted {
        if !rules.iter().any(|r| r.name() == *name || r.code() == *name) {
            tracing::warn!("Unknown rule: {}", name);
        }
    }

    Ok(rules
        .into_iter()
        .filter(|r| wanted.iter().any(|w| r.name() == *w || r.code() == *w))
        .collect())
}
