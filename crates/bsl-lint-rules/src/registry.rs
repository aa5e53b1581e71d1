//! Rule registry.

use crate::using_object_not_available_unix::{self, UsingObjectNotAvailableUnix};
use bsl_lint_core::{Config, RuleBox};

/// Returns every built-in rule with default settings.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    vec![Box::new(UsingObjectNotAvailableUnix::new())]
}

/// Returns every built-in rule, configured from the `[rules.*]` tables of
/// `config`.
///
/// Enabling and severity overrides are applied later by the analyzer.
///
/// # Errors
///
/// Returns an error if a rule option holds a pattern that cannot be compiled.
pub fn configured_rules(config: &Config) -> Result<Vec<RuleBox>, regex::Error> {
    let unix = match config.rule(using_object_not_available_unix::NAME) {
        Some(rule_config) => UsingObjectNotAvailableUnix::from_config(rule_config)?,
        None => UsingObjectNotAvailableUnix::new(),
    };
    Ok(vec![Box::new(unix)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_rules_have_unique_codes() {
        let rules = all_rules();
        let mut codes: Vec<&str> = rules.iter().map(|r| r.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), rules.len());
    }

    #[test]
    fn configured_rules_match_all_rules() {
        let config = Config::parse(
            "[rules.using-object-not-available-unix]\ntype_prefixes = [\"AddIn\"]\n",
        )
        .expect("parse");
        let names: Vec<&str> = configured_rules(&config)
            .expect("rules should build")
            .iter()
            .map(|r| r.name())
            .collect();
        let expected: Vec<&str> = all_rules().iter().map(|r| r.name()).collect();
        assert_eq!(names, expected);
    }
}
