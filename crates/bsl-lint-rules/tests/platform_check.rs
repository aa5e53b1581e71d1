//! Integration test: built-in rules end-to-end via Analyzer.
//!
//! Uses the configuration-shaped fixture tree under `tests/fixtures/platform/`.

use bsl_lint_core::{Analyzer, Config, LintResult, Severity};
use bsl_lint_rules::configured_rules;
use std::path::PathBuf;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/platform")
}

fn run(config_toml: &str) -> LintResult {
    let config = Config::parse(config_toml).expect("fixture config should parse");
    let rules = configured_rules(&config).expect("rules should build");

    let mut builder = Analyzer::builder().root(fixture_root()).config(config);
    for rule in rules {
        builder = builder.rule_box(rule);
    }
    let analyzer = builder.build().expect("analyzer should build");
    analyzer.analyze().expect("analysis should succeed")
}

fn compact(result: &LintResult) -> String {
    result
        .violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn reports_unguarded_instantiations_in_bsl_modules() {
    let result = run("");

    assert_eq!(result.files_checked, 4);
    assert!(result.files_skipped.is_empty());
    insta::assert_snapshot!(compact(&result), @r#"
    CommonModules/Integration/Ext/Module.bsl:9:13: error [BSL001] Проверьте использование "COMОбъект": объект недоступен в Linux
    DataProcessors/Export/Ext/ObjectModule.bsl:3:11: error [BSL001] Проверьте использование "COMObject": объект недоступен в Linux
    DataProcessors/Export/Ext/ObjectModule.bsl:10:11: error [BSL001] Проверьте использование "Mail": объект недоступен в Linux
    "#);
    assert_eq!(result.total_minutes_to_fix(), 90);
}

#[test]
fn onescript_files_are_out_of_scope() {
    let result = run("");
    assert!(result
        .violations
        .iter()
        .all(|v| v.location.file.extension().is_some_and(|e| e == "bsl")));
}

#[test]
fn english_messages_and_severity_override() {
    let result = run(
        r#"
[analyzer]
language = "en"

[rules.using-object-not-available-unix]
severity = "warning"
"#,
    );

    assert_eq!(result.violations.len(), 3);
    assert!(!result.has_errors());
    assert!(result.violations.iter().all(|v| v.severity == Severity::Warning));
    assert_eq!(
        result.violations[0].message,
        "Check the use of \"COMОбъект\": the object is not available on Linux"
    );
}

#[test]
fn custom_guard_token_changes_what_counts_as_a_check() {
    let result = run(
        r#"
[rules.using-object-not-available-unix]
guard_token = "Windows_x86_64"
"#,
    );

    let lines: Vec<(String, usize)> = result
        .violations
        .iter()
        .map(|v| (v.location.file.display().to_string(), v.location.line))
        .collect();
    assert_eq!(
        lines,
        vec![
            ("CommonModules/Integration/Ext/Module.bsl".to_string(), 9),
            ("DataProcessors/Export/Ext/ManagerModule.bsl".to_string(), 6),
            ("DataProcessors/Export/Ext/ObjectModule.bsl".to_string(), 10),
        ]
    );
}

#[test]
fn disabled_rule_reports_nothing() {
    let result = run("[rules.using-object-not-available-unix]\nenabled = false\n");
    assert!(result.violations.is_empty());
    assert_eq!(result.files_checked, 4);
}
