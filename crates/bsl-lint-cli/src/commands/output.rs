//! Shared output formatting for lint results.

use anyhow::Result;
use bsl_lint_core::{LintResult, Severity, ViolationDiagnostic};
use miette::{NamedSource, Report};
use std::fmt::Write;
use std::path::Path;

use crate::OutputFormat;

/// Print lint results in the specified format.
///
/// `root` is where violation paths are relative to; the rich format reads
/// sources from there.
pub fn print(result: &LintResult, format: OutputFormat, root: &Path) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_text(result)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Compact => print!("{}", render_compact(result)),
        OutputFormat::Rich => print_rich(result, root),
    }
    Ok(())
}

fn render_text(result: &LintResult) -> String {
    let (errors, warnings, infos) = result.count_by_severity();
    let mut out = String::new();

    for violation in &result.violations {
        let severity_indicator = match violation.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
        };

        let _ = writeln!(
            out,
            "{} {} at {}:{}:{}",
            violation.code,
            violation.rule,
            violation.location.file.display(),
            violation.location.line,
            violation.location.column,
        );
        let _ = writeln!(out, "  {severity_indicator}: {}", violation.message);
        if let Some(suggestion) = &violation.suggestion {
            let _ = writeln!(out, "  = help: {}", suggestion.message);
        }
        out.push('\n');
    }

    for skipped in &result.files_skipped {
        let _ = writeln!(out, "\x1b[33mskipped\x1b[0m {} (parse error)", skipped.display());
    }

    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    let _ = writeln!(
        out,
        "{summary_color}Found {errors} error(s), {warnings} warning(s), {infos} info(s) in {} file(s)\x1b[0m",
        result.files_checked
    );
    let minutes = result.total_minutes_to_fix();
    if minutes > 0 {
        let _ = writeln!(out, "Estimated effort: {minutes} min");
    }
    out
}

fn render_compact(result: &LintResult) -> String {
    result
        .violations
        .iter()
        .fold(String::new(), |mut out, violation| {
            let _ = writeln!(out, "{violation}");
            out
        })
}

fn print_rich(result: &LintResult, root: &Path) {
    for violation in &result.violations {
        let report = Report::new(ViolationDiagnostic::from(violation));
        let path = root.join(&violation.location.file);
        match std::fs::read_to_string(&path) {
            Ok(source) => {
                let name = violation.location.file.display().to_string();
                eprintln!("{:?}", report.with_source_code(NamedSource::new(name, source)));
            }
            Err(e) => {
                tracing::debug!("Cannot read {} for rich output: {}", path.display(), e);
                eprintln!("{report:?}");
            }
        }
    }
    let (errors, warnings, infos) = result.count_by_severity();
    eprintln!(
        "Found {errors} error(s), {warnings} warning(s), {infos} info(s) in {} file(s)",
        result.files_checked
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsl_lint_core::{Location, Suggestion, Violation};
    use std::path::PathBuf;

    fn sample() -> LintResult {
        let mut result = LintResult::new();
        result.files_checked = 2;
        result.violations.push(
            Violation::new(
                "BSL001",
                "using-object-not-available-unix",
                Severity::Error,
                Location::new(PathBuf::from("Module.bsl"), 3, 5),
                "Check the use of \"Mail\": the object is not available on Linux",
            )
            .with_suggestion(Suggestion::new("Check the platform type"))
            .with_minutes_to_fix(30),
        );
        result.files_skipped.push(PathBuf::from("Broken.bsl"));
        result
    }

    #[test]
    fn compact_is_one_line_per_violation() {
        assert_eq!(
            render_compact(&sample()),
            "Module.bsl:3:5: error [BSL001] Check the use of \"Mail\": the object is not available on Linux\n"
        );
    }

    #[test]
    fn text_includes_help_summary_and_effort() {
        let text = render_text(&sample());
        assert!(text.starts_with("BSL001 using-object-not-available-unix at Module.bsl:3:5\n"));
        assert!(text.contains("  = help: Check the platform type\n"));
        assert!(text.contains("Broken.bsl (parse error)"));
        assert!(text.contains("Found 1 error(s), 0 warning(s), 0 info(s) in 2 file(s)"));
        assert!(text.contains("Estimated effort: 30 min"));
    }

    #[test]
    fn json_round_trips_violation_fields() {
        let json = serde_json::to_value(sample()).expect("serializes");
        assert_eq!(json["violations"][0]["code"], "BSL001");
        assert_eq!(json["violations"][0]["minutes_to_fix"], 30);
        assert_eq!(json["files_skipped"][0], "Broken.bsl");
    }
}
