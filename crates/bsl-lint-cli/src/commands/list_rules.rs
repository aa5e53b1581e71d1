//! List rules command implementation.

use bsl_lint_rules::all_rules;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!(
        "{:<8} {:<34} {:<8} {:<6} {:<7} {:<8} Description",
        "Code", "Name", "Severity", "Scope", "Effort", "Type"
    );
    println!("{}", "-".repeat(120));

    for rule in all_rules() {
        let metadata = rule.metadata();
        println!(
            "{:<8} {:<34} {:<8} {:<6} {:<7} {:<8} {}",
            rule.code(),
            rule.name(),
            rule.default_severity().to_string(),
            metadata.scope.to_string(),
            format!("{} min", metadata.minutes_to_fix),
            metadata.kind.to_string(),
            rule.description()
        );
    }

    println!("\nUse --rules to filter specific rules, e.g.:");
    println!("  bsl-lint check --rules using-object-not-available-unix");
    println!("  bsl-lint check --rules BSL001");
}
