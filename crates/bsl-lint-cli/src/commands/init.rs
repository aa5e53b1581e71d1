//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const CONFIG_FILE_NAME: &str = "bsl-lint.toml";

const DEFAULT_CONFIG: &str = r#"# bsl-lint configuration

# Fail `bsl-lint check` on violations at or above this severity
# fail_on = "error"

[analyzer]
# Root directory to analyze (default: current directory)
# root = "./src"

# Glob patterns to exclude from analysis
exclude = [
    "**/vendor/**",
]

# Respect .gitignore files
respect_gitignore = true

# Language of diagnostic messages: "ru" or "en"
language = "ru"

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden

[rules.using-object-not-available-unix]
enabled = true
# severity = "warning"  # Override default severity
# Type names that are not available on Linux (case-insensitive prefixes)
# type_prefixes = ["COMObject", "COMОбъект", "Mail", "Почта"]
# Text that marks a platform check in an enclosing If branch
# guard_token = "Linux_x86"
"#;

/// Runs the init command, writing `bsl-lint.toml` into `dir`.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created {CONFIG_FILE_NAME}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE_NAME} to configure rules");
    println!("  2. Run: bsl-lint check");

    Ok(())
}
