//! Locating and loading `bsl-lint.toml`.
//!
//! Priority order:
//!
//! 1. `--config <FILE>`
//! 2. `bsl-lint.toml` or `.bsl-lint.toml` in the analyzed directory or the
//!    nearest ancestor that has one
//! 3. `config.toml` in the global directory (`$BSL_LINT_CONFIG_DIR`, else
//!    `~/.bsl-lint/`)
//! 4. Built-in defaults

use anyhow::{Context, Result};
use bsl_lint_core::Config;
use std::path::{Path, PathBuf};

/// Where the configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given on the command line.
    Explicit(PathBuf),
    /// Found next to the sources.
    Project(PathBuf),
    /// Found in the global config directory.
    Global(PathBuf),
    /// Nothing found.
    Default,
}

impl ConfigSource {
    /// The config file, unless defaults are used.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Reads and parses the config file, or returns defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid configuration.
    pub fn load(&self) -> Result<Config> {
        let Some(path) = self.path() else {
            tracing::debug!("No configuration file, using defaults");
            return Ok(Config::default());
        };
        if let Self::Global(p) = self {
            tracing::info!("Using global config: {}", p.display());
        }
        Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
    }
}

const PROJECT_FILE_NAMES: [&str; 2] = ["bsl-lint.toml", ".bsl-lint.toml"];
const GLOBAL_FILE_NAME: &str = "config.toml";
const CONFIG_DIR_ENV: &str = "BSL_LINT_CONFIG_DIR";

/// Resolves the configuration for a run over `project_dir`.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    let project_dir = project_dir
        .canonicalize()
        .unwrap_or_else(|_| project_dir.to_path_buf());
    resolve_with(&project_dir, explicit, global_config_dir().as_deref())
}

fn resolve_with(
    project_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<&Path>,
) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::Explicit(path.to_path_buf());
    }

    if let Some(found) = find_project_config(project_dir) {
        tracing::debug!("Found project config: {}", found.display());
        return ConfigSource::Project(found);
    }

    global_dir
        .map(|dir| dir.join(GLOBAL_FILE_NAME))
        .filter(|candidate| candidate.is_file())
        .map_or(ConfigSource::Default, ConfigSource::Global)
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    start.ancestors().find_map(|dir| {
        PROJECT_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

/// Global config directory: `$BSL_LINT_CONFIG_DIR`, else `~/.bsl-lint`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => home::home_dir().map(|home| home.join(".bsl-lint")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(path, content).expect("write file");
    }

    #[test]
    fn explicit_wins_and_is_not_checked() {
        let tmp = TempDir::new().expect("tempdir");
        touch(&tmp.path().join("bsl-lint.toml"), "");

        let result = resolve_with(tmp.path(), Some(Path::new("/missing/custom.toml")), None);
        assert_eq!(
            result,
            ConfigSource::Explicit(PathBuf::from("/missing/custom.toml"))
        );
    }

    #[test]
    fn plain_name_preferred_over_dotted() {
        let tmp = TempDir::new().expect("tempdir");
        touch(&tmp.path().join("bsl-lint.toml"), "");
        touch(&tmp.path().join(".bsl-lint.toml"), "");

        let result = resolve_with(tmp.path(), None, None);
        assert_eq!(result, ConfigSource::Project(tmp.path().join("bsl-lint.toml")));
    }

    #[test]
    fn dotted_name_is_found() {
        let tmp = TempDir::new().expect("tempdir");
        touch(&tmp.path().join(".bsl-lint.toml"), "");

        let result = resolve_with(tmp.path(), None, None);
        assert_eq!(result, ConfigSource::Project(tmp.path().join(".bsl-lint.toml")));
    }

    #[test]
    fn nearest_ancestor_config_is_used() {
        let tmp = TempDir::new().expect("tempdir");
        touch(&tmp.path().join("bsl-lint.toml"), "");
        touch(&tmp.path().join("src/bsl-lint.toml"), "");
        let nested = tmp.path().join("src/CommonModules/Common");
        fs::create_dir_all(&nested).expect("create dirs");

        let result = resolve_with(&nested, None, None);
        assert_eq!(result, ConfigSource::Project(tmp.path().join("src/bsl-lint.toml")));
    }

    #[test]
    fn global_used_only_without_project_config() {
        let project = TempDir::new().expect("tempdir");
        let global = TempDir::new().expect("tempdir");
        touch(&global.path().join("config.toml"), "");

        let result = resolve_with(project.path(), None, Some(global.path()));
        assert_eq!(result, ConfigSource::Global(global.path().join("config.toml")));

        touch(&project.path().join("bsl-lint.toml"), "");
        let result = resolve_with(project.path(), None, Some(global.path()));
        assert!(matches!(result, ConfigSource::Project(_)));
    }

    #[test]
    fn empty_global_dir_means_defaults() {
        let project = TempDir::new().expect("tempdir");
        let global = TempDir::new().expect("tempdir");

        assert_eq!(
            resolve_with(project.path(), None, Some(global.path())),
            ConfigSource::Default
        );
    }

    #[test]
    fn load_parses_file_and_defaults() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("bsl-lint.toml");
        touch(&path, "[analyzer]\nlanguage = \"en\"\n");

        let config = ConfigSource::Project(path).load().expect("load");
        assert_eq!(config.analyzer.language, bsl_lint_core::MessageLanguage::En);

        let defaults = ConfigSource::Default.load().expect("defaults");
        assert!(defaults.rules.is_empty());
    }

    #[test]
    fn load_reports_broken_file() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("bsl-lint.toml");
        touch(&path, "[analyzer\n");

        let err = ConfigSource::Explicit(path).load().unwrap_err();
        assert!(err.to_string().starts_with("Failed to load config"));
    }
}
