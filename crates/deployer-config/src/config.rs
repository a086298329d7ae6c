//! Configuration types and loading for the deployer.
//!
//! The main entry point is [`Settings`], loaded with [`load_settings`] from
//! three layers, later ones winning:
//!
//! 1. built-in defaults,
//! 2. the YAML configuration file (usually `deployer.yaml`),
//! 3. `DEPLOYER_*` environment variables, with `__` separating nested keys
//!    (e.g. `DEPLOYER_GIT__BINARY=/usr/local/bin/git`).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of environment variables that override configuration values.
pub const ENV_PREFIX: &str = "DEPLOYER_";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The named configuration file does not exist.
    #[error("config file not found: {}", .path.display())]
    NotFound {
        /// The path that was given.
        path: PathBuf,
    },

    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration layers could not be merged or extracted.
    #[error("failed to load configuration: {0}")]
    Figment(#[from] figment::Error),

    /// The settings could not be rendered as YAML.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The configuration key that had an invalid value.
        key: String,
        /// A description of why the value is invalid.
        reason: String,
    },
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// How a source is kept on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SourceLayout {
    /// A bare mirror (default).
    #[default]
    Bare,
    /// A checked-out working copy.
    WorkingCopy,
}

/// Git-related configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSettings {
    /// The git binary to run. Looked up on `PATH` unless absolute.
    #[serde(default = "default_git_binary")]
    pub binary: PathBuf,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            binary: default_git_binary(),
        }
    }
}

fn default_git_binary() -> PathBuf {
    PathBuf::from("git")
}

/// A repository the deployer keeps in sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique name of the source.
    #[serde(default)]
    pub name: String,

    /// URL to clone from. Passed to git as-is.
    #[serde(default)]
    pub remote: String,

    /// The ref to deploy (branch, tag or commit).
    #[serde(default = "default_ref", rename = "ref")]
    pub reference: String,

    /// On-disk layout.
    #[serde(default)]
    pub layout: SourceLayout,

    /// Directory name under `basedir`. Defaults to the source name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dirname: Option<String>,
}

impl SourceConfig {
    /// The directory name under `basedir` for this source.
    pub fn dirname(&self) -> &str {
        self.dirname.as_deref().unwrap_or(&self.name)
    }
}

fn default_ref() -> String {
    "main".to_string()
}

// ---------------------------------------------------------------------------
// Main settings struct
// ---------------------------------------------------------------------------

/// The full deployer configuration.
///
/// All fields use `serde` defaults so that a partially-specified YAML file
/// is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory under which repositories are kept.
    #[serde(default = "default_basedir")]
    pub basedir: PathBuf,

    /// Git-related configuration.
    #[serde(default)]
    pub git: GitSettings,

    /// Configured sources.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            basedir: default_basedir(),
            git: GitSettings::default(),
            sources: Vec::new(),
        }
    }
}

fn default_basedir() -> PathBuf {
    PathBuf::from(".deployer/cache")
}

impl Settings {
    /// Look up a source by name.
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Check the sources for values that cannot work.
    ///
    /// Remote URLs are only checked for being non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for (i, source) in self.sources.iter().enumerate() {
            if source.name.trim().is_empty() {
                return Err(invalid(format!("sources[{i}].name"), "must not be empty"));
            }
            if source.remote.trim().is_empty() {
                return Err(invalid(format!("sources[{i}].remote"), "must not be empty"));
            }
            if source.reference.trim().is_empty() {
                return Err(invalid(format!("sources[{i}].ref"), "must not be empty"));
            }
            if !is_single_component(source.dirname()) {
                return Err(invalid(
                    format!("sources[{i}].dirname"),
                    "must be a single directory name",
                ));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(invalid(
                    format!("sources[{i}].name"),
                    format!("duplicate source name '{}'", source.name),
                ));
            }
        }

        Ok(())
    }

    /// Render the settings as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn invalid(key: String, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        reason: reason.into(),
    }
}

fn is_single_component(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load settings from defaults, the YAML file at `path`, and the environment.
///
/// With no `path`, the file layer is skipped. An empty file contributes
/// nothing. A relative `basedir` is resolved against the directory
/// containing the file. The result is validated before it is returned.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] if `path` is given but is not a file,
/// [`ConfigError::ReadError`] if it cannot be read,
/// [`ConfigError::Figment`] if it is not valid YAML or has values of the
/// wrong type, and [`ConfigError::InvalidValue`] if validation fails.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()));

    if let Some(path) = path {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        // An empty file is valid and yields default config.
        let content = std::fs::read_to_string(path)?;
        if !content.trim().is_empty() {
            figment = figment.merge(Yaml::file(path));
        }
    }

    let mut settings: Settings = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;

    if settings.basedir.is_relative() {
        if let Some(dir) = path.and_then(Path::parent) {
            settings.basedir = dir.join(&settings.basedir);
        }
    }

    settings.validate()?;
    Ok(settings)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn source(name: &str) -> SourceConfig {
        SourceConfig {
            name: name.to_string(),
            remote: format!("https://example.com/{name}.git"),
            reference: default_ref(),
            layout: SourceLayout::Bare,
            dirname: None,
        }
    }

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployer.yaml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.basedir, PathBuf::from(".deployer/cache"));
        assert_eq!(settings.git.binary, PathBuf::from("git"));
        assert!(settings.sources.is_empty());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let missing = Path::new("/nonexistent/deployer.yaml");
        match load_settings(Some(missing)).unwrap_err() {
            ConfigError::NotFound { path } => assert_eq!(path, missing),
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn test_load_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(Some(dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err:?}");
    }

    #[test]
    fn test_load_empty_file_returns_default() {
        let (_dir, path) = write_config("\n");
        let settings = load_settings(Some(&path)).unwrap();
        assert!(settings.sources.is_empty());
    }

    #[test]
    fn test_load_partial_yaml() {
        let (_dir, path) = write_config(
            "basedir: /srv/deploy\nsources:\n  - name: app\n    remote: https://example.com/app.git\n",
        );
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.basedir, PathBuf::from("/srv/deploy"));
        let app = settings.source("app").unwrap();
        assert_eq!(app.reference, "main");
        assert_eq!(app.layout, SourceLayout::Bare);
        assert_eq!(app.dirname(), "app");
    }

    #[test]
    fn test_relative_basedir_resolves_against_config_dir() {
        let (dir, path) = write_config("basedir: cache\n");
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.basedir, dir.path().join("cache"));
    }

    #[test]
    fn test_source_fields() {
        let yaml = "\
sources:
  - name: modules
    remote: git@example.com:modules.git
    ref: v2.1.0
    layout: working-copy
    dirname: mods
";
        let (_dir, path) = write_config(yaml);
        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(
            settings.sources,
            vec![SourceConfig {
                name: "modules".to_string(),
                remote: "git@example.com:modules.git".to_string(),
                reference: "v2.1.0".to_string(),
                layout: SourceLayout::WorkingCopy,
                dirname: Some("mods".to_string()),
            }]
        );
        assert_eq!(settings.sources[0].dirname(), "mods");
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let (_dir, path) = write_config("sources: [unclosed\n");
        let err = load_settings(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)), "got: {err:?}");
    }

    #[test]
    fn test_unknown_layout_is_error() {
        let (_dir, path) = write_config("sources:\n  - name: a\n    remote: r\n    layout: shallow\n");
        assert!(load_settings(Some(&path)).is_err());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let settings = Settings {
            sources: vec![source("app"), source("app")],
            ..Settings::default()
        };
        match settings.validate().unwrap_err() {
            ConfigError::InvalidValue { key, reason } => {
                assert_eq!(key, "sources[1].name");
                assert!(reason.contains("duplicate"));
            }
            other => panic!("expected InvalidValue, got: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_empty_remote() {
        let mut bad = source("app");
        bad.remote = String::new();
        let settings = Settings {
            sources: vec![bad],
            ..Settings::default()
        };
        let err = settings.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration value for key 'sources[0].remote': must not be empty"
        );
    }

    #[test]
    fn test_validate_rejects_nested_dirname() {
        for dirname in ["../escape", "a/b", ".."] {
            let mut bad = source("app");
            bad.dirname = Some(dirname.to_string());
            let settings = Settings {
                sources: vec![bad],
                ..Settings::default()
            };
            assert!(settings.validate().is_err(), "accepted dirname {dirname}");
        }
    }

    #[test]
    fn test_remote_is_not_otherwise_validated() {
        let mut odd = source("app");
        odd.remote = "not a url at all".to_string();
        let settings = Settings {
            sources: vec![odd],
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_to_yaml_roundtrips_through_loader() {
        let settings = Settings {
            basedir: PathBuf::from("/srv/deploy"),
            sources: vec![source("app")],
            ..Settings::default()
        };
        let (_dir, path) = write_config(&settings.to_yaml().unwrap());
        assert_eq!(load_settings(Some(&path)).unwrap(), settings);
    }
}
