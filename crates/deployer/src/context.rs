//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds what a command handler needs besides its own
//! arguments: global flags and the location of the configuration file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use deployer_config::{Settings, SourceConfig, SourceLayout, find_config_file, load_settings};
use deployer_git::{Layout, Repository, SystemExecutor};

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Explicit configuration file (`--config` or `DEPLOYER_CONFIG`).
    pub config_path: Option<PathBuf>,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        Self {
            config_path: global.config.clone(),
            json: global.json,
            verbose: global.verbose,
            quiet: global.quiet,
        }
    }

    /// The configuration file to use, auto-discovering if none was given.
    pub fn resolve_config_path(&self) -> Option<PathBuf> {
        if let Some(ref p) = self.config_path {
            return Some(p.clone());
        }
        let cwd = std::env::current_dir().ok()?;
        find_config_file(&cwd)
    }

    /// Load and validate the effective settings.
    pub fn load_settings(&self) -> Result<Settings> {
        let path = self.resolve_config_path();
        match &path {
            Some(p) => tracing::debug!(path = %p.display(), "loading configuration"),
            None => tracing::debug!("no configuration file found, using defaults"),
        }

        load_settings(path.as_deref()).with_context(|| match &path {
            Some(p) => format!("failed to load configuration from {}", p.display()),
            None => "failed to load configuration".to_string(),
        })
    }
}

/// Build the repository handle for a configured source.
pub fn repository(settings: &Settings, source: &SourceConfig) -> Repository {
    Repository::new(
        layout(source.layout),
        source.remote.clone(),
        absolute(&settings.basedir),
        source.dirname(),
        SystemExecutor::with_binary(&settings.git.binary),
    )
}

fn layout(layout: SourceLayout) -> Layout {
    match layout {
        SourceLayout::Bare => Layout::Bare,
        SourceLayout::WorkingCopy => Layout::WorkingCopy,
    }
}

/// Anchor a relative base directory at the current directory so that git
/// never sees a path relative to some other cwd.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn source(layout: SourceLayout) -> SourceConfig {
        SourceConfig {
            name: "app".to_string(),
            remote: "https://example.com/app.git".to_string(),
            reference: "main".to_string(),
            layout,
            dirname: Some("app-dir".to_string()),
        }
    }

    #[test]
    fn repository_from_bare_source() {
        let settings = Settings {
            basedir: PathBuf::from("/srv/deploy"),
            ..Settings::default()
        };
        let repo = repository(&settings, &source(SourceLayout::Bare));
        assert_eq!(repo.layout(), Layout::Bare);
        assert_eq!(repo.remote(), "https://example.com/app.git");
        assert_eq!(repo.git_dir(), Path::new("/srv/deploy/app-dir"));
    }

    #[test]
    fn repository_from_working_copy_source() {
        let settings = Settings {
            basedir: PathBuf::from("/srv/deploy"),
            ..Settings::default()
        };
        let repo = repository(&settings, &source(SourceLayout::WorkingCopy));
        assert_eq!(repo.git_dir(), Path::new("/srv/deploy/app-dir/.git"));
    }

    #[test]
    fn relative_basedir_becomes_absolute() {
        let settings = Settings::default();
        let repo = repository(&settings, &source(SourceLayout::Bare));
        assert!(repo.basedir().is_absolute());
    }

    #[test]
    fn explicit_config_path_wins() {
        let ctx = RuntimeContext {
            config_path: Some(PathBuf::from("/etc/deployer.yaml")),
            json: false,
            verbose: false,
            quiet: false,
        };
        assert_eq!(
            ctx.resolve_config_path(),
            Some(PathBuf::from("/etc/deployer.yaml"))
        );
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("deployer.yaml");
        let ctx = RuntimeContext {
            config_path: Some(missing.clone()),
            json: false,
            verbose: false,
            quiet: false,
        };
        let message = format!("{:#}", ctx.load_settings().unwrap_err());
        assert!(message.contains("config file not found"), "got: {message}");
        assert!(message.contains(&missing.display().to_string()), "got: {message}");
    }
}
