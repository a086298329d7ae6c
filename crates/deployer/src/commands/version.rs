//! `deployer version` -- print the deployer version and the git it drives.
//!
//! The git binary comes from the configuration when one loads, so this shows
//! exactly which git `sync` and `rev-parse` would run. A broken or missing
//! configuration falls back to `git` on `PATH` instead of failing.

use std::path::PathBuf;

use anyhow::Result;
use deployer_git::{Execute, GitCommand, GitOptions, SystemExecutor};
use serde::Serialize;

use crate::context::RuntimeContext;
use crate::output::output_json;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
struct VersionInfo {
    version: &'static str,
    git_binary: PathBuf,
    /// `None` when the binary could not be run.
    git: Option<String>,
}

/// Execute the `deployer version` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let git_binary = match ctx.load_settings() {
        Ok(settings) => settings.git.binary,
        Err(e) => {
            tracing::debug!(error = %format!("{e:#}"), "using default git binary");
            PathBuf::from("git")
        }
    };
    let git = git_version(&SystemExecutor::with_binary(&git_binary));

    let info = VersionInfo {
        version: VERSION,
        git_binary,
        git,
    };

    if ctx.json {
        output_json(&info);
    } else {
        match &info.git {
            Some(git) => println!("deployer version {} (git {})", info.version, git),
            None => println!(
                "deployer version {} (git unavailable: {})",
                info.version,
                info.git_binary.display()
            ),
        }
    }

    Ok(())
}

/// Ask `executor`'s git for its version, without the `git version ` prefix.
fn git_version(executor: &impl Execute) -> Option<String> {
    let command = GitCommand::build(["--version"], &GitOptions::new());
    match executor.execute(&command, "git --version") {
        Ok(output) => {
            let output = output.trim();
            let version = output.strip_prefix("git version ").unwrap_or(output);
            (!version.is_empty()).then(|| version.to_string())
        }
        Err(failure) => {
            tracing::debug!(%failure, "git --version failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deployer_git::ExecutionFailure;
    use pretty_assertions::assert_eq;

    struct Reply(Option<&'static str>);

    impl Execute for Reply {
        fn execute(&self, command: &GitCommand, _event: &str) -> Result<String, ExecutionFailure> {
            assert_eq!(command.to_string(), "git --version");
            match self.0 {
                Some(out) => Ok(out.to_string()),
                None => Err(ExecutionFailure::Exited {
                    command: command.to_string(),
                    code: Some(1),
                    stderr: String::new(),
                }),
            }
        }
    }

    #[test]
    fn git_version_strips_prefix() {
        assert_eq!(
            git_version(&Reply(Some("git version 2.43.0\n"))).as_deref(),
            Some("2.43.0")
        );
    }

    #[test]
    fn git_version_keeps_unexpected_format() {
        assert_eq!(git_version(&Reply(Some("2.43.0"))).as_deref(), Some("2.43.0"));
    }

    #[test]
    fn git_version_failure_is_none() {
        assert_eq!(git_version(&Reply(None)), None);
        assert_eq!(git_version(&Reply(Some("  \n"))), None);
    }

    #[test]
    fn missing_binary_is_none() {
        let exec = SystemExecutor::with_binary("/nonexistent/git-binary");
        assert_eq!(git_version(&exec), None);
    }
}
