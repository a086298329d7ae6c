//! Git process execution.
//!
//! The [`Execute`] trait is the seam between the repository abstraction and
//! the operating system: it takes a built [`GitCommand`], runs it to
//! completion and hands back stdout. [`SystemExecutor`] is the real
//! implementation; tests substitute their own.
//!
//! Execution is synchronous with no timeout. A hung git process blocks the
//! caller.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::debug;

use crate::command::GitCommand;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A git process could not be run to a successful exit.
///
/// This is deliberately generic: a bad ref, a missing binary, a permission
/// problem and a corrupted repository all look the same from the outside.
/// Operations that know what a failure means for them translate it into a
/// [`GitError`](crate::error::GitError) of their own.
#[derive(Debug, Error)]
pub enum ExecutionFailure {
    /// The git binary could not be found or spawned.
    #[error("failed to execute '{command}': {source}")]
    Spawn {
        /// The command that could not be started.
        command: String,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// The git command exited with a non-zero status.
    #[error("'{command}' failed (exit code {code:?}): {stderr}")]
    Exited {
        /// The command that failed.
        command: String,
        /// The exit code, or `None` if the process was killed by a signal.
        code: Option<i32>,
        /// The content of stderr, trimmed.
        stderr: String,
    },
}

impl ExecutionFailure {
    /// The rendered command that failed.
    pub fn command(&self) -> &str {
        match self {
            ExecutionFailure::Spawn { command, .. } | ExecutionFailure::Exited { command, .. } => {
                command
            }
        }
    }

    /// The exit code, if the process ran and exited with one.
    pub fn code(&self) -> Option<i32> {
        match self {
            ExecutionFailure::Spawn { .. } => None,
            ExecutionFailure::Exited { code, .. } => *code,
        }
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// Runs a git command and captures its output.
pub trait Execute {
    /// Run `command` to completion.
    ///
    /// `event` is a short human-readable label for logs. Returns stdout
    /// exactly as produced on success.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutionFailure`] if the process cannot be spawned or
    /// exits with a non-zero status.
    fn execute(&self, command: &GitCommand, event: &str) -> Result<String, ExecutionFailure>;
}

impl<T: Execute + ?Sized> Execute for &T {
    fn execute(&self, command: &GitCommand, event: &str) -> Result<String, ExecutionFailure> {
        (**self).execute(command, event)
    }
}

/// Executes git as a child process of the current process.
#[derive(Debug, Clone)]
pub struct SystemExecutor {
    git_binary: PathBuf,
}

impl SystemExecutor {
    /// Use a specific git binary instead of `git` from `PATH`.
    pub fn with_binary(git_binary: impl Into<PathBuf>) -> Self {
        Self {
            git_binary: git_binary.into(),
        }
    }

    /// The binary that will be spawned.
    pub fn git_binary(&self) -> &Path {
        &self.git_binary
    }
}

impl Default for SystemExecutor {
    fn default() -> Self {
        Self::with_binary(GitCommand::PROGRAM)
    }
}

impl Execute for SystemExecutor {
    fn execute(&self, command: &GitCommand, event: &str) -> Result<String, ExecutionFailure> {
        debug!(event, command = %command, "executing git");

        let output = Command::new(&self.git_binary)
            .args(command.args())
            .output()
            .map_err(|source| ExecutionFailure::Spawn {
                command: command.to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!(event, code = ?output.status.code(), %stderr, "git exited unsuccessfully");
            return Err(ExecutionFailure::Exited {
                command: command.to_string(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
