//! Git command line construction.
//!
//! Every git invocation made by the deployer is addressed explicitly with
//! `--git-dir` and/or `--work-tree`, so its behavior never depends on the
//! current working directory of the calling process. [`GitCommand::build`]
//! is the only place those flags are assembled.
//!
//! Commands are kept as argument vectors and handed to the process without a
//! shell, so paths and refs are never re-interpreted by shell quoting rules.
//! The [`Display`](fmt::Display) form joins the arguments with single spaces
//! for logs and error messages; it is not meant to be fed back to a shell.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the git metadata directory inside a working copy.
pub const DOT_GIT: &str = ".git";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Addressing options for a single git invocation.
///
/// Either the combined `path` form (implying `<path>/.git` and `<path>`) or
/// an independent `git_dir` and/or `work_tree`. When both forms are set, the
/// combined form wins and the independent values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOptions {
    path: Option<PathBuf>,
    git_dir: Option<PathBuf>,
    work_tree: Option<PathBuf>,
}

impl GitOptions {
    /// Options that add no addressing flags at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Combined form: `--git-dir <path>/.git --work-tree <path>`.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self::new().with_path(path)
    }

    /// Only `--git-dir`, as used for bare repositories.
    pub fn for_git_dir(git_dir: impl Into<PathBuf>) -> Self {
        Self::new().with_git_dir(git_dir)
    }

    /// Set the combined path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the git metadata directory.
    pub fn with_git_dir(mut self, git_dir: impl Into<PathBuf>) -> Self {
        self.git_dir = Some(git_dir.into());
        self
    }

    /// Set the working tree.
    pub fn with_work_tree(mut self, work_tree: impl Into<PathBuf>) -> Self {
        self.work_tree = Some(work_tree.into());
        self
    }

    /// Resolve to the effective `(git_dir, work_tree)` pair.
    ///
    /// Empty paths count as absent so that no flag is ever emitted with an
    /// empty value.
    fn resolve(&self) -> (Option<PathBuf>, Option<PathBuf>) {
        if let Some(path) = non_empty(self.path.as_deref()) {
            return (Some(path.join(DOT_GIT)), Some(path.to_path_buf()));
        }

        (
            non_empty(self.git_dir.as_deref()).map(Path::to_path_buf),
            non_empty(self.work_tree.as_deref()).map(Path::to_path_buf),
        )
    }
}

impl fmt::Display for GitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(path) = &self.path {
            parts.push(format!("path: {}", path.display()));
        }
        if let Some(git_dir) = &self.git_dir {
            parts.push(format!("git_dir: {}", git_dir.display()));
        }
        if let Some(work_tree) = &self.work_tree {
            parts.push(format!("work_tree: {}", work_tree.display()));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

fn non_empty(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A fully addressed git invocation.
///
/// The program name is always [`GitCommand::PROGRAM`]; [`GitCommand::args`]
/// holds everything after it, in order:
/// `[--git-dir <dir>] [--work-tree <tree>] <subcommand args...>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommand {
    args: Vec<OsString>,
}

impl GitCommand {
    /// The program every command runs.
    pub const PROGRAM: &'static str = "git";

    /// Build a command from subcommand tokens and addressing options.
    ///
    /// `--git-dir` always precedes `--work-tree`, and both precede the
    /// subcommand; git rejects global flags placed after the subcommand.
    ///
    /// # Examples
    ///
    /// ```
    /// use deployer_git::command::{GitCommand, GitOptions};
    ///
    /// let cmd = GitCommand::build(["status"], &GitOptions::for_path("/srv/app"));
    /// assert_eq!(
    ///     cmd.to_string(),
    ///     "git --git-dir /srv/app/.git --work-tree /srv/app status"
    /// );
    /// ```
    pub fn build<I, S>(subcommand_args: I, options: &GitOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (git_dir, work_tree) = options.resolve();

        let mut args: Vec<OsString> = Vec::new();
        if let Some(git_dir) = git_dir {
            args.push("--git-dir".into());
            args.push(git_dir.into_os_string());
        }
        if let Some(work_tree) = work_tree {
            args.push("--work-tree".into());
            args.push(work_tree.into_os_string());
        }
        args.extend(
            subcommand_args
                .into_iter()
                .map(|arg| arg.as_ref().to_os_string()),
        );

        Self { args }
    }

    /// The arguments passed to [`GitCommand::PROGRAM`].
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for GitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::PROGRAM)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
