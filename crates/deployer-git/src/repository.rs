//! On-disk git repositories managed by the deployer.
//!
//! A [`Repository`] is identified by its remote URL and its location
//! (`basedir/dirname`). Its [`Layout`] decides where the git metadata lives
//! and whether there is a working tree. The layout is fixed at construction,
//! so `git_dir` is always known before any command runs.
//!
//! Each operation spawns exactly one git process per underlying command,
//! waits for it, and returns. Nothing is cached; resolving the same ref twice
//! asks git twice. Concurrent operations against the same on-disk
//! repository are not coordinated here and must be serialized by the caller.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info};

use crate::command::{DOT_GIT, GitCommand, GitOptions};
use crate::error::{GitError, Result};
use crate::execution::{Execute, ExecutionFailure, SystemExecutor};

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// How a repository is laid out under `basedir/dirname`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// A bare mirror: `basedir/dirname` is the git directory itself.
    Bare,
    /// A checkout: `basedir/dirname` is the working tree and the git
    /// directory is `basedir/dirname/.git`.
    WorkingCopy,
}

impl Layout {
    fn git_dir_for(self, path: &Path) -> PathBuf {
        match self {
            Layout::Bare => path.to_path_buf(),
            Layout::WorkingCopy => path.join(DOT_GIT),
        }
    }
}

// ---------------------------------------------------------------------------
// Object types
// ---------------------------------------------------------------------------

/// The git object type a ref is dereferenced to with `<ref>^{<type>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectType {
    /// A commit (default).
    #[default]
    Commit,
    /// The tree a commit or tag points at.
    Tree,
    /// A file's contents.
    Blob,
    /// An annotated tag object.
    Tag,
}

impl ObjectType {
    /// The name git uses for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Commit => "commit",
            ObjectType::Tree => "tree",
            ObjectType::Blob => "blob",
            ObjectType::Tag => "tag",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown object type name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown git object type '{0}'")]
pub struct ParseObjectTypeError(String);

impl FromStr for ObjectType {
    type Err = ParseObjectTypeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "commit" => Ok(ObjectType::Commit),
            "tree" => Ok(ObjectType::Tree),
            "blob" => Ok(ObjectType::Blob),
            "tag" => Ok(ObjectType::Tag),
            other => Err(ParseObjectTypeError(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// A git repository at `basedir/dirname`, cloned from `remote`.
#[derive(Debug, Clone)]
pub struct Repository<E = SystemExecutor> {
    remote: String,
    basedir: PathBuf,
    dirname: String,
    git_dir: PathBuf,
    layout: Layout,
    executor: E,
}

impl<E> Repository<E> {
    /// Create a repository handle. Nothing is touched on disk.
    ///
    /// # Panics
    ///
    /// Panics if `dirname` is empty. Without it the git directory would be
    /// `basedir` itself or empty, and commands would fall back to whatever
    /// repository the current directory belongs to.
    pub fn new(
        layout: Layout,
        remote: impl Into<String>,
        basedir: impl Into<PathBuf>,
        dirname: impl Into<String>,
        executor: E,
    ) -> Self {
        let basedir = basedir.into();
        let dirname = dirname.into();
        assert!(!dirname.is_empty(), "repository dirname must not be empty");
        let git_dir = layout.git_dir_for(&basedir.join(&dirname));
        assert!(
            !git_dir.as_os_str().is_empty(),
            "repository git_dir must not be empty"
        );

        Self {
            remote: remote.into(),
            basedir,
            dirname,
            git_dir,
            layout,
            executor,
        }
    }

    /// A bare mirror at `basedir/dirname`.
    pub fn bare(
        remote: impl Into<String>,
        basedir: impl Into<PathBuf>,
        dirname: impl Into<String>,
        executor: E,
    ) -> Self {
        Self::new(Layout::Bare, remote, basedir, dirname, executor)
    }

    /// A working copy checked out at `basedir/dirname`.
    pub fn working_copy(
        remote: impl Into<String>,
        basedir: impl Into<PathBuf>,
        dirname: impl Into<String>,
        executor: E,
    ) -> Self {
        Self::new(Layout::WorkingCopy, remote, basedir, dirname, executor)
    }

    /// The URL the repository is cloned from.
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// The directory containing the repository.
    pub fn basedir(&self) -> &Path {
        &self.basedir
    }

    /// The name of the repository's directory within [`basedir`](Self::basedir).
    pub fn dirname(&self) -> &str {
        &self.dirname
    }

    /// The git metadata directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Whether this is a bare mirror or a working copy.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// `basedir/dirname`: the bare repository, or the working tree.
    pub fn path(&self) -> PathBuf {
        self.basedir.join(&self.dirname)
    }

    /// Whether the git directory exists on disk.
    pub fn exists(&self) -> bool {
        self.git_dir.is_dir()
    }
}

impl<E: Execute> Repository<E> {
    /// Resolve `reference` to a commit hash.
    ///
    /// Equivalent to [`rev_parse_object`](Self::rev_parse_object) with
    /// [`ObjectType::Commit`].
    pub fn rev_parse(&self, reference: &str) -> Result<String> {
        self.rev_parse_object(reference, ObjectType::default())
    }

    /// Resolve `reference` to the hash of an object of `object_type`.
    ///
    /// Runs `rev-parse <reference>^{<object_type>}` against the git directory
    /// only and returns the hash without surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Every failure is reported as [`GitError::NonexistentHash`] carrying
    /// `reference` and the git directory, whatever made git fail. Refs that
    /// start with `-` are rejected without running git, since rev-parse would
    /// take them as options and echo them back. Output that is not a single
    /// hex object id (ranges, for one, print several lines) is rejected too.
    pub fn rev_parse_object(&self, reference: &str, object_type: ObjectType) -> Result<String> {
        let nonexistent = |source| GitError::NonexistentHash {
            reference: reference.to_string(),
            git_dir: self.git_dir.clone(),
            source,
        };

        if reference.starts_with('-') {
            return Err(nonexistent(None));
        }

        let revision = format!("{reference}^{{{object_type}}}");

        let output = self
            .git(
                ["rev-parse", revision.as_str()],
                &GitOptions::for_git_dir(&self.git_dir),
            )
            .map_err(|failure| nonexistent(Some(failure)))?;

        let hash = output.trim();
        if !is_object_id(hash) {
            return Err(nonexistent(None));
        }

        debug!(reference, %object_type, hash, "resolved ref");
        Ok(hash.to_string())
    }

    /// Resolve `HEAD` to a commit hash.
    pub fn head(&self) -> Result<String> {
        self.rev_parse("HEAD")
    }

    /// Clone [`remote`](Self::remote) into this repository's location.
    ///
    /// Bare repositories are created with `clone --mirror`. `basedir` is
    /// created first if it does not exist.
    pub fn clone_remote(&self) -> Result<()> {
        std::fs::create_dir_all(&self.basedir)?;

        let path = self.path();
        info!(remote = %self.remote, path = %path.display(), "cloning");
        let remote = OsStr::new(&self.remote);
        match self.layout {
            Layout::Bare => self.git(
                [OsStr::new("clone"), OsStr::new("--mirror"), remote, self.git_dir.as_os_str()],
                &GitOptions::new(),
            )?,
            Layout::WorkingCopy => self.git(
                [OsStr::new("clone"), remote, path.as_os_str()],
                &GitOptions::new(),
            )?,
        };
        Ok(())
    }

    /// Fetch from the remote, pruning refs that no longer exist there.
    pub fn fetch(&self) -> Result<()> {
        info!(git_dir = %self.git_dir.display(), "fetching");
        let opts = match self.layout {
            Layout::Bare => GitOptions::for_git_dir(&self.git_dir),
            Layout::WorkingCopy => GitOptions::for_path(self.path()),
        };
        self.git(["fetch", "--prune"], &opts)?;
        Ok(())
    }

    /// Force the working tree to `reference`, discarding local changes.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::NoWorkTree`] for bare repositories.
    pub fn checkout(&self, reference: &str) -> Result<()> {
        if self.layout == Layout::Bare {
            return Err(GitError::NoWorkTree {
                git_dir: self.git_dir.clone(),
            });
        }

        info!(path = %self.path().display(), reference, "checking out");
        self.git(
            ["checkout", "--force", reference],
            &GitOptions::for_path(self.path()),
        )?;
        Ok(())
    }

    /// Run a raw git command against this repository's executor.
    ///
    /// Output is returned untouched and failures are passed through as-is;
    /// interpreting them is up to the calling operation.
    pub(crate) fn git<I, S>(
        &self,
        command_line_args: I,
        opts: &GitOptions,
    ) -> std::result::Result<String, ExecutionFailure>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = command_line_args
            .into_iter()
            .map(|a| a.as_ref().to_os_string())
            .collect();

        let mut event = GitCommand::build(&args, &GitOptions::new()).to_string();
        if *opts != GitOptions::new() {
            event.push_str(&format!(", args: {opts}"));
        }

        let command = GitCommand::build(&args, opts);
        self.executor.execute(&command, &event)
    }
}

/// A full or abbreviated object id: non-empty and hex only.
fn is_object_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
