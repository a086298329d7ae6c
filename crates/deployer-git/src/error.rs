//! Repository-level error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::execution::ExecutionFailure;

/// Errors returned by [`Repository`](crate::repository::Repository) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// A ref could not be resolved to an object of the requested type.
    ///
    /// Any failure of the underlying `rev-parse` lands here, including ones
    /// unrelated to the ref itself (missing binary, broken `git_dir`). The
    /// original failure, when there is one, is kept as the source.
    #[error("could not resolve '{reference}' in {}", .git_dir.display())]
    NonexistentHash {
        /// The ref exactly as passed in.
        reference: String,
        /// The git directory it was looked up in.
        git_dir: PathBuf,
        /// The execution failure that caused this error.
        #[source]
        source: Option<ExecutionFailure>,
    },

    /// A git command failed in a way the operation does not interpret.
    #[error(transparent)]
    Execution(#[from] ExecutionFailure),

    /// A working-tree operation was attempted on a bare repository.
    #[error("{} is a bare repository with no working tree", .git_dir.display())]
    NoWorkTree {
        /// The bare repository's git directory.
        git_dir: PathBuf,
    },

    /// Preparing the on-disk location failed.
    #[error("filesystem error: {0}")]
    Io(#[from] io::Error),
}

/// A specialized `Result` type for repository operations.
pub type Result<T> = std::result::Result<T, GitError>;
