//! Git repository handling for the deployer.
//!
//! This crate models on-disk git repositories as units the deployer can
//! manage: it resolves refs to commit hashes and runs git subcommands
//! against an explicit repository location, never the caller's working
//! directory.

pub mod command;
pub mod error;
pub mod execution;
pub mod repository;

pub use command::{GitCommand, GitOptions};
pub use error::{GitError, Result};
pub use execution::{Execute, ExecutionFailure, SystemExecutor};
pub use repository::{Layout, ObjectType, ParseObjectTypeError, Repository};
