//! Clap CLI definitions for the `deployer` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use deployer_git::ObjectType;

/// deployer -- keep git sources in sync and resolve refs to commits.
#[derive(Parser, Debug)]
#[command(
    name = "deployer",
    about = "Keep git sources in sync and resolve refs to commits",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Configuration file (default: $DEPLOYER_CONFIG, or deployer.yaml in
    /// the current directory or any parent).
    #[arg(long, global = true, env = "DEPLOYER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clone or fetch configured sources and resolve their refs.
    Sync(SyncArgs),

    /// Resolve a ref in a synced source to an object hash.
    RevParse(RevParseArgs),

    /// Show the effective configuration.
    Config,

    /// Generate shell completions.
    Completion(CompletionArgs),

    /// Print the deployer version and the version of the configured git.
    Version,
}

/// Arguments for `deployer sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Sources to sync (default: all configured sources).
    pub names: Vec<String>,
}

/// Arguments for `deployer rev-parse`.
#[derive(Args, Debug)]
pub struct RevParseArgs {
    /// Name of the configured source.
    pub source: String,

    /// Branch, tag, commit or any other revision expression.
    #[arg(value_name = "REF")]
    pub reference: String,

    /// Object type to dereference to: commit, tree, blob or tag.
    #[arg(long = "type", default_value = "commit")]
    pub object_type: ObjectType,
}

/// Arguments for `deployer completion`.
#[derive(Args, Debug)]
pub struct CompletionArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}
