//! `deployer completion <SHELL>` -- write a shell completion script to stdout.

use std::io::Write;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::generate;

use crate::cli::{Cli, CompletionArgs};

/// Execute the `deployer completion` command.
pub fn run(args: &CompletionArgs) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    write_completions(args, &mut stdout);
    stdout.flush()?;
    Ok(())
}

fn write_completions(args: &CompletionArgs, out: &mut impl Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, name, out);
}
