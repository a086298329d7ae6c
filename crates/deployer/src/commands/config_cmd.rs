//! `deployer config` -- show the effective configuration.

use anyhow::Result;

use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `deployer config` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let settings = ctx.load_settings()?;

    if ctx.json {
        output_json(&settings);
    } else {
        print!("{}", settings.to_yaml()?);
    }

    Ok(())
}
