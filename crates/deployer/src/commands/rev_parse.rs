//! `deployer rev-parse` -- resolve a ref in a synced source.

use anyhow::{Result, anyhow, bail};
use deployer_git::GitError;

use crate::cli::RevParseArgs;
use crate::context::{RuntimeContext, repository};
use crate::output::output_json;

/// Execute the `deployer rev-parse` command.
pub fn run(ctx: &RuntimeContext, args: &RevParseArgs) -> Result<()> {
    let settings = ctx.load_settings()?;
    let Some(source) = settings.source(&args.source) else {
        bail!("unknown source '{}'", args.source);
    };

    let repo = repository(&settings, source);
    if !repo.exists() {
        bail!(
            "source '{}' has not been synced yet (run 'deployer sync {}')",
            source.name,
            source.name
        );
    }

    let hash = repo
        .rev_parse_object(&args.reference, args.object_type)
        .map_err(|e| match e {
            GitError::NonexistentHash {
                reference, git_dir, ..
            } => anyhow!(
                "source '{}' ref '{}' does not exist in {}",
                source.name,
                reference,
                git_dir.display()
            ),
            other => other.into(),
        })?;

    if ctx.json {
        output_json(&serde_json::json!({
            "source": source.name,
            "ref": args.reference,
            "type": args.object_type.as_str(),
            "hash": hash,
        }));
    } else {
        println!("{hash}");
    }

    Ok(())
}
