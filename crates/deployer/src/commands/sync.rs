//! `deployer sync` -- clone or fetch sources and resolve their refs.
//!
//! Sources are processed one at a time; two operations never run against
//! the same on-disk repository at once.

use anyhow::{Context, Result, bail};
use deployer_config::{Settings, SourceConfig};
use deployer_git::{Execute, GitError, Layout, Repository};
use serde::Serialize;
use tracing::info;

use crate::cli::SyncArgs;
use crate::context::{RuntimeContext, repository};
use crate::output::{output_json, output_pairs};

/// One synced source, as reported to the user.
#[derive(Debug, Serialize)]
struct Synced {
    name: String,
    #[serde(rename = "ref")]
    reference: String,
    commit: String,
    git_dir: String,
}

/// Execute the `deployer sync` command.
pub fn run(ctx: &RuntimeContext, args: &SyncArgs) -> Result<()> {
    let settings = ctx.load_settings()?;
    let sources = select_sources(&settings, &args.names)?;

    if sources.is_empty() {
        if !ctx.quiet && !ctx.json {
            println!("No sources configured.");
        }
        if ctx.json {
            output_json(&Vec::<Synced>::new());
        }
        return Ok(());
    }

    let mut synced = Vec::with_capacity(sources.len());
    for source in sources {
        let repo = repository(&settings, source);
        let commit = sync_source(&repo, &source.reference)
            .with_context(|| format!("failed to sync source '{}'", source.name))?;
        info!(source = %source.name, %commit, "synced");

        synced.push(Synced {
            name: source.name.clone(),
            reference: source.reference.clone(),
            commit,
            git_dir: repo.git_dir().display().to_string(),
        });
    }

    if ctx.json {
        output_json(&synced);
    } else {
        let pairs: Vec<(String, String)> = synced
            .into_iter()
            .map(|s| (s.name, s.commit))
            .collect();
        output_pairs(&pairs);
    }

    Ok(())
}

/// Pick the sources named on the command line, or all of them.
fn select_sources<'a>(settings: &'a Settings, names: &[String]) -> Result<Vec<&'a SourceConfig>> {
    if names.is_empty() {
        return Ok(settings.sources.iter().collect());
    }

    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        match settings.source(name) {
            Some(source) => selected.push(source),
            None => bail!("unknown source '{}'", name),
        }
    }
    Ok(selected)
}

/// Bring one repository up to date and return the commit `reference` points at.
///
/// Working copies are checked out at that commit.
fn sync_source<E: Execute>(repo: &Repository<E>, reference: &str) -> deployer_git::Result<String> {
    if repo.exists() {
        repo.fetch()?;
    } else {
        repo.clone_remote()?;
    }

    match repo.layout() {
        Layout::Bare => repo.rev_parse(reference),
        Layout::WorkingCopy => {
            let commit = resolve_in_working_copy(repo, reference)?;
            repo.checkout(&commit)?;
            Ok(commit)
        }
    }
}

/// Fetching does not move local branches in a working copy, so a branch
/// name is looked up on `origin` first. Tags and hashes fall through to the
/// plain lookup.
fn resolve_in_working_copy<E: Execute>(
    repo: &Repository<E>,
    reference: &str,
) -> deployer_git::Result<String> {
    match repo.rev_parse(&format!("origin/{reference}")) {
        Err(GitError::NonexistentHash { .. }) => repo.rev_parse(reference),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(names: &[&str]) -> Settings {
        Settings {
            sources: names
                .iter()
                .map(|name| SourceConfig {
                    name: name.to_string(),
                    remote: format!("https://example.com/{name}.git"),
                    reference: "main".to_string(),
                    layout: Default::default(),
                    dirname: None,
                })
                .collect(),
            ..Settings::default()
        }
    }

    #[test]
    fn select_all_sources_by_default() {
        let settings = settings_with(&["a", "b"]);
        let selected = select_sources(&settings, &[]).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn select_named_sources_in_given_order() {
        let settings = settings_with(&["a", "b", "c"]);
        let names = vec!["c".to_string(), "a".to_string()];
        let selected = select_sources(&settings, &names).unwrap();
        let got: Vec<&str> = selected.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(got, vec!["c", "a"]);
    }

    #[test]
    fn select_unknown_source_fails() {
        let settings = settings_with(&["a"]);
        let err = select_sources(&settings, &["zzz".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "unknown source 'zzz'");
    }
}
