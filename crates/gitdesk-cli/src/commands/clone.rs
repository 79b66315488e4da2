//! `gitdesk clone` command - clone a repository.

use std::path::PathBuf;

use anyhow::{Result, bail};

use super::Globals;
use super::utils::run_network;
use crate::output;

/// Run the clone command.
pub fn run(globals: &Globals, url: &str, target: Option<PathBuf>) -> Result<()> {
    let target = match target {
        Some(target) => target,
        None => {
            let Some(name) = directory_name(url) else {
                bail!("Cannot derive a directory name from '{url}'; pass a target");
            };
            globals.repo.join(name)
        }
    };

    let facade = globals.config.facade();
    let label = format!("Cloning {url}...");
    let owned_url = url.to_string();
    let owned_target = target.clone();
    run_network(facade, &label, move |facade, cancel| {
        facade.clone_repository(&owned_url, &owned_target, cancel)
    })?;

    output::success(&format!("Cloned {url} into {}", target.display()));
    Ok(())
}

/// Last path segment of `url` without a `.git` suffix.
fn directory_name(url: &str) -> Option<String> {
    let trimmed = url.trim_end_matches(['/', '\\']);
    let last = trimmed.rsplit(['/', '\\', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    (!name.is_empty()).then(|| name.to_string())
}
