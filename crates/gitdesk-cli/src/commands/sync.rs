//! `gitdesk push`, `pull` and `fetch` commands - talk to remotes.

use anyhow::{Result, bail};
use gitdesk_git::Error;

use super::utils::run_network;
use super::{Globals, NetworkArgs};
use crate::output;

/// Run the push command.
pub fn run_push(globals: &Globals, args: NetworkArgs) -> Result<()> {
    let facade = globals.open()?;
    let remote = globals.remote(args.remote);
    let branch = args.branch;

    let to = remote.clone();
    let label = format!("Pushing to {remote}...");
    run_network(facade, &label, move |facade, cancel| {
        facade.push(&to, branch.as_deref(), cancel)
    })?;

    output::success(&format!("Pushed to {remote}"));
    Ok(())
}

/// Run the pull command.
pub fn run_pull(globals: &Globals, args: NetworkArgs) -> Result<()> {
    let facade = globals.open()?;
    let remote = globals.remote(args.remote);
    let branch = args.branch;

    let from = remote.clone();
    let label = format!("Pulling from {remote}...");
    let result = run_network(facade, &label, move |facade, cancel| {
        facade.pull(&from, branch.as_deref(), cancel)
    });

    if let Err(e) = result {
        if let Some(Error::MergeConflict { paths }) = git_error(&e) {
            super::merge::report_conflicts(paths);
            bail!("Pull from {remote} stopped on conflicts");
        }
        return Err(e);
    }

    output::success(&format!("Pulled from {remote}"));
    Ok(())
}

/// Run the fetch command.
pub fn run_fetch(globals: &Globals, args: NetworkArgs) -> Result<()> {
    let facade = globals.open()?;
    let remote = globals.remote(args.remote);
    let branch = args.branch;

    let from = remote.clone();
    let label = format!("Fetching {remote}...");
    run_network(facade, &label, move |facade, cancel| {
        facade.fetch(&from, branch.as_deref(), cancel)
    })?;

    output::success(&format!("Fetched {remote}"));
    Ok(())
}

fn git_error(error: &anyhow::Error) -> Option<&Error> {
    match error.downcast_ref::<gitdesk_core::Error>() {
        Some(gitdesk_core::Error::Git(e)) => Some(e),
        _ => error.downcast_ref::<Error>(),
    }
}
