//! `gitdesk remote` command - manage remotes.

use anyhow::Result;
use colored::Colorize;

use super::{Globals, RemoteCommand};
use crate::output;

/// Run the remote command.
pub fn run(globals: &Globals, action: RemoteCommand) -> Result<()> {
    let mut facade = globals.open()?;

    match action {
        RemoteCommand::List => {
            let remotes = facade.list_remotes()?;
            if remotes.is_empty() {
                output::info("No remotes configured");
            }
            for remote in remotes {
                output::essential(&format!("{}\t{}", remote.name.bold(), remote.url));
            }
        }
        RemoteCommand::Add { name, url } => {
            facade.add_remote(&name, &url)?;
            output::success(&format!("Added remote {name} ({url})"));
        }
        RemoteCommand::Remove { name } => {
            facade.remove_remote(&name)?;
            output::success(&format!("Removed remote {name}"));
        }
    }
    Ok(())
}
