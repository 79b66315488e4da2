//! `gitdesk tag` command - list, create, delete and push tags.

use anyhow::Result;
use colored::Colorize;

use super::utils::run_network;
use super::{Globals, TagCommand};
use crate::output;

/// Run the tag command.
pub fn run(globals: &Globals, action: TagCommand) -> Result<()> {
    let mut facade = globals.open()?;

    match action {
        TagCommand::List => {
            let tags = facade.list_tags()?;
            if tags.is_empty() {
                output::info("No tags");
            }
            for tag in tags {
                let short = tag.target.get(..8).unwrap_or(&tag.target);
                let message = tag
                    .message
                    .as_deref()
                    .and_then(|m| m.lines().next())
                    .map(|m| format!(" {}", m.dimmed()))
                    .unwrap_or_default();
                output::essential(&format!("{} {}{message}", tag.name.bold(), short.yellow()));
            }
        }
        TagCommand::Create {
            name,
            message,
            target,
        } => {
            let tag = facade.create_tag(&name, message.as_deref(), target.as_deref())?;
            let short = tag.target.get(..8).unwrap_or(&tag.target);
            output::success(&format!("Tagged {short} as {name}"));
        }
        TagCommand::Delete { name } => {
            facade.delete_tag(&name)?;
            output::success(&format!("Deleted tag {name}"));
        }
        TagCommand::Push { name, remote, .. } => {
            let remote = globals.remote(remote);
            match name {
                Some(name) => {
                    let label = format!("Pushing tag {name} to {remote}...");
                    let (tag, to) = (name.clone(), remote.clone());
                    run_network(facade, &label, move |facade, cancel| {
                        facade.push_tag(&tag, &to, cancel)
                    })?;
                    output::success(&format!("Pushed tag {name} to {remote}"));
                }
                None => {
                    let label = format!("Pushing tags to {remote}...");
                    let to = remote.clone();
                    run_network(facade, &label, move |facade, cancel| {
                        facade.push_all_tags(&to, cancel)
                    })?;
                    output::success(&format!("Pushed all tags to {remote}"));
                }
            }
        }
    }
    Ok(())
}
