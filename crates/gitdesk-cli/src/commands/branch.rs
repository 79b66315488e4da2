//! `gitdesk branch` command - list, create, switch, delete and rename branches.

use anyhow::Result;
use colored::Colorize;
use gitdesk_git::{BranchRef, CheckoutMode};

use super::{BranchCommand, Globals};
use crate::output;

/// Run the branch command.
pub fn run(globals: &Globals, action: BranchCommand) -> Result<()> {
    let mut facade = globals.open()?;

    match action {
        BranchCommand::List => print_branches(&facade.list_branches()?),
        BranchCommand::Create { name, checkout } => {
            facade.create_branch(&name, checkout)?;
            if checkout {
                output::success(&format!("Created and switched to {name}"));
            } else {
                output::success(&format!("Created {name}"));
            }
        }
        BranchCommand::Checkout { name, keep, force } => {
            let mode = if force {
                globals.confirm(&format!("Discard local changes and check out {name}?"))?;
                CheckoutMode::Force
            } else if keep {
                CheckoutMode::KeepChanges
            } else {
                CheckoutMode::Safe
            };
            facade.checkout_branch(&name, mode)?;
            output::success(&format!("Switched to {name}"));
        }
        BranchCommand::Delete { name } => {
            globals.confirm(&format!("Delete branch {name}? Unmerged commits will be lost."))?;
            facade.delete_branch(&name)?;
            output::success(&format!("Deleted {name}"));
        }
        BranchCommand::Rename { old, new } => {
            facade.rename_branch(&old, &new)?;
            output::success(&format!("Renamed {old} to {new}"));
        }
    }
    Ok(())
}

fn print_branches(branches: &[BranchRef]) {
    if branches.is_empty() {
        output::info("No branches yet. Commit something first.");
        return;
    }

    for branch in branches {
        let name = if branch.is_remote {
            format!("  {}", branch.name.red())
        } else {
            output::branch_name(&branch.name, branch.is_current)
        };
        let target = branch.target.as_deref().unwrap_or_default().yellow();
        let upstream = branch
            .upstream
            .as_ref()
            .map(|u| format!(" [{}]", output::upstream(u)))
            .unwrap_or_default();
        output::essential(&format!("{name} {target}{upstream}"));
    }
}
