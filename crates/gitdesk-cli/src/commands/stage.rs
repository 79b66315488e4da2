//! `gitdesk add` / `gitdesk unstage` commands - manage the index.

use anyhow::Result;

use super::Globals;
use crate::output;

/// Run the add command.
pub fn run_add(globals: &Globals, paths: &[String], all: bool) -> Result<()> {
    let mut facade = globals.open()?;

    if all {
        let staged = facade.stage_all()?;
        if staged.is_empty() {
            output::info("Nothing to stage");
        } else {
            output::success(&format!("Staged {} path(s)", staged.len()));
            for path in &staged {
                output::detail(&format!("    {path}"));
            }
        }
        return Ok(());
    }

    facade.stage(paths)?;
    output::success(&format!("Staged {}", paths.join(", ")));
    Ok(())
}

/// Run the unstage command.
pub fn run_unstage(globals: &Globals, paths: &[String], all: bool) -> Result<()> {
    let mut facade = globals.open()?;

    if all {
        facade.unstage_all()?;
        output::success("Unstaged everything");
    } else {
        facade.unstage(paths)?;
        output::success(&format!("Unstaged {}", paths.join(", ")));
    }
    Ok(())
}
