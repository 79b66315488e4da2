//! `gitdesk status` command - display the working tree status.

use anyhow::Result;
use colored::Colorize;
use gitdesk_git::StatusSnapshot;

use super::Globals;
use crate::output::{self, Change};

/// Run the status command.
pub fn run(globals: &Globals, json: bool) -> Result<()> {
    let facade = globals.open()?;
    let snapshot = facade.status()?;

    if json {
        output::essential(&serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_status(&snapshot);
    }
    Ok(())
}

fn print_status(snapshot: &StatusSnapshot) {
    let branch = snapshot.current_branch.as_deref().map_or_else(
        || {
            if snapshot.head.is_some() {
                "(detached HEAD)".dimmed().to_string()
            } else {
                "(no commits yet)".dimmed().to_string()
            }
        },
        |name| name.cyan().bold().to_string(),
    );

    output::detail("");
    output::detail(&format!("  On {branch}"));
    if let Some(upstream) = &snapshot.upstream {
        output::detail(&format!("  Tracking {}", output::upstream(upstream)));
    }
    if let Some(head) = &snapshot.head {
        output::detail(&format!("  Last commit {}", output::commit_line(head)));
    }
    output::hr();

    if !snapshot.has_changes() {
        output::success("Working tree clean");
        return;
    }

    output::change_list(Change::Conflicted, &snapshot.conflicted);
    output::change_list(Change::Staged, &snapshot.staged);
    output::change_list(Change::Modified, &snapshot.modified);
    output::change_list(Change::Untracked, &snapshot.untracked);
}
