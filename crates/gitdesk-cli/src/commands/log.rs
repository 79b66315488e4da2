//! `gitdesk log` command - show recent commits on HEAD.

use anyhow::Result;

use super::Globals;
use crate::output;

/// Run the log command.
pub fn run(globals: &Globals, max_count: Option<usize>, json: bool) -> Result<()> {
    let facade = globals.open()?;
    let limit = max_count.unwrap_or(globals.config.general.history_limit);
    let commits = facade.recent_commits(limit)?;

    if json {
        output::essential(&serde_json::to_string_pretty(&commits)?);
        return Ok(());
    }

    if commits.is_empty() {
        output::warn("No commits yet");
        return Ok(());
    }
    for commit in &commits {
        output::essential(&output::commit_line(commit));
    }
    Ok(())
}
