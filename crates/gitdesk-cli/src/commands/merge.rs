//! `gitdesk merge` command - merge a branch into the current one.

use anyhow::{Result, bail};
use gitdesk_git::Error;

use super::Globals;
use crate::output;

/// Run the merge command.
pub fn run(globals: &Globals, branch: &str) -> Result<()> {
    let mut facade = globals.open()?;

    match facade.merge_branch(branch) {
        Ok(record) => {
            output::success(&format!("Merged {branch}: {}", output::commit_line(&record)));
            Ok(())
        }
        Err(Error::MergeConflict { paths }) => {
            report_conflicts(&paths);
            bail!("Merge of {branch} stopped on conflicts");
        }
        Err(e) => Err(e.into()),
    }
}

/// Print conflicted paths and how to finish.
pub fn report_conflicts(paths: &[String]) {
    output::warn(&format!("{} conflicted path(s):", paths.len()));
    for path in paths {
        eprintln!("    {path}");
    }
    eprintln!();
    eprintln!("Resolve the conflicts, then run:");
    eprintln!("  gitdesk add <paths>");
    eprintln!("  gitdesk commit -m <message>");
}
