//! `gitdesk init` command - create a new repository.

use std::path::PathBuf;

use anyhow::Result;

use super::Globals;
use crate::output;

/// Run the init command.
pub fn run(globals: &Globals, path: Option<PathBuf>, bare: bool) -> Result<()> {
    let path = path.unwrap_or_else(|| globals.repo.clone());
    let mut facade = globals.config.facade();
    facade.init(&path, bare)?;

    let location = facade.path().unwrap_or(&path);
    let kind = if bare { "bare repository" } else { "repository" };
    output::success(&format!("Initialized empty {kind} in {}", location.display()));
    Ok(())
}
