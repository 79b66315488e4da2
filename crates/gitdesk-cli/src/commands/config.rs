//! `gitdesk config` command - read or write repository configuration.

use anyhow::{Result, bail};

use super::{ConfigCommand, Globals};
use crate::output;

/// Run the config command.
pub fn run(globals: &Globals, action: ConfigCommand) -> Result<()> {
    let mut facade = globals.open()?;

    match action {
        ConfigCommand::Get { key } => match facade.get_config(&key)? {
            Some(value) => output::essential(&value),
            None => bail!("{key} is not set"),
        },
        ConfigCommand::Set { key, value } => {
            facade.set_config(&key, &value)?;
            output::success(&format!("Set {key} = {value}"));
        }
    }
    Ok(())
}
