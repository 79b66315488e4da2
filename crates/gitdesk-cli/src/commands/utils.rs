use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use gitdesk_core::{Config, Session};
use gitdesk_git::{CancelToken, Facade};
use inquire::Confirm;

use crate::output;

/// Settings shared by every command.
#[derive(Debug)]
pub struct Globals {
    pub repo: PathBuf,
    pub config: Config,
    pub yes: bool,
}

impl Globals {
    /// Facade bound to `--repo`.
    pub fn open(&self) -> Result<Facade> {
        let mut facade = self.config.facade();
        facade
            .open(&self.repo)
            .with_context(|| format!("Cannot open {}", self.repo.display()))?;
        Ok(facade)
    }

    /// Remote named on the command line, or the configured default.
    pub fn remote(&self, remote: Option<String>) -> String {
        remote.unwrap_or_else(|| self.config.general.default_remote.clone())
    }

    /// Ask before a destructive step. `--yes` skips the prompt; without a
    /// terminal the step is refused.
    pub fn confirm(&self, prompt: &str) -> Result<()> {
        if self.yes {
            return Ok(());
        }
        if !console::user_attended() {
            bail!("{prompt} Refusing without --yes in a non-interactive session");
        }
        let confirmed = Confirm::new(prompt)
            .with_default(false)
            .prompt()
            .context("Confirmation cancelled")?;
        if !confirmed {
            bail!("Aborted");
        }
        Ok(())
    }
}

/// Run a network operation in the background with a spinner.
///
/// Ctrl-C cancels the operation; the returned error then reports whether the
/// repository was verified unchanged.
pub fn run_network<T, F>(facade: Facade, label: &str, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Facade, &CancelToken) -> gitdesk_git::Result<T> + Send + 'static,
{
    let rt = tokio::runtime::Runtime::new()?;
    let session = Session::new(facade);
    let spinner = output::spinner(label);

    let result = rt.block_on(async {
        let operation = session.spawn(op);
        let cancel = operation.cancel_token();
        let wait = operation.wait();
        tokio::pin!(wait);

        tokio::select! {
            result = &mut wait => result,
            Ok(()) = tokio::signal::ctrl_c() => {
                spinner.set_message("Cancelling...");
                cancel.cancel();
                wait.await
            }
        }
    });

    spinner.finish_and_clear();
    Ok(result?)
}
