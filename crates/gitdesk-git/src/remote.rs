//! Remote configuration.

use crate::error::{Error, Result};
use crate::facade::Facade;
use crate::types::RemoteRef;

impl Facade {
    /// Configured remotes, sorted by name.
    ///
    /// # Errors
    /// Returns error if unbound or remotes cannot be read.
    pub fn list_remotes(&self) -> Result<Vec<RemoteRef>> {
        let repo = self.repo()?;
        let mut remotes = Vec::new();
        for name in repo.remotes()?.iter().flatten() {
            let remote = repo.find_remote(name)?;
            remotes.push(RemoteRef {
                name: name.to_string(),
                url: remote.url().unwrap_or_default().to_string(),
            });
        }
        remotes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(remotes)
    }

    /// Add a remote. Any non-blank URL is accepted, local paths included.
    ///
    /// # Errors
    /// - [`Error::InvalidRemoteName`] if `name` is not a valid remote name
    /// - [`Error::InvalidUrl`] if `url` is blank
    /// - [`Error::RemoteExists`] if the name is taken
    pub fn add_remote(&mut self, name: &str, url: &str) -> Result<()> {
        let repo = self.repo()?;
        if !git2::Remote::is_valid_name(name) {
            return Err(Error::InvalidRemoteName(name.to_string()));
        }
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::InvalidUrl(url.to_string()));
        }
        if repo.find_remote(name).is_ok() {
            return Err(Error::RemoteExists(name.to_string()));
        }

        repo.remote(name, url)?;
        tracing::info!(remote = name, url, "added remote");
        self.notify();
        Ok(())
    }

    /// Remove a remote and its remote-tracking branches.
    ///
    /// # Errors
    /// Returns [`Error::RemoteNotFound`] if no such remote exists.
    pub fn remove_remote(&mut self, name: &str) -> Result<()> {
        let repo = self.repo()?;
        if repo.find_remote(name).is_err() {
            return Err(Error::RemoteNotFound(name.to_string()));
        }

        repo.remote_delete(name)?;
        tracing::info!(remote = name, "removed remote");
        self.notify();
        Ok(())
    }
}

/// Fail with [`Error::RemoteNotFound`] unless `name` is configured.
pub(crate) fn require_remote(repo: &git2::Repository, name: &str) -> Result<()> {
    repo.find_remote(name)
        .map(drop)
        .map_err(|_| Error::RemoteNotFound(name.to_string()))
}
