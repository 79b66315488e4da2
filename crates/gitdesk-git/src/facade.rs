//! The operation surface used by the presentation layer.
//!
//! [`Facade`] owns a [`RepositoryHandle`] and the external tool locator.
//! Operations are grouped by concern in sibling modules (`status`, `index`,
//! `commit`, `branch`, `merge`, `remote`, `tag`, `history`, `network`), each
//! adding an `impl Facade` block.

use std::path::Path;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::handle::RepositoryHandle;
use crate::tool::GitTool;
use crate::types::Identity;

type Listener = Box<dyn Fn() + Send + Sync>;

/// Typed entry point for every repository query and mutation.
///
/// Not internally synchronized: callers serialize mutating calls, e.g. by
/// keeping the facade behind a mutex. Every mutating call that succeeds
/// fires the subscribed listeners once afterwards.
pub struct Facade {
    handle: RepositoryHandle,
    tool: GitTool,
    fallback_identity: Option<Identity>,
    listeners: Vec<Listener>,
}

impl Default for Facade {
    fn default() -> Self {
        Self::new()
    }
}

impl Facade {
    /// Unbound facade using `git` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tool(GitTool::default())
    }

    /// Unbound facade using the given external tool.
    #[must_use]
    pub fn with_tool(tool: GitTool) -> Self {
        Self {
            handle: RepositoryHandle::new(),
            tool,
            fallback_identity: None,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub const fn handle(&self) -> &RepositoryHandle {
        &self.handle
    }

    #[must_use]
    pub const fn tool(&self) -> &GitTool {
        &self.tool
    }

    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.handle.is_bound()
    }

    /// Path of the bound repository, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.handle.path()
    }

    /// Register a callback fired after each successful mutating call.
    ///
    /// The callback carries no payload; it only signals that repository
    /// state may have changed and a fresh [`Facade::status`] is due.
    pub fn subscribe(&mut self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub(crate) fn notify(&self) {
        for listener in &self.listeners {
            listener();
        }
    }

    // === Lifecycle ===

    /// Bind to an existing repository.
    ///
    /// # Errors
    /// Returns [`Error::NotARepository`]; the facade is then unbound.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.handle.bind(path)?;
        self.notify();
        Ok(())
    }

    /// Initialize a repository and bind to it.
    ///
    /// # Errors
    /// Returns [`Error::InitError`]; the previous binding is kept.
    pub fn init(&mut self, path: impl AsRef<Path>, bare: bool) -> Result<()> {
        self.handle.init(path, bare)?;
        self.notify();
        Ok(())
    }

    /// Clone a remote repository and bind to the clone.
    ///
    /// # Errors
    /// See [`RepositoryHandle::clone_from`].
    pub fn clone_repository(
        &mut self,
        url: &str,
        target: impl AsRef<Path>,
        cancel: &CancelToken,
    ) -> Result<()> {
        self.handle.clone_from(&self.tool, url, target, cancel)?;
        self.notify();
        Ok(())
    }

    /// Drop the binding.
    pub fn close(&mut self) {
        if self.handle.is_bound() {
            self.handle.unbind();
            self.notify();
        }
    }

    // === Identity and configuration ===

    /// Identity used when a commit is made without an explicit author and
    /// git configuration has none. Typically filled from application settings.
    pub fn set_fallback_identity(&mut self, identity: Option<Identity>) {
        self.fallback_identity = identity;
    }

    #[must_use]
    pub const fn fallback_identity(&self) -> Option<&Identity> {
        self.fallback_identity.as_ref()
    }

    /// Identity a commit would be recorded with.
    ///
    /// Each field is taken from the first non-blank source: `explicit`,
    /// then the fallback identity, then `user.name`/`user.email` from git
    /// configuration.
    ///
    /// # Errors
    /// Returns [`Error::MissingIdentity`] if name or email stays unresolved.
    pub fn resolve_identity(&self, explicit: Option<&Identity>) -> Result<Identity> {
        let repo = self.handle.repo()?;
        let config = repo.config()?;
        let configured = (
            config.get_string("user.name").ok(),
            config.get_string("user.email").ok(),
        );

        pick_identity(explicit, self.fallback_identity.as_ref(), configured)
            .ok_or(Error::MissingIdentity)
    }

    /// Read a configuration value with the usual precedence (local over global).
    ///
    /// # Errors
    /// Returns error if unbound or the configuration cannot be read.
    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let config = self.handle.repo()?.config()?;
        match config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a value into the repository's local configuration.
    ///
    /// # Errors
    /// Returns error if unbound or the configuration cannot be written.
    pub fn set_config(&mut self, key: &str, value: &str) -> Result<()> {
        let mut config = self
            .handle
            .repo()?
            .config()?
            .open_level(git2::ConfigLevel::Local)?;
        config.set_str(key, value)?;
        self.notify();
        Ok(())
    }

    /// Version of the external tool.
    ///
    /// # Errors
    /// Returns [`Error::ToolUnavailable`] if it cannot be run.
    pub fn tool_version(&self) -> Result<String> {
        self.tool.version()
    }

    // === Shared helpers ===

    pub(crate) fn repo(&self) -> Result<&git2::Repository> {
        self.handle.repo()
    }

    pub(crate) const fn handle_mut(&mut self) -> &mut RepositoryHandle {
        &mut self.handle
    }

    /// Working directory of the bound repository.
    pub(crate) fn workdir(&self) -> Result<&Path> {
        self.repo()?.workdir().ok_or(Error::BareRepository)
    }
}

impl std::fmt::Debug for Facade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Facade")
            .field("handle", &self.handle)
            .field("tool", &self.tool)
            .field("fallback_identity", &self.fallback_identity)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Commit at HEAD, or `None` before the first commit.
pub(crate) fn head_commit(repo: &git2::Repository) -> Result<Option<git2::Commit<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_commit()?)),
        Err(e) if matches!(e.code(), git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound) => {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn pick_identity(
    explicit: Option<&Identity>,
    fallback: Option<&Identity>,
    configured: (Option<String>, Option<String>),
) -> Option<Identity> {
    fn first(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
        candidates
            .into_iter()
            .flatten()
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty())
    }

    let name = first([
        explicit.map(|i| i.name.clone()),
        fallback.map(|i| i.name.clone()),
        configured.0,
    ])?;
    let email = first([
        explicit.map(|i| i.email.clone()),
        fallback.map(|i| i.email.clone()),
        configured.1,
    ])?;
    Some(Identity { name, email })
}
