//! Binding between the application and one on-disk repository.

use std::fs;
use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::tool::{classify_failure, Completion, GitTool};
use crate::url::validate_clone_url;

/// Owns the binding to at most one repository.
///
/// Every other operation in this crate goes through [`RepositoryHandle::repo`],
/// which fails with [`Error::NotBound`] when nothing is bound.
#[derive(Default)]
pub struct RepositoryHandle {
    binding: Option<Binding>,
}

struct Binding {
    path: PathBuf,
    repo: git2::Repository,
}

impl RepositoryHandle {
    /// Create an unbound handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a repository is bound.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Path of the bound repository: the working directory, or the git
    /// directory for bare repositories.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.binding.as_ref().map(|b| b.path.as_path())
    }

    /// Bind to the repository at `path`.
    ///
    /// Only `path` itself is considered; parent directories are not searched.
    /// A failed attempt leaves the handle unbound.
    ///
    /// # Errors
    /// Returns [`Error::NotARepository`] if `path` holds no repository.
    pub fn bind(&mut self, path: impl AsRef<Path>) -> Result<&Path> {
        let path = path.as_ref();
        match git2::Repository::open(path) {
            Ok(repo) => Ok(self.attach(repo)),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "bind failed");
                self.binding = None;
                Err(Error::NotARepository {
                    path: path.to_path_buf(),
                })
            }
        }
    }

    /// Create a repository at `path` (creating the directory if needed) and bind to it.
    ///
    /// Initializing an existing repository is harmless. On failure any
    /// previous binding is kept.
    ///
    /// # Errors
    /// Returns [`Error::InitError`] on permission or filesystem errors.
    pub fn init(&mut self, path: impl AsRef<Path>, bare: bool) -> Result<&Path> {
        let path = path.as_ref();
        fs::create_dir_all(path).map_err(|e| Error::InitError {
            reason: format!("{}: {e}", path.display()),
        })?;

        let repo = if bare {
            git2::Repository::init_bare(path)
        } else {
            git2::Repository::init(path)
        }
        .map_err(|e| Error::InitError {
            reason: e.message().to_string(),
        })?;

        tracing::info!(path = %path.display(), bare, "initialized repository");
        Ok(self.attach(repo))
    }

    /// Clone `url` into `target` with the external tool and bind to the result.
    ///
    /// The URL is checked before anything touches the disk or network.
    /// `target` must be absent or an empty directory. If the clone fails or
    /// is cancelled, `target` is put back the way it was: removed if it did
    /// not exist, emptied if it did. The previous binding is kept on failure.
    ///
    /// # Errors
    /// - [`Error::InvalidUrl`] for a syntactically bad URL
    /// - [`Error::TargetNotEmpty`] if `target` has content or is a file
    /// - [`Error::Cancelled`] if `cancel` fired and the target was restored
    /// - [`Error::Inconsistent`] if the target could not be restored
    /// - the classified tool failure otherwise
    pub fn clone_from(
        &mut self,
        tool: &GitTool,
        url: &str,
        target: impl AsRef<Path>,
        cancel: &CancelToken,
    ) -> Result<&Path> {
        let url = url.trim();
        validate_clone_url(url)?;

        let target = std::path::absolute(target.as_ref())?;
        let existed = target.exists();
        if existed && !is_empty_dir(&target) {
            return Err(Error::TargetNotEmpty(target));
        }

        let parent = target
            .parent()
            .map_or_else(|| target.clone(), Path::to_path_buf);
        let created = first_missing_ancestor(&parent);
        if let Err(e) = fs::create_dir_all(&parent) {
            if let Some(root) = &created {
                let _ = fs::remove_dir_all(root);
            }
            return Err(Error::InitError {
                reason: format!("cannot create {}: {e}", parent.display()),
            });
        }

        let outcome = match tool
            .invocation(&parent)
            .args(["clone", "--", url])
            .arg(&target)
            .run(cancel)
        {
            Ok(Completion::Finished(output)) if output.success => Ok(()),
            Ok(Completion::Finished(output)) => Err(classify_failure(&output.combined())),
            Ok(Completion::Cancelled) => Err(Error::Cancelled),
            Err(e) => Err(e),
        };

        if let Err(err) = outcome {
            restore_target(&target, existed, created.as_deref()).map_err(|e| {
                Error::Inconsistent(format!(
                    "could not clean up {} after failed clone: {e}",
                    target.display()
                ))
            })?;
            return Err(err);
        }

        let repo = git2::Repository::open(&target)?;
        tracing::info!(url, path = %target.display(), "cloned repository");
        Ok(self.attach(repo))
    }

    /// Drop the binding. Calling it while unbound does nothing.
    pub fn unbind(&mut self) {
        if let Some(binding) = self.binding.take() {
            tracing::debug!(path = %binding.path.display(), "unbound repository");
        }
    }

    /// The bound repository.
    ///
    /// # Errors
    /// Returns [`Error::NotBound`] if nothing is bound.
    pub(crate) fn repo(&self) -> Result<&git2::Repository> {
        self.binding.as_ref().map(|b| &b.repo).ok_or(Error::NotBound)
    }

    /// Reopen the bound repository so that changes made by the external
    /// tool are picked up from disk.
    pub(crate) fn reload(&mut self) -> Result<()> {
        let binding = self.binding.as_mut().ok_or(Error::NotBound)?;
        binding.repo = git2::Repository::open(&binding.path)?;
        Ok(())
    }

    fn attach(&mut self, repo: git2::Repository) -> &Path {
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
        tracing::debug!(path = %path.display(), "bound repository");
        let binding = self.binding.insert(Binding { path, repo });
        &binding.path
    }
}

impl std::fmt::Debug for RepositoryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryHandle")
            .field("path", &self.path())
            .finish()
    }
}

fn is_empty_dir(path: &Path) -> bool {
    path.read_dir()
        .is_ok_and(|mut entries| entries.next().is_none())
}

/// Topmost directory of `path` that does not exist yet.
fn first_missing_ancestor(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .take_while(|p| !p.exists())
        .last()
        .map(Path::to_path_buf)
}

/// Put the clone target back the way it was. `created` is the topmost
/// directory made for the clone and goes away entirely.
fn restore_target(target: &Path, existed: bool, created: Option<&Path>) -> std::io::Result<()> {
    if let Some(root) = created {
        return if root.exists() { fs::remove_dir_all(root) } else { Ok(()) };
    }

    if !target.exists() {
        return if existed {
            fs::create_dir_all(target)
        } else {
            Ok(())
        };
    }

    if !existed {
        return fs::remove_dir_all(target);
    }

    for entry in fs::read_dir(target)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}
