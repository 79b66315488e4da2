//! Staging and unstaging.

use std::path::Path;

use git2::{IndexAddOption, ResetType};

use crate::error::{Error, Result};
use crate::facade::{head_commit, Facade};
use crate::status::file_status;

impl Facade {
    /// Stage the given paths, relative to the repository root.
    ///
    /// Directories are staged recursively, including deletions. A path that
    /// no longer exists on disk but is tracked is staged as a deletion.
    /// Nothing is written unless every path is accepted.
    ///
    /// # Errors
    /// Returns [`Error::PathNotFound`] for a path that is neither on disk nor
    /// in the index.
    pub fn stage<P: AsRef<str>>(&mut self, paths: &[P]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let workdir = self.workdir()?.to_path_buf();
        let repo = self.repo()?;

        with_index(repo, |index| {
            for path in paths {
                let rel = relative_path(&workdir, path.as_ref());
                let full = workdir.join(&rel);

                if full.is_dir() {
                    index.add_all([rel.as_str()], IndexAddOption::DEFAULT, None)?;
                    index.update_all([rel.as_str()], None)?;
                } else if full.symlink_metadata().is_ok() {
                    index.add_path(Path::new(&rel))?;
                } else if index.get_path(Path::new(&rel), 0).is_some() {
                    index.remove_path(Path::new(&rel))?;
                } else {
                    return Err(Error::PathNotFound(rel));
                }
            }
            Ok(())
        })?;

        tracing::debug!(count = paths.len(), "staged paths");
        self.notify();
        Ok(())
    }

    /// Stage every untracked, modified or conflicted path seen at the start
    /// of the call. Paths that vanish meanwhile are skipped.
    ///
    /// Returns the paths that were staged.
    ///
    /// # Errors
    /// Returns error if unbound, bare, or the index cannot be written.
    pub fn stage_all(&mut self) -> Result<Vec<String>> {
        self.workdir()?;
        let repo = self.repo()?;
        let files = file_status(repo)?;
        let candidates: Vec<String> = files
            .untracked
            .into_iter()
            .chain(files.modified)
            .chain(files.conflicted)
            .collect();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let workdir = self.workdir()?.to_path_buf();
        let mut staged = Vec::with_capacity(candidates.len());
        with_index(repo, |index| {
            for rel in candidates {
                let path = Path::new(&rel);
                if workdir.join(path).symlink_metadata().is_ok() {
                    index.add_path(path)?;
                } else if index.get_path(path, 0).is_some() {
                    index.remove_path(path)?;
                } else {
                    tracing::debug!(path = %rel, "vanished before staging");
                    continue;
                }
                staged.push(rel);
            }
            Ok(())
        })?;

        tracing::debug!(count = staged.len(), "staged all changes");
        self.notify();
        Ok(staged)
    }

    /// Remove paths from the index, keeping working-tree contents.
    ///
    /// # Errors
    /// Returns error if unbound or the index cannot be written.
    pub fn unstage<P: AsRef<str>>(&mut self, paths: &[P]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let workdir = self.workdir()?.to_path_buf();
        let repo = self.repo()?;
        let rels: Vec<String> = paths
            .iter()
            .map(|p| relative_path(&workdir, p.as_ref()))
            .collect();

        match head_commit(repo)? {
            Some(head) => repo.reset_default(Some(head.as_object()), rels.iter().map(String::as_str))?,
            None => with_index(repo, |index| {
                for rel in &rels {
                    let path = Path::new(rel);
                    if index.get_path(path, 0).is_some() {
                        index.remove_path(path)?;
                    }
                }
                Ok(())
            })?,
        }

        self.notify();
        Ok(())
    }

    /// Reset the whole index to the last commit (or empty it before the
    /// first commit). The working tree is untouched.
    ///
    /// # Errors
    /// Returns error if unbound or the index cannot be written.
    pub fn unstage_all(&mut self) -> Result<()> {
        let repo = self.repo()?;
        match head_commit(repo)? {
            Some(head) => repo.reset(head.as_object(), ResetType::Mixed, None)?,
            None => with_index(repo, |index| Ok(index.clear()?))?,
        }
        self.notify();
        Ok(())
    }
}

/// Run `f` against the repository index and write it on success. On
/// failure the in-memory index is reloaded so no partial change lingers.
fn with_index<F>(repo: &git2::Repository, f: F) -> Result<()>
where
    F: FnOnce(&mut git2::Index) -> Result<()>,
{
    let mut index = repo.index()?;
    match f(&mut index) {
        Ok(()) => Ok(index.write()?),
        Err(e) => {
            if let Err(reload) = index.read(true) {
                tracing::warn!(error = %reload, "could not reload index");
            }
            Err(e)
        }
    }
}

/// Turn user input into a `/`-separated path relative to `workdir`.
fn relative_path(workdir: &Path, path: &str) -> String {
    let path = path.trim();
    let candidate = Path::new(path);
    let rel = if candidate.is_absolute() {
        candidate
            .strip_prefix(workdir)
            .map_or_else(|_| path.to_string(), |p| p.to_string_lossy().into_owned())
    } else {
        path.to_string()
    };

    let rel = rel.replace('\\', "/");
    rel.trim_start_matches("./").trim_end_matches('/').to_string()
}
