//! Branch operations.

use git2::build::CheckoutBuilder;
use git2::{BranchType, ErrorCode};

use crate::branch_name::BranchName;
use crate::error::{Error, Result};
use crate::facade::{head_commit, Facade};
use crate::status::{current_branch_name, file_status, upstream_of};
use crate::types::{BranchRef, CheckoutMode};

/// Where a checkout target was found.
enum Target<'repo> {
    Local(git2::Branch<'repo>),
    /// `<remote>/<name>` with no local branch of that name yet.
    Remote(git2::Branch<'repo>, String),
}

impl Facade {
    /// Name of the checked-out branch; `None` before the first commit or on
    /// a detached HEAD.
    ///
    /// # Errors
    /// Returns error if unbound or HEAD cannot be read.
    pub fn current_branch(&self) -> Result<Option<String>> {
        current_branch_name(self.repo()?)
    }

    /// Local branches followed by remote-tracking branches.
    ///
    /// # Errors
    /// Returns error if unbound or branches cannot be listed.
    pub fn list_branches(&self) -> Result<Vec<BranchRef>> {
        let repo = self.repo()?;
        let current = current_branch_name(repo)?;
        let mut refs = Vec::new();

        for kind in [BranchType::Local, BranchType::Remote] {
            let is_remote = matches!(kind, BranchType::Remote);
            for item in repo.branches(Some(kind))? {
                let (branch, _) = item?;
                let Some(name) = branch.name()?.map(String::from) else {
                    continue;
                };
                if is_remote && name.ends_with("/HEAD") {
                    continue;
                }

                let upstream = if is_remote {
                    None
                } else {
                    upstream_of(repo, &branch).ok().flatten()
                };
                refs.push(BranchRef {
                    is_current: !is_remote && current.as_deref() == Some(name.as_str()),
                    target: branch
                        .get()
                        .target()
                        .map(|oid| oid.to_string().chars().take(8).collect()),
                    name,
                    is_remote,
                    upstream,
                });
            }
        }

        Ok(refs)
    }

    /// Create a branch at HEAD, optionally switching to it.
    ///
    /// # Errors
    /// - [`Error::InvalidBranchName`] if `name` fails validation
    /// - [`Error::BranchExists`] if a local branch of that name exists
    /// - [`Error::NoCommits`] before the first commit
    pub fn create_branch(&mut self, name: &str, checkout: bool) -> Result<()> {
        let name = BranchName::new(name)?;
        let repo = self.repo()?;
        if repo.find_branch(&name, BranchType::Local).is_ok() {
            return Err(Error::BranchExists(name.to_string()));
        }

        let head = head_commit(repo)?.ok_or(Error::NoCommits)?;
        repo.branch(&name, &head, false)?;
        if checkout {
            // Same commit as HEAD, so the working tree needs no update.
            repo.set_head(&name.refname())?;
        }

        tracing::info!(branch = %name, checkout, "created branch");
        self.notify();
        Ok(())
    }

    /// Switch to `name`.
    ///
    /// A name that exists only as `<remote>/<name>` gets a local branch
    /// tracking it first. Switching to the current branch does nothing.
    ///
    /// # Errors
    /// - [`Error::InvalidBranchName`] if `name` fails validation
    /// - [`Error::BranchNotFound`] if neither a local nor a remote branch matches
    /// - [`Error::DirtyWorkingTree`] if local changes are in the way for `mode`
    pub fn checkout_branch(&mut self, name: &str, mode: CheckoutMode) -> Result<()> {
        let name = BranchName::new(name)?;
        self.workdir()?;
        let repo = self.repo()?;
        if current_branch_name(repo)?.as_deref() == Some(name.as_str()) {
            return Ok(());
        }

        let target = find_checkout_target(repo, &name)?;
        if mode == CheckoutMode::Safe {
            let dirty = file_status(repo)?.dirty_paths();
            if !dirty.is_empty() {
                return Err(Error::DirtyWorkingTree { paths: dirty });
            }
        }

        let commit = match &target {
            Target::Local(branch) | Target::Remote(branch, _) => branch.get().peel_to_commit()?,
        };
        let mut builder = CheckoutBuilder::new();
        if mode == CheckoutMode::Force {
            builder.force();
        } else {
            builder.safe();
        }

        repo.checkout_tree(commit.as_object(), Some(&mut builder))
            .map_err(|e| match e.code() {
                ErrorCode::Conflict => Error::DirtyWorkingTree {
                    paths: file_status(repo)
                        .map(|f| f.dirty_paths())
                        .unwrap_or_default(),
                },
                _ => e.into(),
            })?;

        // The tracking branch only appears once the tree has switched.
        if let Target::Remote(_, upstream) = &target {
            let mut local = repo.branch(&name, &commit, false)?;
            local.set_upstream(Some(upstream))?;
            tracing::info!(branch = %name, %upstream, "created tracking branch");
        }
        repo.set_head(&name.refname())?;

        tracing::info!(branch = %name, ?mode, "checked out branch");
        self.notify();
        Ok(())
    }

    /// Delete a local branch, merged or not.
    ///
    /// Destructive; the presentation layer confirms before calling.
    ///
    /// # Errors
    /// - [`Error::CannotDeleteCurrent`] if HEAD points at it
    /// - [`Error::BranchNotFound`] if it does not exist
    pub fn delete_branch(&mut self, name: &str) -> Result<()> {
        let name = BranchName::new(name)?;
        let repo = self.repo()?;

        let head = repo.find_reference("HEAD")?;
        if head.symbolic_target() == Some(name.refname().as_str()) {
            return Err(Error::CannotDeleteCurrent(name.to_string()));
        }

        let mut branch = repo
            .find_branch(&name, BranchType::Local)
            .map_err(|_| Error::BranchNotFound(name.to_string()))?;
        branch.delete()?;

        tracing::info!(branch = %name, "deleted branch");
        self.notify();
        Ok(())
    }

    /// Rename a local branch. HEAD follows if it was the current branch.
    ///
    /// # Errors
    /// - [`Error::InvalidBranchName`] if either name fails validation
    /// - [`Error::BranchNotFound`] if `old` does not exist
    /// - [`Error::BranchExists`] if `new` already exists
    pub fn rename_branch(&mut self, old: &str, new: &str) -> Result<()> {
        let old = BranchName::new(old)?;
        let new = BranchName::new(new)?;
        let repo = self.repo()?;

        let mut branch = repo
            .find_branch(&old, BranchType::Local)
            .map_err(|_| Error::BranchNotFound(old.to_string()))?;
        if repo.find_branch(&new, BranchType::Local).is_ok() {
            return Err(Error::BranchExists(new.to_string()));
        }
        branch.rename(&new, false)?;

        tracing::info!(from = %old, to = %new, "renamed branch");
        self.notify();
        Ok(())
    }
}

fn find_checkout_target<'repo>(
    repo: &'repo git2::Repository,
    name: &BranchName,
) -> Result<Target<'repo>> {
    if let Ok(branch) = repo.find_branch(name, BranchType::Local) {
        return Ok(Target::Local(branch));
    }

    for remote in repo.remotes()?.iter().flatten() {
        let upstream = format!("{remote}/{name}");
        if let Ok(branch) = repo.find_branch(&upstream, BranchType::Remote) {
            return Ok(Target::Remote(branch, upstream));
        }
    }

    Err(Error::BranchNotFound(name.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::test_support::{bare_remote, git, init_repo_with_commit, write};

    #[test]
    fn test_create_and_list() {
        let (_temp, mut facade) = init_repo_with_commit();
        let main = facade.current_branch().unwrap().unwrap();

        facade.create_branch("feature/x", false).unwrap();
        assert_eq!(facade.current_branch().unwrap().as_deref(), Some(main.as_str()));

        facade.create_branch("feature/y", true).unwrap();
        assert_eq!(facade.current_branch().unwrap().as_deref(), Some("feature/y"));

        let branches = facade.list_branches().unwrap();
        let current: Vec<_> = branches.iter().filter(|b| b.is_current).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].name, "feature/y");
        assert!(branches.iter().all(|b| !b.is_remote));
        assert!(branches.iter().all(|b| b.target.as_ref().is_some_and(|t| t.len() == 8)));
    }

    #[test]
    fn test_create_rejects_bad_and_duplicate_names() {
        let (_temp, mut facade) = init_repo_with_commit();
        facade.create_branch("dup", false).unwrap();

        let err = facade.create_branch("dup", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BranchExists);

        for bad in ["a b", "a~b", "a..b", ".hidden", "trailing/", ""] {
            let err = facade.create_branch(bad, false).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidBranchName, "{bad:?}");
        }
    }

    #[test]
    fn test_create_without_commits() {
        let (_temp, mut facade) = crate::test_support::init_repo();
        let err = facade.create_branch("feature", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoCommits);
    }

    #[test]
    fn test_checkout_switches_working_tree() {
        let (temp, mut facade) = init_repo_with_commit();
        let main = facade.current_branch().unwrap().unwrap();
        facade.create_branch("feature", true).unwrap();
        write(temp.path(), "feature.txt", "f");
        facade.stage(&["feature.txt"]).unwrap();
        facade.commit("feature work", None).unwrap();

        facade.checkout_branch(&main, CheckoutMode::Safe).unwrap();
        assert!(!temp.path().join("feature.txt").exists());

        facade.checkout_branch("feature", CheckoutMode::Safe).unwrap();
        assert!(temp.path().join("feature.txt").exists());
        facade.checkout_branch("feature", CheckoutMode::Safe).unwrap();
    }

    #[test]
    fn test_checkout_dirty_tree() {
        let (temp, mut facade) = init_repo_with_commit();
        facade.create_branch("other", false).unwrap();
        write(temp.path(), "README.md", "local edit");

        let err = facade
            .checkout_branch("other", CheckoutMode::Safe)
            .unwrap_err();
        match err {
            Error::DirtyWorkingTree { paths } => assert_eq!(paths, vec!["README.md"]),
            other => panic!("unexpected {other:?}"),
        }

        facade
            .checkout_branch("other", CheckoutMode::KeepChanges)
            .unwrap();
        assert_eq!(facade.current_branch().unwrap().as_deref(), Some("other"));
        assert_eq!(
            std::fs::read_to_string(temp.path().join("README.md")).unwrap(),
            "local edit"
        );
    }

    #[test]
    fn test_force_checkout_discards_changes() {
        let (temp, mut facade) = init_repo_with_commit();
        let main = facade.current_branch().unwrap().unwrap();
        facade.create_branch("other", true).unwrap();
        write(temp.path(), "README.md", "changed on other");
        facade.stage(&["README.md"]).unwrap();
        facade.commit("other change", None).unwrap();
        write(temp.path(), "README.md", "uncommitted");

        let err = facade
            .checkout_branch(&main, CheckoutMode::KeepChanges)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DirtyWorkingTree);

        facade.checkout_branch(&main, CheckoutMode::Force).unwrap();
        assert_eq!(
            std::fs::read_to_string(temp.path().join("README.md")).unwrap(),
            "# Test\n"
        );
    }

    #[test]
    fn test_checkout_remote_only_branch_creates_tracking_branch() {
        let (temp, mut facade) = init_repo_with_commit();
        let (_remote_dir, _) = bare_remote(temp.path());
        git(temp.path(), &["push", "origin", "HEAD:refs/heads/published"]);
        git(temp.path(), &["fetch", "origin"]);

        facade
            .checkout_branch("published", CheckoutMode::Safe)
            .unwrap();
        let branches = facade.list_branches().unwrap();
        let published = branches
            .iter()
            .find(|b| b.name == "published" && !b.is_remote)
            .unwrap();
        assert!(published.is_current);
        assert_eq!(published.upstream.as_ref().unwrap().name, "origin/published");
        assert!(branches.iter().any(|b| b.is_remote && b.name == "origin/published"));
    }

    #[test]
    fn test_failed_remote_checkout_leaves_no_local_branch() {
        let (temp, mut facade) = init_repo_with_commit();
        let (_remote_dir, _) = bare_remote(temp.path());
        let main = facade.current_branch().unwrap().unwrap();

        git(temp.path(), &["checkout", "-b", "published"]);
        write(temp.path(), "README.md", "# Published\n");
        git(temp.path(), &["commit", "-am", "Published readme"]);
        git(temp.path(), &["push", "origin", "published"]);
        git(temp.path(), &["checkout", &main]);
        git(temp.path(), &["branch", "-D", "published"]);
        write(temp.path(), "README.md", "# Local edit\n");

        let err = facade
            .checkout_branch("published", CheckoutMode::KeepChanges)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DirtyWorkingTree);

        let locals: Vec<_> = facade
            .list_branches()
            .unwrap()
            .into_iter()
            .filter(|b| !b.is_remote)
            .map(|b| b.name)
            .collect();
        assert_eq!(locals, vec![main.clone()]);
        assert_eq!(facade.current_branch().unwrap(), Some(main));
        assert_eq!(
            std::fs::read_to_string(temp.path().join("README.md")).unwrap(),
            "# Local edit\n"
        );
    }

    #[test]
    fn test_checkout_unknown_branch() {
        let (_temp, mut facade) = init_repo_with_commit();
        let err = facade
            .checkout_branch("nope", CheckoutMode::Safe)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BranchNotFound);
    }

    #[test]
    fn test_delete_current_always_refused() {
        let (_temp, mut facade) = init_repo_with_commit();
        let main = facade.current_branch().unwrap().unwrap();
        facade.create_branch("other", false).unwrap();

        let err = facade.delete_branch(&main).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CannotDeleteCurrent);

        facade.delete_branch("other").unwrap();
        let err = facade.delete_branch("other").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BranchNotFound);
    }

    #[test]
    fn test_delete_unborn_current_refused() {
        let (_temp, mut facade) = crate::test_support::init_repo();
        let current = {
            let head = facade.repo().unwrap().find_reference("HEAD").unwrap();
            head.symbolic_target()
                .unwrap()
                .trim_start_matches("refs/heads/")
                .to_string()
        };

        let err = facade.delete_branch(&current).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CannotDeleteCurrent);
    }

    #[test]
    fn test_rename_current_branch() {
        let (_temp, mut facade) = init_repo_with_commit();
        let main = facade.current_branch().unwrap().unwrap();
        facade.create_branch("taken", false).unwrap();

        let err = facade.rename_branch(&main, "taken").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BranchExists);

        facade.rename_branch(&main, "trunk").unwrap();
        assert_eq!(facade.current_branch().unwrap().as_deref(), Some("trunk"));

        let err = facade.rename_branch("missing", "x").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BranchNotFound);
    }
}
