//! Fetch, pull and push through the external tool.
//!
//! Each call runs the tool exactly once. Nothing is retried here; callers
//! use [`crate::Error::is_transient`] to decide whether to offer a retry.

use std::ffi::OsString;
use std::path::PathBuf;

use git2::{BranchType, Oid, RepositoryState};

use crate::branch_name::BranchName;
use crate::cancel::CancelToken;
use crate::commit::conflict_paths;
use crate::error::{Error, Result};
use crate::facade::{head_commit, Facade};
use crate::remote::require_remote;
use crate::status::current_branch_name;
use crate::tool::{classify_failure, Completion};

/// Repository facts compared before and after a cancelled run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Checkpoint {
    head: Option<Oid>,
}

impl Checkpoint {
    fn capture(repo: &git2::Repository) -> Self {
        Self {
            head: repo.refname_to_id("HEAD").ok(),
        }
    }
}

/// One external-tool run against the bound repository.
struct NetworkCall {
    op: &'static str,
    args: Vec<OsString>,
    envs: Vec<(&'static str, String)>,
}

impl NetworkCall {
    fn new(op: &'static str) -> Self {
        Self {
            op,
            args: vec![op.into()],
            envs: Vec::new(),
        }
    }

    fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl Facade {
    /// Fetch from `remote`: only `branch` when given, otherwise everything
    /// the remote's refspecs cover.
    ///
    /// # Errors
    /// - [`Error::RemoteNotFound`] for an unknown remote
    /// - [`Error::NetworkError`] / [`Error::AuthError`] for transport failures
    /// - [`Error::Cancelled`] / [`Error::Inconsistent`] after cancellation
    pub fn fetch(&mut self, remote: &str, branch: Option<&str>, cancel: &CancelToken) -> Result<()> {
        require_remote(self.repo()?, remote)?;

        let branch = branch.map(BranchName::new).transpose()?;

        let mut call = NetworkCall::new("fetch").arg("--").arg(remote);
        if let Some(branch) = branch {
            call = call.arg(branch.as_str());
        }
        self.run_network(call, cancel)
    }

    /// Push `branch` (default: the current branch) to the same name on
    /// `remote`. A branch without an upstream gets `remote/branch` as its
    /// upstream.
    ///
    /// # Errors
    /// - [`Error::RemoteNotFound`] / [`Error::BranchNotFound`]
    /// - [`Error::NoCommits`] / [`Error::DetachedHead`] when defaulting the branch
    /// - [`Error::Rejected`] if the remote has diverged
    /// - [`Error::NetworkError`] / [`Error::AuthError`] for transport failures
    /// - [`Error::Cancelled`] / [`Error::Inconsistent`] after cancellation
    pub fn push(&mut self, remote: &str, branch: Option<&str>, cancel: &CancelToken) -> Result<()> {
        let repo = self.repo()?;
        require_remote(repo, remote)?;
        let branch = self.branch_or_current(branch)?;

        let has_upstream = repo
            .find_branch(&branch, BranchType::Local)
            .map_err(|_| Error::BranchNotFound(branch.to_string()))?
            .upstream()
            .is_ok();

        let mut call = NetworkCall::new("push").arg("--porcelain");
        if !has_upstream {
            call = call.arg("--set-upstream");
        }
        let call = call
            .arg("--")
            .arg(remote)
            .arg(format!("refs/heads/{branch}:refs/heads/{branch}"));
        self.run_network(call, cancel)
    }

    /// Fetch `branch` (default: the current branch) from `remote` and merge
    /// it into the current branch, never rebasing.
    ///
    /// # Errors
    /// - [`Error::RemoteNotFound`]
    /// - [`Error::NoCommits`] / [`Error::DetachedHead`] when defaulting the branch
    /// - [`Error::MergeConflict`] with the conflicted paths; merge state is left in place
    /// - [`Error::DirtyWorkingTree`] if local changes are in the way
    /// - [`Error::NetworkError`] / [`Error::AuthError`] for transport failures
    /// - [`Error::Cancelled`] / [`Error::Inconsistent`] after cancellation
    pub fn pull(&mut self, remote: &str, branch: Option<&str>, cancel: &CancelToken) -> Result<()> {
        self.workdir()?;
        require_remote(self.repo()?, remote)?;
        let branch = self.branch_or_current(branch)?;

        let mut call = NetworkCall::new("pull")
            .arg("--no-rebase")
            .arg("--no-edit")
            .arg("--")
            .arg(remote)
            .arg(branch.as_str());

        // Merge commits made by the tool follow the same identity resolution
        // as local commits.
        if let Ok(identity) = self.resolve_identity(None) {
            for (key, value) in [
                ("GIT_AUTHOR_NAME", &identity.name),
                ("GIT_AUTHOR_EMAIL", &identity.email),
                ("GIT_COMMITTER_NAME", &identity.name),
                ("GIT_COMMITTER_EMAIL", &identity.email),
            ] {
                call.envs.push((key, value.clone()));
            }
        }

        self.run_network(call, cancel)
    }

    /// Push one tag to `remote`.
    ///
    /// # Errors
    /// [`Error::TagNotFound`] for an unknown local tag, otherwise as [`Facade::push`].
    pub fn push_tag(&mut self, name: &str, remote: &str, cancel: &CancelToken) -> Result<()> {
        let repo = self.repo()?;
        require_remote(repo, remote)?;
        let refname = format!("refs/tags/{name}");
        if repo.find_reference(&refname).is_err() {
            return Err(Error::TagNotFound(name.to_string()));
        }

        let call = NetworkCall::new("push")
            .arg("--porcelain")
            .arg("--")
            .arg(remote)
            .arg(format!("{refname}:{refname}"));
        self.run_network(call, cancel)
    }

    /// Push every local tag to `remote`.
    ///
    /// # Errors
    /// As [`Facade::push`].
    pub fn push_all_tags(&mut self, remote: &str, cancel: &CancelToken) -> Result<()> {
        require_remote(self.repo()?, remote)?;
        let call = NetworkCall::new("push")
            .arg("--porcelain")
            .arg("--tags")
            .arg("--")
            .arg(remote);
        self.run_network(call, cancel)
    }

    fn branch_or_current(&self, branch: Option<&str>) -> Result<BranchName> {
        if let Some(branch) = branch {
            return BranchName::new(branch);
        }
        let repo = self.repo()?;
        match current_branch_name(repo)? {
            Some(name) => BranchName::new(name),
            None if head_commit(repo)?.is_none() => Err(Error::NoCommits),
            None => Err(Error::DetachedHead),
        }
    }

    fn run_network(&mut self, call: NetworkCall, cancel: &CancelToken) -> Result<()> {
        let cwd: PathBuf = self.path().ok_or(Error::NotBound)?.to_path_buf();
        let before = Checkpoint::capture(self.repo()?);
        tracing::info!(op = call.op, args = ?call.args, "starting network operation");

        let mut invocation = self.tool().invocation(&cwd).args(&call.args);
        for (key, value) in &call.envs {
            invocation = invocation.env(key, value);
        }
        let completion = invocation.run(cancel);

        // The tool may have moved refs or rewritten the index behind git2's back.
        self.handle_mut().reload()?;
        let repo = self.repo()?;

        match completion? {
            Completion::Finished(output) if output.success => {
                tracing::info!(op = call.op, "network operation finished");
                self.notify();
                Ok(())
            }
            Completion::Finished(output) => {
                let err = match classify_failure(&output.combined()) {
                    Error::MergeConflict { .. } => Error::MergeConflict {
                        paths: conflict_paths(&repo.index()?)?,
                    },
                    other => other,
                };
                tracing::warn!(op = call.op, error = %err, "network operation failed");
                // A conflicted pull still changed the working tree.
                if matches!(err, Error::MergeConflict { .. }) {
                    self.notify();
                }
                Err(err)
            }
            Completion::Cancelled => {
                let err = verify_after_cancel(repo, before);
                tracing::warn!(op = call.op, error = %err, "network operation cancelled");
                Err(err)
            }
        }
    }
}

/// Decide between [`Error::Cancelled`] and [`Error::Inconsistent`] after a
/// killed run by checking that nothing was left half-done.
fn verify_after_cancel(repo: &git2::Repository, before: Checkpoint) -> Error {
    let state = repo.state();
    if state != RepositoryState::Clean {
        return Error::Inconsistent(format!("operation left in progress: {state:?}"));
    }
    if repo.path().join("index.lock").exists() {
        return Error::Inconsistent("index.lock left behind".into());
    }
    if repo.index().is_ok_and(|index| index.has_conflicts()) {
        return Error::Inconsistent("index has unmerged entries".into());
    }

    let after = Checkpoint::capture(repo);
    if after != before {
        return Error::Inconsistent("HEAD moved during cancelled operation".into());
    }
    Error::Cancelled
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::test_support::{bare_remote, clone_peer, git, init_repo, init_repo_with_commit, write};

    fn commit_in(facade: &mut Facade, root: &std::path::Path, file: &str, body: &str) {
        write(root, file, body);
        facade.stage(&[file]).unwrap();
        facade.commit(&format!("edit {file}"), None).unwrap();
    }

    fn peer_commit(peer: &std::path::Path, file: &str, body: &str) {
        write(peer, file, body);
        git(peer, &["add", file]);
        git(peer, &["commit", "-m", &format!("peer edits {file}")]);
        git(peer, &["push", "origin", "HEAD"]);
    }

    #[test]
    fn test_push_updates_remote() {
        let (temp, mut facade) = init_repo_with_commit();
        let (_remote_dir, remote) = bare_remote(temp.path());
        commit_in(&mut facade, temp.path(), "new.txt", "n");

        facade.push("origin", None, &CancelToken::new()).unwrap();

        let branch = facade.current_branch().unwrap().unwrap();
        let local = git(temp.path(), &["rev-parse", "HEAD"]);
        let remote_tip = git(&remote, &["rev-parse", &format!("refs/heads/{branch}")]);
        assert_eq!(local, remote_tip);
        assert_eq!(facade.status().unwrap().upstream.unwrap().ahead, 0);
    }

    #[test]
    fn test_push_new_branch_sets_upstream() {
        let (temp, mut facade) = init_repo_with_commit();
        let (_remote_dir, _) = bare_remote(temp.path());
        facade.create_branch("topic", true).unwrap();

        facade.push("origin", None, &CancelToken::new()).unwrap();
        let upstream = facade.status().unwrap().upstream.unwrap();
        assert_eq!(upstream.name, "origin/topic");
    }

    #[test]
    fn test_push_rejected_when_remote_diverged() {
        let (temp, mut facade) = init_repo_with_commit();
        let (_remote_dir, remote) = bare_remote(temp.path());
        let (_peer_dir, peer) = clone_peer(&remote);
        peer_commit(&peer, "peer.txt", "p");
        commit_in(&mut facade, temp.path(), "mine.txt", "m");

        let err = facade.push("origin", None, &CancelToken::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_fetch_then_pull() {
        let (temp, mut facade) = init_repo_with_commit();
        let (_remote_dir, remote) = bare_remote(temp.path());
        let (_peer_dir, peer) = clone_peer(&remote);
        peer_commit(&peer, "peer.txt", "p");

        facade.fetch("origin", None, &CancelToken::new()).unwrap();
        assert_eq!(facade.status().unwrap().upstream.unwrap().behind, 1);
        assert!(!temp.path().join("peer.txt").exists());

        facade.pull("origin", None, &CancelToken::new()).unwrap();
        assert!(temp.path().join("peer.txt").exists());
        assert_eq!(facade.status().unwrap().upstream.unwrap().behind, 0);
    }

    #[test]
    fn test_pull_conflict_reports_paths() {
        let (temp, mut facade) = init_repo_with_commit();
        let (_remote_dir, remote) = bare_remote(temp.path());
        let (_peer_dir, peer) = clone_peer(&remote);
        peer_commit(&peer, "README.md", "peer version\n");
        commit_in(&mut facade, temp.path(), "README.md", "local version\n");

        match facade.pull("origin", None, &CancelToken::new()).unwrap_err() {
            Error::MergeConflict { paths } => assert_eq!(paths, vec!["README.md"]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(facade.status().unwrap().conflicted, vec!["README.md"]);
    }

    #[test]
    fn test_unknown_remote() {
        let (_temp, mut facade) = init_repo_with_commit();
        let cancel = CancelToken::new();
        for result in [
            facade.fetch("nowhere", None, &cancel),
            facade.push("nowhere", None, &cancel),
            facade.pull("nowhere", None, &cancel),
            facade.push_all_tags("nowhere", &cancel),
        ] {
            assert_eq!(result.unwrap_err().kind(), ErrorKind::RemoteNotFound);
        }
    }

    #[test]
    fn test_option_like_branch_is_rejected() {
        let (temp, mut facade) = init_repo_with_commit();
        let (_remote_dir, _remote) = bare_remote(temp.path());
        let marker = temp.path().join("marker");
        let branch = format!("--upload-pack=touch {};git-upload-pack", marker.display());
        let cancel = CancelToken::new();

        for result in [
            facade.fetch("origin", Some(&branch), &cancel),
            facade.pull("origin", Some(&branch), &cancel),
            facade.push("origin", Some(&branch), &cancel),
            facade.fetch("origin", Some("-x"), &cancel),
        ] {
            assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidBranchName);
        }
        assert!(!marker.exists());
    }

    #[test]
    fn test_push_without_commits() {
        let (_temp, mut facade) = init_repo();
        facade.add_remote("origin", "/srv/none.git").unwrap();
        let err = facade.push("origin", None, &CancelToken::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoCommits);
    }

    #[test]
    fn test_unreachable_remote_is_transient_network_error() {
        let (_temp, mut facade) = init_repo_with_commit();
        facade
            .add_remote("dead", "https://127.0.0.1:9/none.git")
            .unwrap();

        let err = facade.fetch("dead", None, &CancelToken::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert!(err.is_transient());
    }

    #[test]
    fn test_push_tags() {
        let (temp, mut facade) = init_repo_with_commit();
        let (_remote_dir, remote) = bare_remote(temp.path());
        facade.create_tag("v1", None, None).unwrap();
        facade.create_tag("v2", Some("second"), None).unwrap();
        let cancel = CancelToken::new();

        facade.push_tag("v1", "origin", &cancel).unwrap();
        assert!(git(&remote, &["tag", "--list"]).contains("v1"));
        assert!(!git(&remote, &["tag", "--list"]).contains("v2"));

        facade.push_all_tags("origin", &cancel).unwrap();
        assert!(git(&remote, &["tag", "--list"]).contains("v2"));

        let err = facade.push_tag("v9", "origin", &cancel).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TagNotFound);
    }

    #[test]
    fn test_cancelled_pull_on_clean_repository() {
        let (temp, mut facade) = init_repo_with_commit();
        let (_remote_dir, _) = bare_remote(temp.path());
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = facade.pull("origin", None, &cancel).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_verify_after_cancel_detects_leftovers() {
        let (_temp, facade) = init_repo_with_commit();
        let repo = facade.repo().unwrap();
        let before = Checkpoint::capture(repo);
        assert_eq!(verify_after_cancel(repo, before).kind(), ErrorKind::Cancelled);

        std::fs::write(repo.path().join("index.lock"), "").unwrap();
        assert_eq!(verify_after_cancel(repo, before).kind(), ErrorKind::Inconsistent);
        std::fs::remove_file(repo.path().join("index.lock")).unwrap();

        let moved = Checkpoint { head: None };
        assert_eq!(verify_after_cancel(repo, moved).kind(), ErrorKind::Inconsistent);
    }
}
