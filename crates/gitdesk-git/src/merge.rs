//! Merging another branch into the current one.

use git2::build::CheckoutBuilder;
use git2::{BranchType, ErrorCode, MergeOptions};

use crate::commit::conflict_paths;
use crate::error::{Error, Result};
use crate::facade::{head_commit, Facade};
use crate::status::{current_branch_name, file_status};
use crate::types::CommitRecord;

impl Facade {
    /// Merge branch `name` into the current branch.
    ///
    /// Always records a merge commit with the message `Merge branch '<name>'`,
    /// even when a fast-forward would be possible. If both tips are the same
    /// commit, HEAD is the only parent.
    ///
    /// On conflicts nothing is committed: the conflicted index, the working
    /// tree markers and `MERGE_HEAD` stay in place for external resolution.
    /// A later [`Facade::commit`] completes the merge.
    ///
    /// # Errors
    /// - [`Error::NoCommits`] / [`Error::DetachedHead`] without a current branch
    /// - [`Error::DirtyWorkingTree`] with staged, modified or conflicted paths
    /// - [`Error::BranchNotFound`] if `name` is neither local nor remote-tracking
    /// - [`Error::MissingIdentity`] if no committer can be resolved
    /// - [`Error::MergeConflict`] listing the conflicted paths
    pub fn merge_branch(&mut self, name: &str) -> Result<CommitRecord> {
        self.workdir()?;
        let repo = self.repo()?;
        let head = head_commit(repo)?.ok_or(Error::NoCommits)?;
        let current = current_branch_name(repo)?.ok_or(Error::DetachedHead)?;

        let dirty = file_status(repo)?.dirty_paths();
        if !dirty.is_empty() {
            return Err(Error::DirtyWorkingTree { paths: dirty });
        }

        let theirs = find_merge_source(repo, name)?;
        let signature = self.resolve_identity(None)?.signature()?;

        let already_merged =
            theirs.id() == head.id() || repo.graph_descendant_of(head.id(), theirs.id())?;
        let tree = if already_merged {
            head.tree()?
        } else {
            let annotated = repo.find_annotated_commit(theirs.id())?;
            let mut options = MergeOptions::new();
            let mut checkout = CheckoutBuilder::new();
            checkout.safe().allow_conflicts(true).conflict_style_merge(true);

            repo.merge(&[&annotated], Some(&mut options), Some(&mut checkout))
                .map_err(|e| match e.code() {
                    ErrorCode::Conflict => Error::DirtyWorkingTree { paths: Vec::new() },
                    _ => e.into(),
                })?;

            let mut index = repo.index()?;
            if index.has_conflicts() {
                let paths = conflict_paths(&index)?;
                tracing::warn!(branch = name, ?paths, "merge stopped on conflicts");
                return Err(Error::MergeConflict { paths });
            }
            repo.find_tree(index.write_tree()?)?
        };

        let parents = if theirs.id() == head.id() {
            vec![&head]
        } else {
            vec![&head, &theirs]
        };
        let message = format!("Merge branch '{name}'\n");
        let oid = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &message,
            &tree,
            &parents,
        )?;
        repo.cleanup_state()?;

        let record = CommitRecord::from_commit(repo, &repo.find_commit(oid)?)?;
        tracing::info!(from = name, into = %current, hash = %record.short_hash, "merged branch");
        self.notify();
        Ok(record)
    }
}

fn find_merge_source<'repo>(
    repo: &'repo git2::Repository,
    name: &str,
) -> Result<git2::Commit<'repo>> {
    let branch = repo
        .find_branch(name, BranchType::Local)
        .or_else(|_| repo.find_branch(name, BranchType::Remote))
        .map_err(|_| Error::BranchNotFound(name.to_string()))?;
    Ok(branch.get().peel_to_commit()?)
}
