//! Recording commits.

use git2::{Oid, RepositoryState};

use crate::error::{Error, Result};
use crate::facade::{head_commit, Facade};
use crate::types::{CommitRecord, Identity};

impl Facade {
    /// Record the index as a new commit on HEAD.
    ///
    /// While a merge is in progress the merged-in heads become extra parents
    /// and the merge state is cleared afterwards.
    ///
    /// # Errors
    /// - [`Error::EmptyMessage`] if `message` is blank
    /// - [`Error::MergeConflict`] if the index still has conflicts
    /// - [`Error::NothingStaged`] if the index matches the last commit
    /// - [`Error::MissingIdentity`] if no author can be resolved
    pub fn commit(&mut self, message: &str, author: Option<&Identity>) -> Result<CommitRecord> {
        let repo = self.repo()?;
        let message = normalize_message(message)?;

        let mut index = repo.index()?;
        if index.has_conflicts() {
            return Err(Error::MergeConflict {
                paths: conflict_paths(&index)?,
            });
        }

        let merging = repo.state() == RepositoryState::Merge;
        let head = head_commit(repo)?;
        let tree_id = index.write_tree()?;
        let unchanged = match &head {
            Some(commit) => commit.tree_id() == tree_id,
            None => index.is_empty(),
        };
        if unchanged && !merging {
            return Err(Error::NothingStaged);
        }

        let signature = self.resolve_identity(author)?.signature()?;
        let tree = repo.find_tree(tree_id)?;

        let mut parents: Vec<git2::Commit<'_>> = head.into_iter().collect();
        if merging {
            for id in merge_heads(repo)? {
                parents.push(repo.find_commit(id)?);
            }
        }
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        let oid = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &message,
            &tree,
            &parent_refs,
        )?;
        if merging {
            repo.cleanup_state()?;
        }

        let record = CommitRecord::from_commit(repo, &repo.find_commit(oid)?)?;
        tracing::info!(hash = %record.short_hash, merge = record.is_merge(), "committed");
        self.notify();
        Ok(record)
    }

    /// Replace the last commit with one built from the current index.
    ///
    /// Keeps the original author unless `author` is given; the committer is
    /// the resolved current identity.
    ///
    /// # Errors
    /// - [`Error::EmptyMessage`] if `message` is blank
    /// - [`Error::NoCommits`] before the first commit
    /// - [`Error::MergeConflict`] if the index has conflicts
    pub fn amend(&mut self, message: &str, author: Option<&Identity>) -> Result<CommitRecord> {
        let repo = self.repo()?;
        let message = normalize_message(message)?;
        let head = head_commit(repo)?.ok_or(Error::NoCommits)?;

        let mut index = repo.index()?;
        if index.has_conflicts() {
            return Err(Error::MergeConflict {
                paths: conflict_paths(&index)?,
            });
        }
        let tree = repo.find_tree(index.write_tree()?)?;

        let committer = self.resolve_identity(author)?.signature()?;
        let author_sig = match author {
            Some(_) => committer.clone(),
            None => head.author().to_owned(),
        };

        let oid = head.amend(
            Some("HEAD"),
            Some(&author_sig),
            Some(&committer),
            None,
            Some(&message),
            Some(&tree),
        )?;

        let record = CommitRecord::from_commit(repo, &repo.find_commit(oid)?)?;
        tracing::info!(hash = %record.short_hash, "amended last commit");
        self.notify();
        Ok(record)
    }
}

fn normalize_message(message: &str) -> Result<String> {
    let message = message.trim();
    if message.is_empty() {
        Err(Error::EmptyMessage)
    } else {
        Ok(format!("{message}\n"))
    }
}

/// Heads recorded in `MERGE_HEAD` by an interrupted merge.
fn merge_heads(repo: &git2::Repository) -> Result<Vec<Oid>> {
    let path = repo.path().join("MERGE_HEAD");
    let Ok(contents) = std::fs::read_to_string(path) else {
        return Ok(Vec::new());
    };

    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Oid::from_str(line).map_err(Error::from))
        .collect()
}

/// Paths with unmerged entries in `index`, sorted.
pub(crate) fn conflict_paths(index: &git2::Index) -> Result<Vec<String>> {
    let mut paths = Vec::new();
    for conflict in index.conflicts()? {
        let conflict = conflict?;
        let entry = conflict
            .our
            .or(conflict.their)
            .or(conflict.ancestor);
        if let Some(entry) = entry {
            paths.push(String::from_utf8_lossy(&entry.path).into_owned());
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}
