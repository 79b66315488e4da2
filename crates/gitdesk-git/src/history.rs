//! Commit history.

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use git2::{Revwalk, Sort};

use crate::error::{Error, Result};
use crate::facade::{head_commit, Facade};
use crate::types::CommitRecord;

/// Lazy, bounded walk over commits reachable from HEAD, newest first.
///
/// Yields at most the count it was created with and cannot be restarted;
/// ask the facade for a new one instead. Borrows the facade, so no
/// mutating call can run while it is alive.
pub struct CommitHistory<'repo> {
    repo: &'repo git2::Repository,
    walk: Option<Revwalk<'repo>>,
    remaining: usize,
}

impl Iterator for CommitHistory<'_> {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let oid = match self.walk.as_mut()?.next()? {
            Ok(oid) => oid,
            Err(e) => return Some(Err(e.into())),
        };
        self.remaining -= 1;

        Some(
            self.repo
                .find_commit(oid)
                .map_err(Error::from)
                .and_then(|commit| CommitRecord::from_commit(self.repo, &commit)),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl std::fmt::Debug for CommitHistory<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitHistory")
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

impl Facade {
    /// Up to `max_count` commits reachable from HEAD, newest first.
    ///
    /// `max_count == 0` yields an empty sequence without looking at the
    /// repository.
    ///
    /// # Errors
    /// Returns [`Error::NoCommits`] if nothing was ever committed.
    pub fn commit_history(&self, max_count: usize) -> Result<CommitHistory<'_>> {
        let repo = self.repo()?;
        if max_count == 0 {
            return Ok(CommitHistory {
                repo,
                walk: None,
                remaining: 0,
            });
        }

        let head = head_commit(repo)?.ok_or(Error::NoCommits)?;
        let mut walk = repo.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        walk.push(head.id())?;

        Ok(CommitHistory {
            repo,
            walk: Some(walk),
            remaining: max_count,
        })
    }

    /// Eagerly collect up to `max_count` commits; empty before the first commit.
    ///
    /// # Errors
    /// Returns error if unbound or a commit cannot be read.
    pub fn recent_commits(&self, max_count: usize) -> Result<Vec<CommitRecord>> {
        match self.commit_history(max_count) {
            Ok(history) => history.collect(),
            Err(Error::NoCommits) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

impl CommitRecord {
    pub(crate) fn from_commit(repo: &git2::Repository, commit: &git2::Commit<'_>) -> Result<Self> {
        let hash = commit.id().to_string();
        let author = commit.author();
        let author_name = author.name().unwrap_or_default().to_string();
        let author_email = author.email().unwrap_or_default().to_string();

        let tree = commit.tree()?;
        let parent_tree = match commit.parents().next() {
            Some(parent) => Some(parent.tree()?),
            None => None,
        };
        let stats = repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?
            .stats()?;

        Ok(Self {
            short_hash: hash.chars().take(8).collect(),
            hash,
            message: commit.message().unwrap_or_default().trim().to_string(),
            author: format!("{author_name} <{author_email}>"),
            author_name,
            author_email,
            timestamp: to_datetime(commit.time()),
            files_changed: stats.files_changed(),
            insertions: stats.insertions(),
            deletions: stats.deletions(),
            parents: commit.parent_ids().map(|id| id.to_string()).collect(),
        })
    }
}

fn to_datetime(time: git2::Time) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    offset
        .timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH.with_timezone(&offset))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::test_support::{init_repo, init_repo_with_commit, write};

    #[test]
    fn test_zero_count_is_empty_even_without_commits() {
        let (_temp, facade) = init_repo();
        assert_eq!(facade.commit_history(0).unwrap().count(), 0);
    }

    #[test]
    fn test_no_commits() {
        let (_temp, facade) = init_repo();
        let err = facade.commit_history(5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoCommits);
        assert!(facade.recent_commits(5).unwrap().is_empty());
    }

    #[test]
    fn test_newest_first_and_bounded() {
        let (temp, mut facade) = init_repo_with_commit();
        for i in 1..=3 {
            write(temp.path(), "log.txt", &format!("line {i}\n"));
            facade.stage(&["log.txt"]).unwrap();
            facade.commit(&format!("change {i}"), None).unwrap();
        }

        let messages: Vec<String> = facade
            .commit_history(2)
            .unwrap()
            .map(|c| c.unwrap().message)
            .collect();
        assert_eq!(messages, vec!["change 3", "change 2"]);

        assert_eq!(facade.recent_commits(100).unwrap().len(), 4);
    }

    #[test]
    fn test_record_fields() {
        let (temp, mut facade) = init_repo_with_commit();
        write(temp.path(), "two.txt", "a\nb\n");
        facade.stage(&["two.txt"]).unwrap();
        let created = facade.commit("  Add two  \n", None).unwrap();

        let record = facade.commit_history(1).unwrap().next().unwrap().unwrap();
        assert_eq!(record, created);
        assert_eq!(record.message, "Add two");
        assert_eq!(record.short_hash.len(), 8);
        assert!(record.hash.starts_with(&record.short_hash));
        assert_eq!(record.author, "Test User <test@example.com>");
        assert_eq!((record.files_changed, record.insertions, record.deletions), (1, 2, 0));
        assert_eq!(record.parents.len(), 1);
    }

    #[test]
    fn test_to_datetime_keeps_offset() {
        let time = git2::Time::new(1_700_000_000, 120);
        let dt = to_datetime(time);
        assert_eq!(dt.offset().local_minus_utc(), 7200);
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }
}
