//! Value types handed to the presentation layer.
//!
//! All of these are detached snapshots: they hold no reference back to the
//! repository and are never updated after construction.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::error::{Error, Result};

/// Author or committer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    /// Create an identity. Blank parts are treated as missing.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    pub(crate) fn signature(&self) -> Result<git2::Signature<'static>> {
        git2::Signature::now(&self.name, &self.email).map_err(|_| Error::MissingIdentity)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// How a branch relates to the branch it tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamStatus {
    /// Remote-tracking branch name, e.g. `origin/main`.
    pub name: String,
    /// Commits on the local branch not on the upstream.
    pub ahead: usize,
    /// Commits on the upstream not on the local branch.
    pub behind: usize,
}

/// Point-in-time aggregate of repository state.
///
/// Every field comes from its own sub-query. A failed sub-query leaves its
/// field empty instead of carrying over a value from an older snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Working directory (or git dir for bare repositories).
    pub path: PathBuf,
    /// Checked-out branch; absent before the first commit or on a detached HEAD.
    pub current_branch: Option<String>,
    /// Staged, modified or conflicted paths exist. Untracked files do not count.
    pub dirty: bool,
    /// Untracked paths, in discovery order.
    pub untracked: Vec<String>,
    /// Tracked paths with unstaged working-tree changes.
    pub modified: Vec<String>,
    /// Paths whose index entry differs from the last commit.
    pub staged: Vec<String>,
    /// Paths with unmerged index entries.
    pub conflicted: Vec<String>,
    pub local_branches: Vec<String>,
    /// Remote-tracking branches, e.g. `origin/main`.
    pub remote_branches: Vec<String>,
    /// Tracking state of the current branch.
    pub upstream: Option<UpstreamStatus>,
    /// URL of the default remote, when one exists.
    pub remote_url: Option<String>,
    /// Last commit on HEAD.
    pub head: Option<CommitRecord>,
}

impl StatusSnapshot {
    /// Anything to stage or commit, untracked files included.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.dirty || !self.untracked.is_empty()
    }

    /// Number of paths in the untracked, modified, staged and conflicted lists.
    #[must_use]
    pub fn total_changed(&self) -> usize {
        self.untracked.len() + self.modified.len() + self.staged.len() + self.conflicted.len()
    }
}

/// Immutable summary of one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub hash: String,
    /// First 8 hex characters of `hash`.
    pub short_hash: String,
    /// Full message, surrounding whitespace trimmed.
    pub message: String,
    /// `Name <email>`.
    pub author: String,
    pub author_name: String,
    pub author_email: String,
    /// Commit time in the committer's own offset.
    pub timestamp: DateTime<FixedOffset>,
    /// Files touched relative to the first parent.
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
    /// Full hashes of the parents, first parent first.
    pub parents: Vec<String>,
}

impl CommitRecord {
    /// First line of the message.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// A local or remote-tracking branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchRef {
    pub name: String,
    pub is_remote: bool,
    pub is_current: bool,
    /// Short hash of the tip commit.
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<UpstreamStatus>,
}

/// A tag and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRef {
    pub name: String,
    /// Full hash of the tagged commit.
    pub target: String,
    /// Annotation message; absent for lightweight tags.
    pub message: Option<String>,
}

/// A configured remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteRef {
    pub name: String,
    pub url: String,
}

/// What to do with local changes when switching branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckoutMode {
    /// Refuse with `DirtyWorkingTree` if tracked files have changes.
    #[default]
    Safe,
    /// Carry non-conflicting local changes over to the target branch.
    KeepChanges,
    /// Discard local changes. Destructive; confirm before using.
    Force,
}
