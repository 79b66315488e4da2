//! The aggregated status query.

use git2::{BranchType, Status, StatusOptions};

use crate::error::Result;
use crate::facade::{head_commit, Facade};
use crate::types::{CommitRecord, StatusSnapshot, UpstreamStatus};

/// Working-tree and index state sorted into display buckets.
#[derive(Debug, Default)]
pub(crate) struct FileStatus {
    pub untracked: Vec<String>,
    pub modified: Vec<String>,
    pub staged: Vec<String>,
    pub conflicted: Vec<String>,
}

impl FileStatus {
    /// Tracked paths with staged, unstaged or conflicted changes.
    pub fn dirty_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .conflicted
            .iter()
            .chain(&self.staged)
            .chain(&self.modified)
            .cloned()
            .collect();
        paths.sort();
        paths.dedup();
        paths
    }
}

impl Facade {
    /// Build a fresh snapshot of repository state.
    ///
    /// Never fails once bound: each sub-query that errors is logged and its
    /// fields are left empty.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotBound`] if no repository is bound.
    pub fn status(&self) -> Result<StatusSnapshot> {
        let repo = self.repo()?;
        let path = self.path().map(ToOwned::to_owned).unwrap_or_default();

        let files = degrade("files", file_status(repo));
        let current_branch = degrade("current branch", current_branch_name(repo));
        let (local_branches, remote_branches) = degrade("branches", branch_names(repo));
        let upstream = degrade("upstream", upstream_status(repo));
        let remote_url = degrade("remote url", default_remote_url(repo));
        let head = degrade("head", head_record(repo));

        Ok(StatusSnapshot {
            path,
            current_branch,
            dirty: !files.staged.is_empty()
                || !files.modified.is_empty()
                || !files.conflicted.is_empty(),
            untracked: files.untracked,
            modified: files.modified,
            staged: files.staged,
            conflicted: files.conflicted,
            local_branches,
            remote_branches,
            upstream,
            remote_url,
            head,
        })
    }
}

fn degrade<T: Default>(what: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "status: {what} query failed");
        T::default()
    })
}

pub(crate) fn file_status(repo: &git2::Repository) -> Result<FileStatus> {
    if repo.is_bare() {
        return Ok(FileStatus::default());
    }

    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .exclude_submodules(true);

    let statuses = repo.statuses(Some(&mut opts))?;
    let mut files = FileStatus::default();

    for entry in statuses.iter() {
        let Some(path) = entry.path().map(String::from) else {
            continue;
        };
        let status = entry.status();

        if status.is_conflicted() {
            files.conflicted.push(path);
            continue;
        }
        if status.intersects(
            Status::INDEX_NEW
                | Status::INDEX_MODIFIED
                | Status::INDEX_DELETED
                | Status::INDEX_RENAMED
                | Status::INDEX_TYPECHANGE,
        ) {
            files.staged.push(path.clone());
        }
        if status.intersects(
            Status::WT_MODIFIED | Status::WT_DELETED | Status::WT_TYPECHANGE | Status::WT_RENAMED,
        ) {
            files.modified.push(path.clone());
        }
        if status.contains(Status::WT_NEW) {
            files.untracked.push(path);
        }
    }

    Ok(files)
}

/// Short name of the checked-out branch; `None` before the first commit or
/// on a detached HEAD.
pub(crate) fn current_branch_name(repo: &git2::Repository) -> Result<Option<String>> {
    match repo.head() {
        Ok(head) if head.is_branch() => Ok(head.shorthand().map(String::from)),
        Ok(_) => Ok(None),
        Err(e) if matches!(e.code(), git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound) => {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn branch_names(repo: &git2::Repository) -> Result<(Vec<String>, Vec<String>)> {
    let mut local = Vec::new();
    let mut remote = Vec::new();

    for item in repo.branches(None)? {
        let (branch, kind) = item?;
        let Some(name) = branch.name()?.map(String::from) else {
            continue;
        };
        match kind {
            BranchType::Local => local.push(name),
            BranchType::Remote if !name.ends_with("/HEAD") => remote.push(name),
            BranchType::Remote => {}
        }
    }

    Ok((local, remote))
}

fn upstream_status(repo: &git2::Repository) -> Result<Option<UpstreamStatus>> {
    let Some(name) = current_branch_name(repo)? else {
        return Ok(None);
    };
    let branch = repo.find_branch(&name, BranchType::Local)?;
    upstream_of(repo, &branch)
}

/// Tracking information for `branch`, if it has a resolvable upstream.
pub(crate) fn upstream_of(
    repo: &git2::Repository,
    branch: &git2::Branch<'_>,
) -> Result<Option<UpstreamStatus>> {
    let Ok(upstream) = branch.upstream() else {
        return Ok(None);
    };
    let (Some(local), Some(remote)) = (branch.get().target(), upstream.get().target()) else {
        return Ok(None);
    };

    let (ahead, behind) = repo.graph_ahead_behind(local, remote)?;
    Ok(Some(UpstreamStatus {
        name: upstream.name()?.unwrap_or_default().to_string(),
        ahead,
        behind,
    }))
}

fn default_remote_url(repo: &git2::Repository) -> Result<Option<String>> {
    let remotes = repo.remotes()?;
    let name = if remotes.iter().flatten().any(|r| r == "origin") {
        Some("origin")
    } else {
        remotes.iter().flatten().next()
    };

    match name {
        Some(name) => Ok(repo.find_remote(name)?.url().map(String::from)),
        None => Ok(None),
    }
}

fn head_record(repo: &git2::Repository) -> Result<Option<CommitRecord>> {
    head_commit(repo)?
        .map(|commit| CommitRecord::from_commit(repo, &commit))
        .transpose()
}
