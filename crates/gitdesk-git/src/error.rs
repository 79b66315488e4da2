//! Error types for gitdesk-git.
//!
//! Every failure that leaves this crate is one of the [`Error`] variants.
//! Callers branch on [`Error::kind`]; the `Display` text is for humans.

use std::path::PathBuf;

use serde::Serialize;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Fieldless classification of an [`Error`], suitable for `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotBound,
    NotARepository,
    InitError,
    InvalidUrl,
    TargetNotEmpty,
    EmptyMessage,
    NothingStaged,
    MissingIdentity,
    InvalidBranchName,
    BranchExists,
    CannotDeleteCurrent,
    DirtyWorkingTree,
    MergeConflict,
    Rejected,
    NetworkError,
    AuthError,
    Inconsistent,
    ToolUnavailable,
    Unknown,
    NoCommits,
    DetachedHead,
    BareRepository,
    BranchNotFound,
    RemoteNotFound,
    RemoteExists,
    InvalidRemoteName,
    TagExists,
    TagNotFound,
    InvalidTagName,
    RevisionNotFound,
    PathNotFound,
    Cancelled,
}

/// Errors that can occur while operating on a repository.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No repository is bound to the handle.
    #[error("no repository is open")]
    NotBound,

    /// The path does not hold a repository.
    #[error("not a git repository: {}", .path.display())]
    NotARepository { path: PathBuf },

    /// Repository initialization failed.
    #[error("failed to initialize repository: {reason}")]
    InitError { reason: String },

    /// URL rejected before any network access.
    #[error("invalid repository URL: '{0}'")]
    InvalidUrl(String),

    /// Clone target exists and has content.
    #[error("target directory is not empty: {}", .0.display())]
    TargetNotEmpty(PathBuf),

    /// Commit message is blank.
    #[error("commit message is empty")]
    EmptyMessage,

    /// Index matches the last commit.
    #[error("nothing staged for commit")]
    NothingStaged,

    /// No author identity supplied or configured.
    #[error("author identity unknown - set user.name and user.email")]
    MissingIdentity,

    /// Branch name fails validation.
    #[error("invalid branch name '{name}': {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// Branch already exists.
    #[error("branch already exists: {0}")]
    BranchExists(String),

    /// Refusing to delete the checked-out branch.
    #[error("cannot delete the checked-out branch '{0}'")]
    CannotDeleteCurrent(String),

    /// Uncommitted changes would be affected.
    #[error("working tree has uncommitted changes: {}", .paths.join(", "))]
    DirtyWorkingTree { paths: Vec<String> },

    /// Merge stopped on conflicts; the index is left conflicted.
    #[error("merge conflict in: {}", .paths.join(", "))]
    MergeConflict { paths: Vec<String> },

    /// Remote refused the update (it has diverged).
    #[error("push rejected by remote - fetch or pull first: {0}")]
    Rejected(String),

    /// Transport failure talking to a remote.
    #[error("network error: {0}")]
    NetworkError(String),

    /// Remote refused our credentials.
    #[error("authentication failed: {0}")]
    AuthError(String),

    /// A cancelled operation left the repository in an unverified state.
    #[error("repository may be inconsistent: {0}")]
    Inconsistent(String),

    /// The external git executable could not be found or started.
    #[error("git executable not available: {0}")]
    ToolUnavailable(String),

    /// Unclassified failure, raw message kept for diagnostics.
    #[error("git error: {0}")]
    Unknown(String),

    /// The repository has no commits yet.
    #[error("repository has no commits yet")]
    NoCommits,

    /// HEAD is detached (not on a branch).
    #[error("HEAD is detached - checkout a branch first")]
    DetachedHead,

    /// Operation needs a working tree.
    #[error("operation not supported in a bare repository")]
    BareRepository,

    /// Branch not found.
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// Remote not found.
    #[error("remote not found: {0}")]
    RemoteNotFound(String),

    /// Remote already exists.
    #[error("remote already exists: {0}")]
    RemoteExists(String),

    /// Remote name fails validation.
    #[error("invalid remote name: '{0}'")]
    InvalidRemoteName(String),

    /// Tag already exists.
    #[error("tag already exists: {0}")]
    TagExists(String),

    /// Tag not found.
    #[error("tag not found: {0}")]
    TagNotFound(String),

    /// Tag name fails validation.
    #[error("invalid tag name '{name}': {reason}")]
    InvalidTagName { name: String, reason: String },

    /// Revision does not resolve to a commit.
    #[error("revision not found: {0}")]
    RevisionNotFound(String),

    /// Path is neither on disk nor in the index.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// Caller cancelled the operation; the repository was verified intact.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Classification used for control flow.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotBound => ErrorKind::NotBound,
            Self::NotARepository { .. } => ErrorKind::NotARepository,
            Self::InitError { .. } => ErrorKind::InitError,
            Self::InvalidUrl(_) => ErrorKind::InvalidUrl,
            Self::TargetNotEmpty(_) => ErrorKind::TargetNotEmpty,
            Self::EmptyMessage => ErrorKind::EmptyMessage,
            Self::NothingStaged => ErrorKind::NothingStaged,
            Self::MissingIdentity => ErrorKind::MissingIdentity,
            Self::InvalidBranchName { .. } => ErrorKind::InvalidBranchName,
            Self::BranchExists(_) => ErrorKind::BranchExists,
            Self::CannotDeleteCurrent(_) => ErrorKind::CannotDeleteCurrent,
            Self::DirtyWorkingTree { .. } => ErrorKind::DirtyWorkingTree,
            Self::MergeConflict { .. } => ErrorKind::MergeConflict,
            Self::Rejected(_) => ErrorKind::Rejected,
            Self::NetworkError(_) => ErrorKind::NetworkError,
            Self::AuthError(_) => ErrorKind::AuthError,
            Self::Inconsistent(_) => ErrorKind::Inconsistent,
            Self::ToolUnavailable(_) => ErrorKind::ToolUnavailable,
            Self::Unknown(_) => ErrorKind::Unknown,
            Self::NoCommits => ErrorKind::NoCommits,
            Self::DetachedHead => ErrorKind::DetachedHead,
            Self::BareRepository => ErrorKind::BareRepository,
            Self::BranchNotFound(_) => ErrorKind::BranchNotFound,
            Self::RemoteNotFound(_) => ErrorKind::RemoteNotFound,
            Self::RemoteExists(_) => ErrorKind::RemoteExists,
            Self::InvalidRemoteName(_) => ErrorKind::InvalidRemoteName,
            Self::TagExists(_) => ErrorKind::TagExists,
            Self::TagNotFound(_) => ErrorKind::TagNotFound,
            Self::InvalidTagName { .. } => ErrorKind::InvalidTagName,
            Self::RevisionNotFound(_) => ErrorKind::RevisionNotFound,
            Self::PathNotFound(_) => ErrorKind::PathNotFound,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Whether repeating the same call later may succeed.
    ///
    /// Only transport failures qualify; the facade never retries on its own.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkError(_))
    }
}

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        use git2::{ErrorClass, ErrorCode};

        let message = err.message().to_string();
        match err.code() {
            ErrorCode::Auth | ErrorCode::Certificate => Self::AuthError(message),
            ErrorCode::BareRepo => Self::BareRepository,
            ErrorCode::UnbornBranch => Self::NoCommits,
            ErrorCode::Unmerged | ErrorCode::MergeConflict => {
                Self::MergeConflict { paths: Vec::new() }
            }
            _ => match err.class() {
                ErrorClass::Net | ErrorClass::Ssh | ErrorClass::Http | ErrorClass::Ssl => {
                    Self::NetworkError(message)
                }
                _ => Self::Unknown(message),
            },
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Unknown(err.to_string())
    }
}
