//! Error types for gitdesk-core.

use gitdesk_git::ErrorKind;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in gitdesk-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Repository operation failed.
    #[error(transparent)]
    Git(#[from] gitdesk_git::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("toml error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// The platform has no per-user configuration directory.
    #[error("no configuration directory available on this platform")]
    NoConfigDir,

    /// A background operation panicked or was aborted.
    #[error("background operation failed: {0}")]
    Worker(String),
}

impl Error {
    /// Repository error kind, if this wraps one.
    #[must_use]
    pub const fn git_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Git(e) => Some(e.kind()),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Worker(err.to_string())
    }
}
