//! # gitdesk-git
//!
//! Repository state and command layer for gitdesk, built on git2-rs.
//!
//! A [`RepositoryHandle`] binds to one on-disk repository. The [`Facade`]
//! on top of it is the single entry point for staging, committing,
//! branching, tagging, remotes and network operations, and produces
//! [`StatusSnapshot`]s for display. Local operations go through libgit2;
//! clone, fetch, pull and push run the external `git` executable so that
//! the user's credentials and transports apply.
//!
//! Every failure is an [`Error`] with a [`ErrorKind`] to branch on.

mod branch;
mod branch_name;
mod cancel;
mod commit;
mod error;
mod facade;
mod handle;
mod history;
mod index;
mod merge;
mod network;
mod remote;
mod status;
mod tag;
mod tool;
mod types;
mod url;

#[cfg(test)]
mod test_support;

pub use branch_name::{validate_tag_name, BranchName};
pub use cancel::CancelToken;
pub use error::{Error, ErrorKind, Result};
pub use facade::Facade;
pub use handle::RepositoryHandle;
pub use history::CommitHistory;
pub use tool::GitTool;
pub use types::{
    BranchRef, CheckoutMode, CommitRecord, Identity, RemoteRef, StatusSnapshot, TagRef,
    UpstreamStatus,
};
pub use url::is_valid_remote_url;
