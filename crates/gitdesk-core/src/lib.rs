//! # gitdesk-core
//!
//! Application-level pieces around the repository facade: persistent
//! [`Config`] and the [`Session`] worker that runs facade calls off the
//! caller's thread, one at a time, with cancellable network operations.

pub mod config;
pub mod error;
pub mod session;

pub use config::Config;
pub use error::{Error, Result};
pub use session::{Operation, Session};
