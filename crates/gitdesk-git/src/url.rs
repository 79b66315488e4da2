//! Syntactic validation of remote repository URLs.
//!
//! Runs before any network I/O so that obviously wrong input fails fast.

use crate::error::{Error, Result};

const SCHEMES: &[&str] = &["https", "http", "ssh", "git", "file", "git+ssh", "ssh+git"];

/// Whether `url` looks like something the external tool can clone from.
///
/// Accepted forms:
/// - `scheme://host/path` for the usual transport schemes (`file://` may omit the host)
/// - scp-like `user@host:path`
/// - anything ending in `.git` (local paths to bare repositories)
#[must_use]
pub fn is_valid_remote_url(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() || url.chars().any(char::is_whitespace) {
        return false;
    }

    if let Some((scheme, rest)) = url.split_once("://") {
        return is_scheme_url(scheme, rest);
    }

    is_scp_like(url) || url.ends_with(".git")
}

/// Reject `url` with [`Error::InvalidUrl`] unless it passes [`is_valid_remote_url`].
pub(crate) fn validate_clone_url(url: &str) -> Result<()> {
    if is_valid_remote_url(url) {
        Ok(())
    } else {
        Err(Error::InvalidUrl(url.to_string()))
    }
}

fn is_scheme_url(scheme: &str, rest: &str) -> bool {
    let scheme = scheme.to_ascii_lowercase();
    if !SCHEMES.contains(&scheme.as_str()) || rest.is_empty() {
        return false;
    }

    if scheme == "file" {
        return true;
    }

    let authority = rest.split('/').next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    !host.is_empty() && !host.starts_with(':')
}

fn is_scp_like(url: &str) -> bool {
    let Some((authority, path)) = url.split_once(':') else {
        return false;
    };
    let host = authority.rsplit('@').next().unwrap_or_default();

    // A single letter before the colon is a Windows drive, not a host.
    let plausible_host = host.len() > 1
        && !host.contains(['/', '\\'])
        && (authority.contains('@') || host.contains('.'));

    plausible_host && !path.is_empty()
}
