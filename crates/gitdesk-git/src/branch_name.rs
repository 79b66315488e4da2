//! Reference name validation.
//!
//! Branch and tag names share git's reference-name rules. [`BranchName`]
//! is the validated newtype the facade passes around for branches.

use std::fmt;

use crate::error::Error;

/// A validated git branch name.
///
/// # Examples
///
/// ```
/// use gitdesk_git::BranchName;
///
/// assert!(BranchName::new("feature/x").is_ok());
/// assert!(BranchName::new("a b").is_err());
/// assert!(BranchName::new("a..b").is_err());
/// assert!(BranchName::new("trailing/").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBranchName`] if the name violates git's
    /// reference naming rules.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        match check_ref_name(&name) {
            Ok(()) => Ok(Self(name)),
            Err(reason) => Err(Error::InvalidBranchName { name, reason }),
        }
    }

    /// Get the branch name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full reference name, e.g. `refs/heads/main`.
    #[must_use]
    pub fn refname(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for BranchName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for BranchName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for BranchName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Validate a tag name with the same rules as branch names.
///
/// # Errors
///
/// Returns [`Error::InvalidTagName`] describing the first violation.
pub fn validate_tag_name(name: &str) -> Result<(), Error> {
    check_ref_name(name).map_err(|reason| Error::InvalidTagName {
        name: name.to_string(),
        reason,
    })
}

/// Check a short reference name, returning the reason it is rejected.
fn check_ref_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".into());
    }

    if name == "@" {
        return Err("name cannot be '@'".into());
    }

    if name.starts_with('-') {
        return Err("name cannot start with '-'".into());
    }

    if name.starts_with('.') || name.ends_with('.') {
        return Err("name cannot start or end with '.'".into());
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err("name cannot start or end with '/'".into());
    }

    // git's rule is case-sensitive
    #[allow(clippy::case_sensitive_file_extension_comparisons)]
    if name.ends_with(".lock") {
        return Err("name cannot end with '.lock'".into());
    }

    for c in name.chars() {
        if c.is_whitespace() {
            return Err("name cannot contain whitespace".into());
        }
        if c.is_control() {
            return Err("name cannot contain control characters".into());
        }
        if matches!(c, '~' | '^' | ':' | '?' | '*' | '[' | '\\') {
            return Err(format!("name cannot contain '{c}'"));
        }
    }

    for (pattern, reason) in [
        ("..", "name cannot contain '..'"),
        ("//", "name cannot contain '//'"),
        ("@{", "name cannot contain '@{'"),
        ("/.", "name component cannot start with '.'"),
    ] {
        if name.contains(pattern) {
            return Err(reason.into());
        }
    }

    Ok(())
}
