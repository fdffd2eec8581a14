//! Secret store paths

use crate::SecretError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Location of a record in the secret store (e.g. `secret/postgres/local`).
///
/// Paths are opaque to the resolver and only used as grouping keys; each
/// fetcher decides what is syntactically valid for its store, usually via
/// [`validate_path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretPath(String);

impl SecretPath {
    /// Create a new secret path
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The path as given
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path without a single leading `/`.
    ///
    /// `secret/app` and `/secret/app` name the same record.
    #[must_use]
    pub fn normalized(&self) -> &str {
        self.0.strip_prefix('/').unwrap_or(&self.0)
    }

    /// Check the path against the generic syntax rules.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidPath`] describing the first violation.
    pub fn validate(&self) -> Result<(), SecretError> {
        validate_path(&self.0)
    }
}

impl fmt::Display for SecretPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SecretPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for SecretPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl AsRef<str> for SecretPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SecretPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Validate a path against the rules shared by all built-in fetchers.
///
/// A valid path is non-empty, has no surrounding whitespace or control
/// characters, and is made of non-empty `/`-separated segments none of which
/// is `.` or `..`. One leading `/` is allowed.
///
/// # Errors
///
/// Returns [`SecretError::InvalidPath`] describing the first violation.
pub fn validate_path(path: &str) -> Result<(), SecretError> {
    if path.trim().is_empty() {
        return Err(SecretError::invalid_path(path, "path is empty"));
    }

    if path.trim() != path {
        return Err(SecretError::invalid_path(
            path,
            "path has leading or trailing whitespace",
        ));
    }

    if path.chars().any(char::is_control) {
        return Err(SecretError::invalid_path(
            path,
            "path contains control characters",
        ));
    }

    let body = path.strip_prefix('/').unwrap_or(path);
    if body.is_empty() {
        return Err(SecretError::invalid_path(path, "path is empty"));
    }

    for segment in body.split('/') {
        match segment {
            "" => {
                return Err(SecretError::invalid_path(
                    path,
                    "path contains an empty segment",
                ));
            }
            "." | ".." => {
                return Err(SecretError::invalid_path(
                    path,
                    format!("path contains relative segment '{segment}'"),
                ));
            }
            _ => {}
        }
    }

    Ok(())
}
