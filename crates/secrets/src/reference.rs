//! Secret references and the `${provider:path:key}` scanner

use crate::{ResolutionRequest, SecretError, SecretPath};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Provider name recognised by [`ReferenceScanner::default`].
pub const DEFAULT_PROVIDER: &str = "vault";

/// Identity of one requested value: a key inside the record at a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretRef {
    /// Path of the record holding the value
    pub path: SecretPath,
    /// Key within the record
    pub key: String,
}

impl SecretRef {
    /// Create a new reference
    #[must_use]
    pub fn new(path: impl Into<SecretPath>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    /// Parse a `path:key` reference.
    ///
    /// The key is everything after the last `:`, so paths may contain colons
    /// but keys may not.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidPath`] if there is no `:` or either side
    /// is empty.
    pub fn parse(reference: &str) -> Result<Self, SecretError> {
        let Some((path, key)) = reference.rsplit_once(':') else {
            return Err(SecretError::invalid_path(
                reference,
                "reference must have the form 'path:key'",
            ));
        };

        if path.is_empty() {
            return Err(SecretError::invalid_path(reference, "reference has an empty path"));
        }
        if key.is_empty() {
            return Err(SecretError::invalid_path(reference, "reference has an empty key"));
        }

        Ok(Self::new(path, key))
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.key)
    }
}

impl FromStr for SecretRef {
    type Err = SecretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Provider stops at the first ':', key starts after the last one.
#[allow(clippy::expect_used)]
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^:}]+):([^}]+):([^:}]+)\}").expect("reference pattern is valid")
});

/// Finds `${provider:path:key}` references in configuration text.
///
/// The scanner only identifies which values need resolution. It does not
/// substitute anything or understand the surrounding file format.
///
/// # Example
///
/// ```
/// use cfgvault_secrets::ReferenceScanner;
///
/// let scanner = ReferenceScanner::default();
/// let refs = scanner.scan("password=${vault:secret/db:password}");
/// assert_eq!(refs.len(), 1);
/// assert_eq!(refs[0].to_string(), "secret/db:password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceScanner {
    provider: String,
}

impl ReferenceScanner {
    /// Create a scanner for references addressed to `provider`.
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }

    /// Provider name this scanner matches
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// All references to this provider in `text`, in order of appearance.
    ///
    /// Duplicates are kept; grouping happens when the references are turned
    /// into a [`ResolutionRequest`].
    #[must_use]
    pub fn scan(&self, text: &str) -> Vec<SecretRef> {
        REFERENCE_PATTERN
            .captures_iter(text)
            .filter(|caps| &caps[1] == self.provider)
            .map(|caps| SecretRef::new(&caps[2], &caps[3]))
            .collect()
    }

    /// Build a request from every reference in `text`.
    #[must_use]
    pub fn request(&self, text: &str) -> ResolutionRequest {
        self.scan(text).into_iter().collect()
    }
}

impl Default for ReferenceScanner {
    fn default() -> Self {
        Self::new(DEFAULT_PROVIDER)
    }
}
