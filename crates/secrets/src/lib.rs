//! Secret reference resolution for cfgvault
//!
//! Resolves `(path, key)` references against a secret store and reports the
//! shortest lease among the records that were read, so a configuration host
//! knows when to resolve again.
//!
//! The crate is built around two pieces:
//!
//! - [`SecretFetcher`]: reads the full key/value record stored at one path.
//! - [`ConfigResolver`]: groups a [`ResolutionRequest`] by path, fetches each
//!   distinct path once, and assembles a [`ResolutionResult`].
//!
//! # Example
//!
//! ```ignore
//! use cfgvault_secrets::{ConfigResolver, ResolutionRequest};
//!
//! let resolver = ConfigResolver::new(fetcher);
//! let request = ResolutionRequest::new()
//!     .with("secret/postgres/local", "username")
//!     .with("secret/postgres/local", "password");
//!
//! let result = resolver.resolve(&request).await?;
//! let password = result.get("secret/postgres/local", "password");
//! if let Some(ttl) = result.refresh_after() {
//!     // schedule the next resolve
//! }
//! // Values are zeroed when `result` goes out of scope
//! ```

mod decode;
pub mod fetchers;
mod lease;
mod path;
mod provider;
mod reference;
mod request;
mod resolved;
mod resolver;
mod types;

pub use decode::DecodeFailure;
pub use lease::{MIN_REFRESH_MARGIN, suggested_refresh_interval};
pub use path::{SecretPath, validate_path};
pub use provider::{ConfigData, SecretConfigProvider};
pub use reference::{DEFAULT_PROVIDER, ReferenceScanner, SecretRef};
pub use request::ResolutionRequest;
pub use resolved::ResolutionResult;
pub use resolver::{ConfigResolver, ResolverConfig, resolve};
pub use types::{SecretRecord, SecureSecret};

// Built-in fetchers (no network access)
pub use fetchers::{FileFetcher, MemoryFetcher};

// Backend implementations are in separate crates:
// - cfgvault-vault: VaultFetcher, VaultConfig, TokenRenewer

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Boxed underlying cause of a backend failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for secret resolution
///
/// Messages carry the offending path and key, never secret values.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Path is malformed for the backing store
    #[error("Invalid secret path '{path}': {reason}")]
    InvalidPath {
        /// The path as it was given
        path: String,
        /// Why the path was rejected
        reason: String,
    },

    /// Path is well-formed but nothing is stored there
    #[error("No secret found at path '{path}'")]
    NotFound {
        /// Path that was read
        path: SecretPath,
    },

    /// Path exists but does not hold a requested key
    #[error("Key '{key}' not found in secret at path '{path}'")]
    MissingKey {
        /// Path that was read
        path: SecretPath,
        /// Requested key that was absent from the record
        key: String,
    },

    /// Backend failure (network, authentication, timeout)
    #[error("Failed to fetch secret at path '{path}': {source}")]
    Fetch {
        /// Path that was being read
        path: SecretPath,
        /// Underlying cause reported by the backend client
        #[source]
        source: BoxError,
    },

    /// Resolution was cancelled by the caller
    #[error("Secret resolution was cancelled")]
    Cancelled,

    /// Resolution did not finish before the configured deadline
    #[error("Secret resolution did not complete within {}ms", timeout.as_millis())]
    DeadlineExceeded {
        /// The deadline that elapsed
        timeout: Duration,
    },
}

impl SecretError {
    /// Create an invalid path error
    #[must_use]
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a fetch error for a path with the given cause
    #[must_use]
    pub fn fetch(path: SecretPath, source: impl Into<BoxError>) -> Self {
        Self::Fetch {
            path,
            source: source.into(),
        }
    }

    /// Whether the host may reasonably retry the same call later.
    ///
    /// Only backend failures and elapsed deadlines are transient; every other
    /// variant points at a configuration or provisioning problem.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::DeadlineExceeded { .. })
    }

    /// Whether the call was aborted rather than failed by the backend.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded { .. })
    }

    /// The path this error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::InvalidPath { path, .. } => Some(path),
            Self::NotFound { path } | Self::MissingKey { path, .. } | Self::Fetch { path, .. } => {
                Some(path.as_str())
            }
            Self::Cancelled | Self::DeadlineExceeded { .. } => None,
        }
    }
}

/// Reads secret records from a backing store.
///
/// Implementors return every key stored at the path together with the lease
/// reported for the read. A fetcher must not cache, retry, or mutate shared
/// state: the resolver relies on each call being an independent read.
#[async_trait]
pub trait SecretFetcher: Send + Sync {
    /// Fetch the full record stored at `path`.
    ///
    /// # Errors
    ///
    /// - [`SecretError::InvalidPath`] if the path is malformed
    /// - [`SecretError::NotFound`] if nothing is stored at the path
    /// - [`SecretError::Fetch`] if the backend could not be reached
    async fn fetch(&self, path: &SecretPath) -> Result<SecretRecord, SecretError>;

    /// Backend identifier used in logs.
    ///
    /// Examples: `"vault"`, `"memory"`, `"file"`
    fn backend_name(&self) -> &'static str;
}

#[async_trait]
impl<T: SecretFetcher + ?Sized> SecretFetcher for Arc<T> {
    async fn fetch(&self, path: &SecretPath) -> Result<SecretRecord, SecretError> {
        (**self).fetch(path).await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
