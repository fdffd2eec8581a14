//! Secure secret types with automatic memory zeroing
//!
//! This module provides types for handling secrets securely in memory:
//! - [`SecureSecret`]: A wrapper around `secrecy::SecretString` that auto-zeros on drop
//! - [`SecretRecord`]: Every key stored at one path, plus the lease of the read

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::time::Duration;

/// A resolved secret value with automatic memory zeroing on drop.
///
/// This type wraps `secrecy::SecretString` to ensure:
/// - Secret values are zeroed from memory when dropped
/// - Debug and Display output show `[REDACTED]` instead of the actual value
/// - Explicit `.expose()` call required to access the value
#[derive(Clone)]
pub struct SecureSecret {
    inner: SecretString,
}

impl SecureSecret {
    /// Create a new secure secret from a string.
    ///
    /// The string value is moved into secure storage and will be
    /// automatically zeroed when this `SecureSecret` is dropped.
    #[must_use]
    pub fn new(value: String) -> Self {
        Self {
            inner: SecretString::from(value),
        }
    }

    /// Create a secret from a JSON value read from a secret store.
    ///
    /// Strings are taken verbatim; any other value is kept as compact JSON
    /// text so structured entries survive the trip through a string-valued
    /// configuration.
    #[must_use]
    pub fn from_json_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::new(s),
            other => Self::new(other.to_string()),
        }
    }

    /// Expose the secret value for use.
    ///
    /// # Safety Note
    ///
    /// The caller must ensure the exposed value is:
    /// - Not logged or printed
    /// - Not persisted to disk
    /// - Used only for the immediate operation (e.g., handing it to the host)
    #[must_use]
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Get the length of the secret value without exposing it.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    /// Check if the secret value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }
}

impl From<String> for SecureSecret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureSecret {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl std::fmt::Debug for SecureSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl std::fmt::Display for SecureSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Everything stored at one secret path.
///
/// `lease` is the validity reported by the store for this read. `None` means
/// the store gave no expiry information; `Some(Duration::ZERO)` means the
/// record is already stale and should be read again immediately.
#[derive(Clone, Default)]
pub struct SecretRecord {
    /// Key -> secure value
    data: HashMap<String, SecureSecret>,
    /// Lease reported for the read
    lease: Option<Duration>,
}

impl SecretRecord {
    /// Create a record from a key/value map and optional lease.
    #[must_use]
    pub fn new(data: HashMap<String, SecureSecret>, lease: Option<Duration>) -> Self {
        Self { data, lease }
    }

    /// Create a record from plain key/value pairs.
    ///
    /// # Example
    ///
    /// ```
    /// use cfgvault_secrets::SecretRecord;
    /// use std::time::Duration;
    ///
    /// let record = SecretRecord::from_pairs(
    ///     [("user", "u"), ("pass", "p")],
    ///     Some(Duration::from_secs(300)),
    /// );
    /// assert_eq!(record.len(), 2);
    /// ```
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I, lease: Option<Duration>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let data = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), SecureSecret::new(v.into())))
            .collect();
        Self { data, lease }
    }

    /// Replace the lease of this record.
    #[must_use]
    pub fn with_lease(mut self, lease: Option<Duration>) -> Self {
        self.lease = lease;
        self
    }

    /// Insert a value, returning the previous one for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: SecureSecret) -> Option<SecureSecret> {
        self.data.insert(key.into(), value)
    }

    /// Get the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SecureSecret> {
        self.data.get(key)
    }

    /// Check if the record holds `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Iterate over the keys of the record.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Number of keys in the record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the record is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Lease reported for the read, if any.
    #[must_use]
    pub const fn lease(&self) -> Option<Duration> {
        self.lease
    }

    /// Consume the record, returning the key/value map.
    #[must_use]
    pub fn into_data(self) -> HashMap<String, SecureSecret> {
        self.data
    }
}

impl std::fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.data.keys().collect();
        keys.sort();
        f.debug_struct("SecretRecord")
            .field("keys", &keys)
            .field("lease", &self.lease)
            .finish()
    }
}
