//! Resolved references with lease information

use crate::{SecretRef, SecureSecret, suggested_refresh_interval};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Values for every reference of a request, plus the shortest lease seen.
///
/// Iteration follows the order of the originating request. Values are zeroed
/// when the result is dropped.
#[derive(Clone, Default)]
pub struct ResolutionResult {
    /// Reference -> secure value, in request order
    values: IndexMap<SecretRef, SecureSecret>,
    /// Minimum lease across the records that reported one
    min_lease: Option<Duration>,
}

impl ResolutionResult {
    pub(crate) fn new(values: IndexMap<SecretRef, SecureSecret>, min_lease: Option<Duration>) -> Self {
        Self { values, min_lease }
    }

    /// Get the value resolved for `key` at `path`.
    #[must_use]
    pub fn get(&self, path: &str, key: &str) -> Option<&SecureSecret> {
        self.values.get(&SecretRef::new(path, key))
    }

    /// Get the value resolved for `reference`.
    #[must_use]
    pub fn get_ref(&self, reference: &SecretRef) -> Option<&SecureSecret> {
        self.values.get(reference)
    }

    /// Check if any references were resolved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of resolved references
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Iterate over references and values in request order.
    pub fn iter(&self) -> impl Iterator<Item = (&SecretRef, &SecureSecret)> {
        self.values.iter()
    }

    /// Shortest lease among the records used, or `None` if no record
    /// reported one.
    #[must_use]
    pub const fn min_lease(&self) -> Option<Duration> {
        self.min_lease
    }

    /// How long the host should wait before resolving again.
    ///
    /// Applies [`suggested_refresh_interval`] to [`min_lease`](Self::min_lease).
    #[must_use]
    pub fn refresh_after(&self) -> Option<Duration> {
        self.min_lease.map(suggested_refresh_interval)
    }

    /// Instant at which the shortest lease ends, counted from `resolved_at`.
    #[must_use]
    pub fn expires_at(&self, resolved_at: Instant) -> Option<Instant> {
        self.min_lease
            .and_then(|lease| resolved_at.checked_add(lease))
    }

    /// Values keyed by reference key, for results that cover a single path.
    ///
    /// When several paths share a key name the later reference wins.
    #[must_use]
    pub fn into_key_map(self) -> HashMap<String, SecureSecret> {
        self.values
            .into_iter()
            .map(|(reference, value)| (reference.key, value))
            .collect()
    }
}

impl IntoIterator for ResolutionResult {
    type Item = (SecretRef, SecureSecret);
    type IntoIter = indexmap::map::IntoIter<SecretRef, SecureSecret>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl std::fmt::Debug for ResolutionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionResult")
            .field("count", &self.values.len())
            .field(
                "refs",
                &self.values.keys().map(ToString::to_string).collect::<Vec<_>>(),
            )
            .field("min_lease", &self.min_lease)
            .finish()
    }
}
