//! In-memory secret fetcher

use crate::{SecretError, SecretFetcher, SecretPath, SecretRecord};
use async_trait::async_trait;
use std::collections::HashMap;

/// Serves records held in memory.
///
/// Useful for static configuration and for exercising a host without a
/// running secret store. Paths are matched after [`SecretPath::normalized`],
/// so `secret/app` and `/secret/app` address the same record.
///
/// # Example
///
/// ```
/// use cfgvault_secrets::{MemoryFetcher, SecretRecord};
///
/// let fetcher = MemoryFetcher::new()
///     .with_record("secret/app", SecretRecord::from_pairs([("token", "t")], None));
/// assert!(fetcher.contains("/secret/app"));
/// ```
#[derive(Clone, Default)]
pub struct MemoryFetcher {
    records: HashMap<String, SecretRecord>,
}

impl MemoryFetcher {
    /// Create an empty fetcher
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, builder style.
    #[must_use]
    pub fn with_record(mut self, path: impl Into<SecretPath>, record: SecretRecord) -> Self {
        self.insert(path, record);
        self
    }

    /// Store a record at `path`
    ///
    /// If a record already exists at the path, it is replaced and returned.
    pub fn insert(
        &mut self,
        path: impl Into<SecretPath>,
        record: SecretRecord,
    ) -> Option<SecretRecord> {
        let path = path.into();
        self.records.insert(path.normalized().to_string(), record)
    }

    /// Remove the record at `path`
    pub fn remove(&mut self, path: &str) -> Option<SecretRecord> {
        self.records.remove(SecretPath::new(path).normalized())
    }

    /// Check if a record is stored at `path`
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.records.contains_key(SecretPath::new(path).normalized())
    }

    /// Get all stored paths, sorted
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<_> = self.records.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

#[async_trait]
impl SecretFetcher for MemoryFetcher {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn fetch(&self, path: &SecretPath) -> Result<SecretRecord, SecretError> {
        path.validate()?;
        self.records
            .get(path.normalized())
            .cloned()
            .ok_or_else(|| SecretError::NotFound { path: path.clone() })
    }
}

impl std::fmt::Debug for MemoryFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryFetcher")
            .field("paths", &self.paths())
            .finish()
    }
}
