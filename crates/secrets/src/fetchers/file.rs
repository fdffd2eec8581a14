//! JSON file secret fetcher

use crate::{DecodeFailure, SecretError, SecretFetcher, SecretPath, SecretRecord, SecureSecret};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One record in a secrets file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileEntry {
    data: HashMap<String, serde_json::Value>,
    #[serde(default)]
    lease_seconds: Option<u64>,
}

/// Reads records from a JSON document on disk.
///
/// The document maps paths to entries:
///
/// ```json
/// {
///   "secret/postgres/local": {
///     "data": { "username": "app", "password": "s3cr3t" },
///     "lease_seconds": 300
///   }
/// }
/// ```
///
/// The file is read on every fetch, so edits are picked up by the next
/// resolve. Non-string values are returned as compact JSON text.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    file: PathBuf,
}

impl FileFetcher {
    /// Create a fetcher reading from `file`
    #[must_use]
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    /// The secrets file
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    async fn load(&self, path: &SecretPath) -> Result<HashMap<String, FileEntry>, SecretError> {
        let contents = tokio::fs::read_to_string(&self.file).await.map_err(|e| {
            SecretError::fetch(
                path.clone(),
                format!("Failed to read secrets file '{}': {e}", self.file.display()),
            )
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            SecretError::fetch(
                path.clone(),
                format!(
                    "Secrets file '{}' is not valid: {}",
                    self.file.display(),
                    DecodeFailure::from(e)
                ),
            )
        })
    }
}

#[async_trait]
impl SecretFetcher for FileFetcher {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn fetch(&self, path: &SecretPath) -> Result<SecretRecord, SecretError> {
        path.validate()?;

        let mut document = self.load(path).await?;
        let entry = document
            .remove(path.normalized())
            .or_else(|| document.remove(&format!("/{}", path.normalized())))
            .ok_or_else(|| SecretError::NotFound { path: path.clone() })?;

        let data = entry
            .data
            .into_iter()
            .map(|(key, value)| (key, SecureSecret::from_json_value(value)))
            .collect();

        tracing::debug!(
            file = %self.file.display(),
            path = %path,
            "Read secret record from file"
        );

        Ok(SecretRecord::new(
            data,
            entry.lease_seconds.map(Duration::from_secs),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn secrets_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const DOCUMENT: &str = r#"{
        "secret/postgres/local": {
            "data": { "username": "app", "password": "s3cr3t", "port": 5432 },
            "lease_seconds": 300
        },
        "/secret/static": {
            "data": { "token": "t" }
        },
        "secret/expired": {
            "data": { "token": "t" },
            "lease_seconds": 0
        }
    }"#;

    #[tokio::test]
    async fn test_fetch_record_with_lease() {
        let file = secrets_file(DOCUMENT);
        let fetcher = FileFetcher::new(file.path());

        let record = fetcher
            .fetch(&SecretPath::new("secret/postgres/local"))
            .await
            .unwrap();
        assert_eq!(record.len(), 3);
        assert_eq!(record.get("port").map(SecureSecret::expose), Some("5432"));
        assert_eq!(record.lease(), Some(Duration::from_secs(300)));
    }

    #[tokio::test]
    async fn test_fetch_record_without_lease() {
        let file = secrets_file(DOCUMENT);
        let fetcher = FileFetcher::new(file.path());

        let record = fetcher.fetch(&SecretPath::new("secret/static")).await.unwrap();
        assert_eq!(record.lease(), None);
    }

    #[tokio::test]
    async fn test_zero_lease_is_kept() {
        let file = secrets_file(DOCUMENT);
        let fetcher = FileFetcher::new(file.path());

        let record = fetcher.fetch(&SecretPath::new("secret/expired")).await.unwrap();
        assert_eq!(record.lease(), Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let file = secrets_file(DOCUMENT);
        let fetcher = FileFetcher::new(file.path());

        let result = fetcher.fetch(&SecretPath::new("secret/missing")).await;
        assert!(matches!(result, Err(SecretError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FileFetcher::new(dir.path().join("absent.json"));

        let result = fetcher.fetch(&SecretPath::new("secret/app")).await;
        assert!(matches!(result, Err(SecretError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_malformed_file_does_not_echo_contents() {
        let file = secrets_file(r#"{"secret/app": {"data": {"token": "leaky-value"}, "ttl": 5}}"#);
        let fetcher = FileFetcher::new(file.path());

        let err = fetcher
            .fetch(&SecretPath::new("secret/app"))
            .await
            .unwrap_err();
        assert!(matches!(err, SecretError::Fetch { .. }));
        assert!(!err.to_string().contains("leaky-value"));
    }

    #[tokio::test]
    async fn test_misplaced_value_is_not_echoed() {
        for contents in [
            r#"{"secret/app": {"data": "leaky-value"}}"#,
            r#"{"secret/app": {"data": {}, "lease_seconds": "leaky-value"}}"#,
            r#"{"secret/app": "leaky-value"}"#,
        ] {
            let file = secrets_file(contents);
            let fetcher = FileFetcher::new(file.path());

            let err = fetcher
                .fetch(&SecretPath::new("secret/app"))
                .await
                .unwrap_err();
            let message = err.to_string();
            assert!(matches!(err, SecretError::Fetch { .. }));
            assert!(message.contains("line 1"), "{message}");
            assert!(!message.contains("leaky-value"), "{message}");
        }
    }

    #[tokio::test]
    async fn test_invalid_path_checked_before_reading() {
        let fetcher = FileFetcher::new("/nonexistent/secrets.json");
        let result = fetcher.fetch(&SecretPath::new("secret//app")).await;
        assert!(matches!(result, Err(SecretError::InvalidPath { .. })));
    }
}
