//! `HashiCorp` Vault secret fetcher with dual-mode access (HTTP + CLI)

use crate::client::VaultClient;
use crate::response::LogicalResponse;
use crate::{ApiError, VaultConfig, VaultError};
use async_trait::async_trait;
use cfgvault_secrets::{SecretError, SecretFetcher, SecretPath, SecretRecord};
use reqwest::StatusCode;
use std::ffi::OsString;
use std::time::Duration;
use tokio::process::Command;

/// Reads secret records from `HashiCorp` Vault.
///
/// Mode is chosen from the configuration:
/// - A token is available → HTTP mode (`GET /v1/<path>`)
/// - Otherwise → CLI mode (`vault read -format=json <path>`), relying on the
///   CLI's own login state
///
/// Paths are logical paths as Vault sees them, including the mount and, for
/// KV v2, the `data/` segment (e.g. `secret/data/myapp`). KV v2 payloads are
/// unwrapped so the record holds the secret's keys directly.
pub struct VaultFetcher {
    mode: Mode,
}

enum Mode {
    Http(VaultClient),
    Cli { program: OsString, timeout: Duration },
}

impl std::fmt::Debug for VaultFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultFetcher")
            .field("mode", &self.mode_name())
            .finish()
    }
}

impl VaultFetcher {
    /// Create a fetcher for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built from the token.
    pub fn new(config: &VaultConfig) -> Result<Self, VaultError> {
        if config.token().is_some() {
            Ok(Self {
                mode: Mode::Http(VaultClient::new(config)?),
            })
        } else {
            tracing::debug!("No Vault token available, using the vault CLI");
            Ok(Self::cli_with_timeout(config.request_timeout()))
        }
    }

    /// Create a fetcher from `VAULT_ADDR`, the token sources and
    /// `VAULT_NAMESPACE`.
    ///
    /// # Errors
    ///
    /// See [`VaultConfig::from_env`] and [`VaultFetcher::new`].
    pub fn from_env() -> Result<Self, VaultError> {
        Self::new(&VaultConfig::from_env()?)
    }

    /// Create a fetcher that always shells out to `vault`.
    #[must_use]
    pub fn cli() -> Self {
        Self::cli_with_timeout(crate::config::DEFAULT_REQUEST_TIMEOUT)
    }

    fn cli_with_timeout(timeout: Duration) -> Self {
        Self {
            mode: Mode::Cli {
                program: OsString::from("vault"),
                timeout,
            },
        }
    }

    /// Use a different executable in CLI mode.
    ///
    /// Has no effect in HTTP mode.
    #[must_use]
    pub fn with_cli_program(mut self, program: impl Into<OsString>) -> Self {
        if let Mode::Cli { program: current, .. } = &mut self.mode {
            *current = program.into();
        }
        self
    }

    /// `"http"` or `"cli"`
    #[must_use]
    pub const fn mode_name(&self) -> &'static str {
        match self.mode {
            Mode::Http(_) => "http",
            Mode::Cli { .. } => "cli",
        }
    }

    async fn fetch_http(
        client: &VaultClient,
        path: &SecretPath,
    ) -> Result<SecretRecord, SecretError> {
        match client.read(path.normalized()).await {
            Ok(response) => Ok(response.into_record()),
            Err(e) => Err(map_api_error(path, e)),
        }
    }

    async fn fetch_cli(
        program: &OsString,
        timeout: Duration,
        path: &SecretPath,
    ) -> Result<SecretRecord, SecretError> {
        let output = Command::new(program)
            .args(["read", "-format=json", path.normalized()])
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(timeout, output)
            .await
            .map_err(|_| SecretError::fetch(path.clone(), ApiError::CliTimeout(timeout)))?
            .map_err(|e| SecretError::fetch(path.clone(), ApiError::Spawn(e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("No value found at") {
                return Err(SecretError::NotFound { path: path.clone() });
            }
            let code = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            return Err(SecretError::fetch(
                path.clone(),
                ApiError::Cli { code, stderr },
            ));
        }

        let response: LogicalResponse = serde_json::from_slice(&output.stdout)
            .map_err(|e| SecretError::fetch(path.clone(), ApiError::CliOutput(e.into())))?;
        Ok(response.into_record())
    }
}

/// Map a failed HTTP read onto the secret error taxonomy.
fn map_api_error(path: &SecretPath, error: ApiError) -> SecretError {
    match error.status() {
        Some(StatusCode::NOT_FOUND) => SecretError::NotFound { path: path.clone() },
        Some(StatusCode::BAD_REQUEST) => {
            let reason = match &error {
                ApiError::Status { errors, .. } if !errors.is_empty() => errors.join("; "),
                _ => "rejected by Vault".to_string(),
            };
            SecretError::invalid_path(path.as_str(), reason)
        }
        _ => SecretError::fetch(path.clone(), error),
    }
}

#[async_trait]
impl SecretFetcher for VaultFetcher {
    fn backend_name(&self) -> &'static str {
        "vault"
    }

    async fn fetch(&self, path: &SecretPath) -> Result<SecretRecord, SecretError> {
        path.validate()?;

        let record = match &self.mode {
            Mode::Http(client) => Self::fetch_http(client, path).await?,
            Mode::Cli { program, timeout } => Self::fetch_cli(program, *timeout, path).await?,
        };

        tracing::debug!(
            path = %path,
            mode = self.mode_name(),
            keys = record.len(),
            lease_secs = record.lease().map(|l| l.as_secs()),
            "Read secret from Vault"
        );

        Ok(record)
    }
}
