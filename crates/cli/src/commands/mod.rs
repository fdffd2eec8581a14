//! Command implementations
//!
//! Each command returns the text to print on stdout; `main` owns printing
//! and exit codes.

pub mod resolve;
pub mod scan;
pub mod version;

use crate::cli::{Backend, Cli, CliError, Commands};
use cfgvault_secrets::{
    ConfigResolver, FileFetcher, ResolutionRequest, ResolutionResult, ResolverConfig,
    SecretFetcher,
};
use cfgvault_vault::VaultFetcher;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Placeholder printed instead of secret values
pub const REDACTED: &str = "[REDACTED]";

/// Run the parsed command line.
///
/// # Errors
///
/// Returns a [`CliError`] describing why the command failed.
pub async fn execute(cli: &Cli) -> Result<String, CliError> {
    match &cli.command {
        Commands::Version => Ok(version::get_version_info(cli.json)),
        Commands::Resolve { refs, reveal } => resolve::execute(cli, refs, *reveal).await,
        Commands::Scan {
            file,
            provider,
            list_only,
            reveal,
        } => scan::execute(cli, file, provider, *list_only, *reveal).await,
    }
}

/// Create the fetcher selected on the command line.
///
/// # Errors
///
/// Returns a configuration error if the file backend has no file or the
/// Vault settings are unusable.
pub fn build_fetcher(
    backend: Backend,
    secrets_file: Option<&Path>,
) -> Result<Arc<dyn SecretFetcher>, CliError> {
    match backend {
        Backend::File => {
            let file = secrets_file.ok_or_else(|| {
                CliError::config_with_help(
                    "The file backend needs a secrets file",
                    "Pass --secrets-file or set CFGVAULT_SECRETS_FILE",
                )
            })?;
            tracing::debug!(file = %file.display(), "Using file backend");
            Ok(Arc::new(FileFetcher::new(file)))
        }
        Backend::Vault => {
            let fetcher = VaultFetcher::from_env()?;
            tracing::debug!(mode = fetcher.mode_name(), "Using Vault backend");
            Ok(Arc::new(fetcher))
        }
    }
}

/// Resolve `request` with the backend and deadline from the command line.
///
/// Ctrl-C cancels the resolution.
pub(crate) async fn resolve_request(
    cli: &Cli,
    request: &ResolutionRequest,
) -> Result<ResolutionResult, CliError> {
    let fetcher = build_fetcher(cli.backend, cli.secrets_file.as_deref())?;

    let mut config = ResolverConfig::new();
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    let resolver = ConfigResolver::with_config(fetcher, config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let result = resolver.resolve_with_cancel(request, &cancel).await;
    signal.abort();
    Ok(result?)
}

/// One resolved reference in command output
#[derive(Debug, Serialize)]
pub struct ResolvedValue {
    /// Secret path
    pub path: String,
    /// Key within the record
    pub key: String,
    /// The value, or [`REDACTED`]
    pub value: String,
}

/// Output of a resolution
#[derive(Debug, Serialize)]
pub struct ResolveReport {
    /// Resolved references in request order
    pub values: Vec<ResolvedValue>,
    /// Shortest lease among the records read, in seconds
    pub min_lease_secs: Option<u64>,
    /// Suggested wait before resolving again, in seconds
    pub refresh_after_secs: Option<u64>,
}

impl ResolveReport {
    /// Build a report, exposing values only when `reveal` is set.
    #[must_use]
    pub fn new(result: &ResolutionResult, reveal: bool) -> Self {
        let values = result
            .iter()
            .map(|(reference, value)| ResolvedValue {
                path: reference.path.to_string(),
                key: reference.key.clone(),
                value: if reveal {
                    value.expose().to_string()
                } else {
                    REDACTED.to_string()
                },
            })
            .collect();

        Self {
            values,
            min_lease_secs: result.min_lease().map(|l| l.as_secs()),
            refresh_after_secs: result.refresh_after().map(|l| l.as_secs()),
        }
    }

    /// Render as text, or as a JSON envelope when `json` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn render(&self, json: bool) -> Result<String, CliError> {
        if json {
            return render_json(self);
        }

        let mut lines: Vec<String> = self
            .values
            .iter()
            .map(|v| format!("{}:{}={}", v.path, v.key, v.value))
            .collect();

        lines.push(match (self.min_lease_secs, self.refresh_after_secs) {
            (Some(lease), Some(refresh)) => {
                format!("# min lease: {lease}s, refresh after: {refresh}s")
            }
            _ => "# no lease reported".to_string(),
        });
        Ok(lines.join("\n"))
    }
}

/// Wrap `data` in an `OkEnvelope` and serialize it.
pub(crate) fn render_json<T: Serialize>(data: &T) -> Result<String, CliError> {
    serde_json::to_string(&crate::cli::OkEnvelope::new(data))
        .map_err(|e| CliError::other(format!("Failed to serialize output: {e}")))
}
