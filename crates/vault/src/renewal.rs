//! Background renewal of the Vault token
//!
//! A [`TokenRenewer`] looks the token up once when started. Renewable tokens
//! are renewed before they expire, at the interval given by
//! [`suggested_refresh_interval`]; failed renewals are retried after a short
//! delay until the renewer is shut down.

use crate::client::VaultClient;
use crate::{ApiError, VaultConfig, VaultError};
use cfgvault_secrets::suggested_refresh_interval;
use reqwest::StatusCode;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Delay before retrying a failed renewal
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Shortest wait between two renewals
const MIN_RENEW_INTERVAL: Duration = Duration::from_secs(1);

/// Keeps the configured Vault token alive.
#[derive(Debug)]
pub struct TokenRenewer {
    client: VaultClient,
    retry_delay: Duration,
}

impl TokenRenewer {
    /// Create a renewer for the token in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::MissingToken`] if `config` holds no token, or an
    /// error building the HTTP client.
    pub fn new(config: &VaultConfig) -> Result<Self, VaultError> {
        Ok(Self {
            client: VaultClient::new(config)?,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Override the delay before retrying a failed renewal.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Validate the token and start renewing it in the background.
    ///
    /// Returns `Ok(None)` when the token is not renewable; nothing is
    /// scheduled in that case.
    ///
    /// # Errors
    ///
    /// - [`VaultError::InvalidToken`] if Vault rejects the token (403)
    /// - [`VaultError::TokenLookup`] if the lookup fails for another reason
    pub async fn start(self) -> Result<Option<RenewalHandle>, VaultError> {
        let info = self.client.lookup_self().await.map_err(|source| {
            if source.status() == Some(StatusCode::FORBIDDEN) {
                VaultError::InvalidToken { source }
            } else {
                VaultError::TokenLookup { source }
            }
        })?;

        if !info.renewable {
            tracing::warn!("Vault token is not renewable");
            return Ok(None);
        }

        let first = next_interval(Duration::from_secs(info.ttl));
        tracing::info!(
            ttl_secs = info.ttl,
            renew_in_secs = first.as_secs(),
            "Scheduling Vault token renewal"
        );

        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(first, cancel.clone()));

        Ok(Some(RenewalHandle {
            cancel,
            task: Some(task),
        }))
    }

    async fn run(self, first: Duration, cancel: CancellationToken) {
        let mut wait = first;
        loop {
            let renewed = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                renewed = async {
                    tokio::time::sleep(wait).await;
                    self.renew_once().await
                } => renewed,
            };

            wait = match renewed {
                Ok(lease) => next_interval(lease),
                Err(e) => {
                    tracing::error!(error = %e, "Could not renew the Vault token");
                    tracing::warn!(
                        retry_in_secs = self.retry_delay.as_secs_f64(),
                        "Waiting before trying to renew the Vault token again"
                    );
                    self.retry_delay
                }
            };
        }
        tracing::debug!("Vault token renewal stopped");
    }

    async fn renew_once(&self) -> Result<Duration, ApiError> {
        let before = self.client.lookup_self().await?;
        tracing::info!(old_ttl_secs = before.ttl, "Renewing Vault token");

        let lease = self.client.renew_self().await?;

        let after = self.client.lookup_self().await?;
        tracing::info!(new_ttl_secs = after.ttl, "Renewed Vault token");

        Ok(lease)
    }
}

fn next_interval(lease: Duration) -> Duration {
    suggested_refresh_interval(lease).max(MIN_RENEW_INTERVAL)
}

/// Controls a running renewal task.
///
/// Dropping the handle stops renewal.
#[derive(Debug)]
pub struct RenewalHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RenewalHandle {
    /// Stop renewing and wait for the task to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(error = %e, "Vault token renewal task ended abnormally");
        }
    }

    /// Whether the renewal task has stopped
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for RenewalHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
