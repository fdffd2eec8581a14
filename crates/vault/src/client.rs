//! Minimal Vault HTTP API client

use crate::response::{
    ErrorResponse, LogicalResponse, LookupResponse, RenewResponse, TokenInfo,
};
use crate::{ApiError, VaultConfig, VaultError};
use cfgvault_secrets::DecodeFailure;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Authenticated HTTP access to one Vault server.
#[derive(Clone)]
pub(crate) struct VaultClient {
    http: reqwest::Client,
    config: VaultConfig,
}

impl VaultClient {
    /// Build a client presenting the configured token.
    pub(crate) fn new(config: &VaultConfig) -> Result<Self, VaultError> {
        let token = config.token().ok_or(VaultError::MissingToken)?;

        let mut token_header = HeaderValue::from_str(token.expose_secret())
            .map_err(|_| VaultError::InvalidHeader {
                header: "X-Vault-Token",
            })?;
        token_header.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("X-Vault-Token", token_header);
        headers.insert("X-Vault-Request", HeaderValue::from_static("true"));
        if let Some(namespace) = config.namespace() {
            let value = HeaderValue::from_str(namespace).map_err(|_| VaultError::InvalidHeader {
                header: "X-Vault-Namespace",
            })?;
            headers.insert("X-Vault-Namespace", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|source| VaultError::HttpClient { source })?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// `GET /v1/<path>`
    pub(crate) async fn read(&self, path: &str) -> Result<LogicalResponse, ApiError> {
        let request = self.http.get(self.config.endpoint(path));
        self.send(request).await
    }

    /// `GET /v1/auth/token/lookup-self`
    pub(crate) async fn lookup_self(&self) -> Result<TokenInfo, ApiError> {
        let request = self.http.get(self.config.endpoint("auth/token/lookup-self"));
        let response: LookupResponse = self.send(request).await?;
        Ok(response.data)
    }

    /// `POST /v1/auth/token/renew-self`, returning the new lease
    pub(crate) async fn renew_self(&self) -> Result<Duration, ApiError> {
        let request = self
            .http
            .post(self.config.endpoint("auth/token/renew-self"))
            .json(&serde_json::json!({}));
        let response: RenewResponse = self.send(request).await?;
        Ok(Duration::from_secs(response.auth.lease_duration))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(ApiError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            // Error bodies are best effort; Vault sends none for some statuses
            let errors = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.errors)
                .unwrap_or_default();
            return Err(ApiError::Status { status, errors });
        }

        let body = response.bytes().await.map_err(ApiError::Transport)?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(DecodeFailure::from(e)))
    }
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("address", &self.config.address().as_str())
            .field("namespace", &self.config.namespace())
            .finish_non_exhaustive()
    }
}
