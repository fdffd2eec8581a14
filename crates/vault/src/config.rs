//! Vault connection settings

use crate::VaultError;
use crate::token::{DEFAULT_TOKEN_FILE, TokenSource, discover_token};
use secrecy::SecretString;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Address used when `VAULT_ADDR` is unset
pub const DEFAULT_ADDR: &str = "http://127.0.0.1:8200";

/// Time allowed to open a connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Time allowed for a whole request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How to reach Vault and which token to present.
///
/// The token is optional: without one, [`VaultFetcher`](crate::VaultFetcher)
/// falls back to the `vault` binary, which uses its own login state.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    address: Url,
    token: Option<SecretString>,
    token_source: Option<TokenSource>,
    namespace: Option<String>,
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl VaultConfig {
    /// Create a config for `address` with no token.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidAddress`] if `address` is not a URL.
    pub fn new(address: &str) -> Result<Self, VaultError> {
        let parsed = Url::parse(address).map_err(|source| VaultError::InvalidAddress {
            address: address.to_string(),
            source,
        })?;

        Ok(Self {
            address: parsed,
            token: None,
            token_source: None,
            namespace: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Read settings from the environment.
    ///
    /// - `VAULT_ADDR`, defaulting to [`DEFAULT_ADDR`]
    /// - the token, see [`discover_token`]
    /// - `VAULT_NAMESPACE`, when set and non-empty
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or a token file cannot be
    /// read.
    pub fn from_env() -> Result<Self, VaultError> {
        Self::from_env_with_token_file(Path::new(DEFAULT_TOKEN_FILE))
    }

    /// Like [`from_env`](Self::from_env) with a different default token file.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_env_with_token_file(default_token_file: &Path) -> Result<Self, VaultError> {
        let address = std::env::var("VAULT_ADDR")
            .ok()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());

        let mut config = Self::new(address.trim())?;

        if let Some((token, source)) = discover_token(default_token_file)? {
            tracing::debug!(source = %source, "Found Vault token");
            config.token = Some(token);
            config.token_source = Some(source);
        }

        if let Ok(namespace) = std::env::var("VAULT_NAMESPACE")
            && !namespace.trim().is_empty()
        {
            config.namespace = Some(namespace.trim().to_string());
        }

        Ok(config)
    }

    /// Present `token` on every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self.token_source = None;
        self
    }

    /// Send requests to a Vault Enterprise namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Override the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the whole-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Base address of the Vault server
    #[must_use]
    pub const fn address(&self) -> &Url {
        &self.address
    }

    /// The token, if one was found or set
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// Where the token was found when read from the environment
    #[must_use]
    pub const fn token_source(&self) -> Option<&TokenSource> {
        self.token_source.as_ref()
    }

    /// Enterprise namespace
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Connect timeout
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Whole-request timeout
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// URL of a `v1` API endpoint.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.address.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
