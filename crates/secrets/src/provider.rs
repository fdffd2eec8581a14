//! Host-facing configuration provider
//!
//! [`SecretConfigProvider`] is the surface a configuration framework talks
//! to. It has no dependency on any plugin ABI: a host shim only needs to call
//! [`get`](SecretConfigProvider::get) for each `path` it saw in its
//! configuration and re-invoke it once [`ConfigData::ttl`] has passed.

use crate::{
    ConfigResolver, ResolutionRequest, ResolutionResult, ResolverConfig, SecretError,
    SecretFetcher, SecretPath, SecretRef, SecureSecret,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Values for one path together with their time-to-live.
#[derive(Debug, Clone, Default)]
pub struct ConfigData {
    /// Key -> secure value
    pub data: HashMap<String, SecureSecret>,
    /// Lease of the underlying record, `None` when the store reported none
    pub ttl: Option<Duration>,
}

impl ConfigData {
    /// Get the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SecureSecret> {
        self.data.get(key)
    }
}

/// Resolves configuration values through a [`ConfigResolver`].
#[derive(Debug, Clone)]
pub struct SecretConfigProvider {
    resolver: ConfigResolver,
}

impl SecretConfigProvider {
    /// Create a provider with the default resolver configuration.
    #[must_use]
    pub fn new(fetcher: Arc<dyn SecretFetcher>) -> Self {
        Self {
            resolver: ConfigResolver::new(fetcher),
        }
    }

    /// Create a provider with a custom resolver configuration.
    #[must_use]
    pub fn with_config(fetcher: Arc<dyn SecretFetcher>, config: ResolverConfig) -> Self {
        Self {
            resolver: ConfigResolver::with_config(fetcher, config),
        }
    }

    /// The resolver used by this provider
    #[must_use]
    pub const fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    /// Resolve `keys` at `path`.
    ///
    /// An empty key list returns empty data without contacting the store.
    ///
    /// # Errors
    ///
    /// Any [`SecretError`]; a key missing from the record fails the whole
    /// call with [`SecretError::MissingKey`].
    pub async fn get(&self, path: &str, keys: &[&str]) -> Result<ConfigData, SecretError> {
        let request: ResolutionRequest = keys
            .iter()
            .map(|key| SecretRef::new(path, *key))
            .collect();
        let result = self.resolver.resolve(&request).await?;
        let ttl = result.min_lease();
        Ok(ConfigData {
            data: result.into_key_map(),
            ttl,
        })
    }

    /// Every key stored at `path`.
    ///
    /// # Errors
    ///
    /// Any error raised by the fetcher for `path`.
    pub async fn get_all(&self, path: &str) -> Result<ConfigData, SecretError> {
        let record = self.resolver.fetcher().fetch(&SecretPath::new(path)).await?;
        let ttl = record.lease();
        Ok(ConfigData {
            data: record.into_data(),
            ttl,
        })
    }

    /// Resolve references spread over any number of paths.
    ///
    /// # Errors
    ///
    /// See [`ConfigResolver::resolve`].
    pub async fn resolve_refs(
        &self,
        request: &ResolutionRequest,
    ) -> Result<ResolutionResult, SecretError> {
        self.resolver.resolve(request).await
    }
}
