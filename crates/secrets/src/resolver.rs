//! Path-grouped resolution with concurrent fetches
//!
//! This module resolves a [`ResolutionRequest`] with:
//! - One fetch per distinct path, however many keys are requested there
//! - Bounded concurrency across paths
//! - All-or-nothing results: the first failure aborts the call and drops the
//!   fetches still in flight
//! - Caller cancellation and an optional per-call deadline

use crate::lease::min_lease;
use crate::{
    ResolutionRequest, ResolutionResult, SecretError, SecretFetcher, SecretPath, SecretRecord,
};
use futures::FutureExt;
use futures::stream::{self, StreamExt};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default number of paths fetched at the same time by one resolve call.
const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// Configuration for resolution calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Upper bound on in-flight fetches per call (at least 1).
    pub max_concurrent_fetches: usize,
    /// Deadline for a whole resolve call. `None` waits for the backend.
    pub timeout: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            timeout: None,
        }
    }
}

impl ResolverConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of concurrent fetches. `1` resolves sequentially.
    #[must_use]
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max.max(1);
        self
    }

    /// Set a deadline for each resolve call.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Resolves requests against a single [`SecretFetcher`].
///
/// The resolver keeps no state between calls, so one instance can serve
/// concurrent `resolve` calls without coordination.
///
/// # Example
///
/// ```ignore
/// use cfgvault_secrets::{ConfigResolver, ResolverConfig, ResolutionRequest};
/// use std::time::Duration;
///
/// let config = ResolverConfig::new().with_timeout(Duration::from_secs(10));
/// let resolver = ConfigResolver::with_config(fetcher, config);
///
/// let request = ResolutionRequest::new()
///     .with("secret/db", "user")
///     .with("secret/db", "pass")
///     .with("secret/api", "token");
///
/// // Two fetches: secret/db and secret/api
/// let result = resolver.resolve(&request).await?;
/// ```
#[derive(Clone)]
pub struct ConfigResolver {
    fetcher: Arc<dyn SecretFetcher>,
    config: ResolverConfig,
}

impl ConfigResolver {
    /// Create a resolver with the default configuration.
    #[must_use]
    pub fn new(fetcher: Arc<dyn SecretFetcher>) -> Self {
        Self::with_config(fetcher, ResolverConfig::default())
    }

    /// Create a resolver with the given configuration.
    #[must_use]
    pub fn with_config(fetcher: Arc<dyn SecretFetcher>, config: ResolverConfig) -> Self {
        Self { fetcher, config }
    }

    /// The configuration used for each call
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The fetcher backing this resolver
    #[must_use]
    pub fn fetcher(&self) -> &Arc<dyn SecretFetcher> {
        &self.fetcher
    }

    /// Resolve every reference in `request`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while fetching or extracting any
    /// reference; no partial result is returned. See
    /// [`resolve_with_cancel`](Self::resolve_with_cancel).
    pub async fn resolve(
        &self,
        request: &ResolutionRequest,
    ) -> Result<ResolutionResult, SecretError> {
        self.resolve_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Resolve every reference in `request`, aborting when `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - A path is malformed ([`SecretError::InvalidPath`])
    /// - A path does not exist ([`SecretError::NotFound`])
    /// - A requested key is absent from its record ([`SecretError::MissingKey`])
    /// - The backend fails ([`SecretError::Fetch`])
    /// - `cancel` fires first ([`SecretError::Cancelled`])
    /// - The configured timeout elapses ([`SecretError::DeadlineExceeded`])
    #[tracing::instrument(
        name = "resolve",
        skip_all,
        fields(backend = self.fetcher.backend_name(), refs = request.len())
    )]
    pub async fn resolve_with_cancel(
        &self,
        request: &ResolutionRequest,
        cancel: &CancellationToken,
    ) -> Result<ResolutionResult, SecretError> {
        if cancel.is_cancelled() {
            return Err(SecretError::Cancelled);
        }

        let work = async {
            let resolution = resolve_grouped(
                self.fetcher.as_ref(),
                request,
                self.config.max_concurrent_fetches,
            );
            match self.config.timeout {
                Some(timeout) => tokio::time::timeout(timeout, resolution)
                    .await
                    .map_err(|_| SecretError::DeadlineExceeded { timeout })?,
                None => resolution.await,
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("Resolution cancelled by caller");
                Err(SecretError::Cancelled)
            }
            result = work => result,
        }
    }
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("backend", &self.fetcher.backend_name())
            .field("config", &self.config)
            .finish()
    }
}

/// Resolve a request with any fetcher, using the default concurrency and no
/// deadline.
///
/// # Errors
///
/// Same as [`ConfigResolver::resolve`], minus cancellation.
///
/// # Example
///
/// ```
/// use cfgvault_secrets::{MemoryFetcher, ResolutionRequest, SecretRecord, resolve};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let fetcher = MemoryFetcher::new().with_record(
///     "secret/db",
///     SecretRecord::from_pairs([("user", "u")], Some(Duration::from_secs(300))),
/// );
/// let request = ResolutionRequest::new().with("secret/db", "user");
///
/// let result = resolve(&fetcher, &request).await.unwrap();
/// assert_eq!(result.get("secret/db", "user").unwrap().expose(), "u");
/// assert_eq!(result.min_lease(), Some(Duration::from_secs(300)));
/// # });
/// ```
pub async fn resolve<F: SecretFetcher + ?Sized>(
    fetcher: &F,
    request: &ResolutionRequest,
) -> Result<ResolutionResult, SecretError> {
    resolve_grouped(fetcher, request, DEFAULT_MAX_CONCURRENT_FETCHES).await
}

async fn resolve_grouped<F: SecretFetcher + ?Sized>(
    fetcher: &F,
    request: &ResolutionRequest,
    max_concurrent: usize,
) -> Result<ResolutionResult, SecretError> {
    let groups = request.groups();
    if groups.is_empty() {
        return Ok(ResolutionResult::default());
    }

    tracing::debug!(
        backend = fetcher.backend_name(),
        paths = groups.len(),
        refs = request.len(),
        "Resolving secret references"
    );

    let pending: Vec<_> = groups
        .iter()
        .map(|(path, keys)| {
            async move {
                let record = fetcher.fetch(path).await?;
                ensure_keys(path, keys, &record)?;
                Ok::<_, SecretError>((path, record))
            }
            .boxed()
        })
        .collect();
    let mut fetches = stream::iter(pending).buffer_unordered(max_concurrent.max(1));

    let mut records: HashMap<&str, SecretRecord> = HashMap::with_capacity(groups.len());
    let mut lease = None;
    while let Some(fetched) = fetches.next().await {
        // Returning here drops the stream and every fetch still in flight
        let (path, record) = fetched?;
        lease = min_lease(lease, record.lease());
        records.insert(path.as_str(), record);
    }

    let mut values = IndexMap::with_capacity(request.len());
    for reference in request {
        let value = records
            .get(reference.path.normalized())
            .and_then(|record| record.get(&reference.key))
            .ok_or_else(|| SecretError::MissingKey {
                path: reference.path.clone(),
                key: reference.key.clone(),
            })?;
        values.insert(reference.clone(), value.clone());
    }

    tracing::debug!(
        paths = records.len(),
        min_lease_secs = lease.map(|l| l.as_secs()),
        "Resolved secret references"
    );

    Ok(ResolutionResult::new(values, lease))
}

/// Fail with the first requested key the record does not hold.
fn ensure_keys(
    path: &SecretPath,
    keys: &IndexSet<String>,
    record: &SecretRecord,
) -> Result<(), SecretError> {
    match keys.iter().find(|key| !record.contains_key(key)) {
        Some(key) => Err(SecretError::MissingKey {
            path: path.clone(),
            key: key.clone(),
        }),
        None => Ok(()),
    }
}
