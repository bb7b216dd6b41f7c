//! High-level API clients
//!
//! `DipClient` (async) and `BlockingDipClient` (sync) wire the
//! configuration into an executor and URL builder and expose the two
//! fetch operations: paginated listings and single-item lookups.

use crate::cache::ResponseCache;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::http::{
    BlockingExecutor, BlockingHttpTransport, Executor, HttpTransport, RateLimiter,
};
use crate::paginate::{fetch_pages, fetch_pages_blocking, FetchOutcome, TerminalReason};
use crate::request::{QueryParams, UrlBuilder};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

#[cfg(test)]
mod tests;

/// Turn a pagination outcome into the caller-facing result.
///
/// A failure before any record surfaces as an error; a failure after
/// partial progress is logged and the partial records are returned.
fn resolve_outcome(endpoint: &str, outcome: FetchOutcome) -> Result<Vec<Value>> {
    match outcome.error {
        Some(e) if outcome.records.is_empty() => Err(e),
        Some(e) => {
            warn!(
                "Returning {} partial records for {endpoint}: {e}",
                outcome.records.len()
            );
            Ok(outcome.records)
        }
        None => {
            debug_assert_ne!(outcome.reason, TerminalReason::ExecutorFailure);
            Ok(outcome.records)
        }
    }
}

/// Pick the single document out of an item-lookup body.
///
/// The API answers item lookups either with the bare object or with a
/// one-element `documents` wrapper; both shapes are accepted.
fn extract_single(body: Value) -> Option<Value> {
    match body {
        Value::Null => None,
        Value::Object(mut map) => {
            if let Some(Value::Array(documents)) = map.remove("documents") {
                documents.into_iter().next()
            } else {
                Some(Value::Object(map))
            }
        }
        other => Some(other),
    }
}

fn build_cache(config: &ClientConfig) -> Result<Option<Arc<ResponseCache>>> {
    match &config.cache {
        Some(cache) => Ok(Some(Arc::new(ResponseCache::new(&cache.dir, cache.ttl)?))),
        None => Ok(None),
    }
}

/// Asynchronous API client
pub struct DipClient {
    executor: Executor<HttpTransport>,
    urls: UrlBuilder,
    cache: Option<Arc<ResponseCache>>,
}

impl std::fmt::Debug for DipClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DipClient").finish_non_exhaustive()
    }
}

impl DipClient {
    /// Create a client from a configuration.
    ///
    /// Fails when no API key can be resolved, the base URL is invalid,
    /// or the cache directory cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api_key = config.resolved_api_key()?;
        let urls = UrlBuilder::new(&config.base_url, api_key)?;
        let cache = build_cache(&config)?;

        let transport = HttpTransport::new(config.timeout, &config.user_agent)?;
        let mut executor = Executor::new(transport, config.retry);
        if let Some(cache) = &cache {
            executor = executor.with_cache(Arc::clone(cache));
        }
        if let Some(limit) = &config.rate_limit {
            executor = executor.with_rate_limiter(RateLimiter::new(limit));
        }

        Ok(Self {
            executor,
            urls,
            cache,
        })
    }

    /// Fetch up to `count` records from a paginated endpoint.
    ///
    /// Transparently follows cursors across pages. When the request
    /// pipeline fails after some records were already collected, the
    /// partial result is returned and the failure is logged.
    pub async fn fetch(
        &self,
        endpoint: &str,
        count: usize,
        filters: &QueryParams,
    ) -> Result<Vec<Value>> {
        let outcome = fetch_pages(&self.executor, &self.urls, endpoint, count, filters).await?;
        resolve_outcome(endpoint, outcome)
    }

    /// Fetch a single record by its numeric id.
    ///
    /// Returns `Ok(None)` when the API answers with an empty document
    /// list.
    pub async fn fetch_one(&self, endpoint: &str, id: u64) -> Result<Option<Value>> {
        let url = self.urls.build_item(endpoint, id)?;
        let response = self.executor.execute(url.as_str()).await?;
        Ok(extract_single(response.into_body()))
    }

    /// Remove all cached responses
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Remove only cached responses whose TTL has lapsed
    pub fn clear_expired_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear_expired();
        }
    }
}

/// Synchronous API client for callers without an async runtime.
///
/// Same operations and semantics as [`DipClient`], minus the client-side
/// rate limiter: blocking callers pace themselves through the retry
/// waits alone.
pub struct BlockingDipClient {
    executor: BlockingExecutor<BlockingHttpTransport>,
    urls: UrlBuilder,
    cache: Option<Arc<ResponseCache>>,
}

impl BlockingDipClient {
    /// Create a blocking client from a configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api_key = config.resolved_api_key()?;
        let urls = UrlBuilder::new(&config.base_url, api_key)?;
        let cache = build_cache(&config)?;

        let transport = BlockingHttpTransport::new(config.timeout, &config.user_agent)?;
        let mut executor = BlockingExecutor::new(transport, config.retry);
        if let Some(cache) = &cache {
            executor = executor.with_cache(Arc::clone(cache));
        }

        Ok(Self {
            executor,
            urls,
            cache,
        })
    }

    /// Fetch up to `count` records from a paginated endpoint
    pub fn fetch(&self, endpoint: &str, count: usize, filters: &QueryParams) -> Result<Vec<Value>> {
        let outcome = fetch_pages_blocking(&self.executor, &self.urls, endpoint, count, filters)?;
        resolve_outcome(endpoint, outcome)
    }

    /// Fetch a single record by its numeric id
    pub fn fetch_one(&self, endpoint: &str, id: u64) -> Result<Option<Value>> {
        let url = self.urls.build_item(endpoint, id)?;
        let response = self.executor.execute(url.as_str())?;
        Ok(extract_single(response.into_body()))
    }

    /// Remove all cached responses
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Remove only cached responses whose TTL has lapsed
    pub fn clear_expired_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear_expired();
        }
    }
}
