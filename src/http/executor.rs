//! Request executors
//!
//! `Executor` (async) and `BlockingExecutor` (sync) run the same
//! algorithm over their respective transports: cache lookup, transport
//! call, error classification, retry loop with backoff, cache write.
//! Waits are tokio suspension points in the async variant and real
//! sleeps in the blocking one.

use super::rate_limit::RateLimiter;
use super::transport::{BlockingTransport, RawResponse, Transport};
use crate::cache::ResponseCache;
use crate::error::{Error, Result};
use crate::retry::{is_rate_limited, retry_after, RetryPolicy};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A response as seen by callers of an executor.
///
/// Cached and live responses expose the same read contract; a cached
/// replay always reads as status 200 and never touches the transport.
#[derive(Debug, Clone)]
pub enum ApiResponse {
    /// Fresh response from the transport
    Live {
        /// HTTP status code
        status: u16,
        /// Response headers, names lowercased
        headers: HashMap<String, String>,
        /// Decoded JSON body; `Null` when the body failed to decode
        body: Value,
    },
    /// Replay of a previously cached response
    Cached {
        /// Headers captured when the entry was written
        headers: HashMap<String, String>,
        /// Cached JSON body
        body: Value,
    },
}

impl ApiResponse {
    /// Effective status code (cached replays read as 200)
    pub fn status(&self) -> u16 {
        match self {
            Self::Live { status, .. } => *status,
            Self::Cached { .. } => 200,
        }
    }

    /// Response headers
    pub fn headers(&self) -> &HashMap<String, String> {
        match self {
            Self::Live { headers, .. } | Self::Cached { headers, .. } => headers,
        }
    }

    /// Decoded JSON body
    pub fn body(&self) -> &Value {
        match self {
            Self::Live { body, .. } | Self::Cached { body, .. } => body,
        }
    }

    /// Consume the response, keeping only the body
    pub fn into_body(self) -> Value {
        match self {
            Self::Live { body, .. } | Self::Cached { body, .. } => body,
        }
    }

    /// Whether this response was served from the cache
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached { .. })
    }
}

/// Decode the body, write the cache entry for a 200, and wrap as live.
///
/// A body that is not valid JSON is logged and becomes `Null`; the
/// pagination driver reads that as an empty page. Such bodies are never
/// cached.
fn finish_success(cache: Option<&ResponseCache>, url: &str, response: RawResponse) -> ApiResponse {
    let body = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(e) => {
            warn!("Response body is not valid JSON: {e}");
            Value::Null
        }
    };

    if response.status == 200 && !body.is_null() {
        if let Some(cache) = cache {
            cache.set(url, &body, &response.headers);
        }
    }

    ApiResponse::Live {
        status: response.status,
        headers: response.headers,
        body,
    }
}

/// Cooperative-concurrent request executor
pub struct Executor<T: Transport> {
    transport: T,
    policy: RetryPolicy,
    cache: Option<Arc<ResponseCache>>,
    rate_limiter: Option<RateLimiter>,
}

impl<T: Transport> Executor<T> {
    /// Create an executor over a transport
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            cache: None,
            rate_limiter: None,
        }
    }

    /// Enable response caching
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Enable client-side request throttling
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// The executor's retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    #[cfg(test)]
    pub(crate) fn transport_for_tests(&self) -> &T {
        &self.transport
    }

    /// Execute one logical GET request with caching and retries
    pub async fn execute(&self, url: &str) -> Result<ApiResponse> {
        if let Some(cache) = &self.cache {
            if let Some((body, headers)) = cache.get(url) {
                debug!("Serving cached response for {url}");
                return Ok(ApiResponse::Cached { headers, body });
            }
        }

        let max_retries = self.policy.max_retries;
        let mut attempt: u32 = 0;
        let mut last_error: Option<Error> = None;

        while attempt <= max_retries {
            if let Some(limiter) = &self.rate_limiter {
                limiter.wait().await;
            }

            match self.transport.get(url).await {
                Ok(response) => {
                    if is_rate_limited(response.status) {
                        let wait = retry_after(&response.headers);
                        if attempt < max_retries {
                            warn!(
                                "Rate limited (429), attempt {}/{}, waiting {wait}s",
                                attempt + 1,
                                max_retries + 1
                            );
                            tokio::time::sleep(Duration::from_secs(wait)).await;
                            attempt += 1;
                            continue;
                        }
                        return Err(Error::RateLimited {
                            retry_after_seconds: wait,
                        });
                    }

                    if self.policy.should_retry(response.status, attempt) {
                        let delay = self.policy.backoff(attempt + 1);
                        warn!(
                            "Request failed with {}, attempt {}/{}, retrying in {delay:?}",
                            response.status,
                            attempt + 1,
                            max_retries + 1
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        last_error = Some(Error::http_status(response.status, response.body));
                        continue;
                    }

                    // Client errors are fatal, exhausted server errors surface as-is.
                    if response.status >= 400 {
                        return Err(Error::http_status(response.status, response.body));
                    }

                    debug!("Request succeeded: GET {url}");
                    return Ok(finish_success(self.cache.as_deref(), url, response));
                }
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    let delay = self.policy.backoff(attempt + 1);
                    warn!(
                        "Transport error ({e}), attempt {}/{}, retrying in {delay:?}",
                        attempt + 1,
                        max_retries + 1
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(Error::MaxRetriesExceeded { max_retries }))
    }
}

/// Thread-blocking request executor
pub struct BlockingExecutor<T: BlockingTransport> {
    transport: T,
    policy: RetryPolicy,
    cache: Option<Arc<ResponseCache>>,
}

impl<T: BlockingTransport> BlockingExecutor<T> {
    /// Create an executor over a blocking transport
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            cache: None,
        }
    }

    /// Enable response caching
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The executor's retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    #[cfg(test)]
    pub(crate) fn transport_for_tests(&self) -> &T {
        &self.transport
    }

    /// Execute one logical GET request with caching and retries
    pub fn execute(&self, url: &str) -> Result<ApiResponse> {
        if let Some(cache) = &self.cache {
            if let Some((body, headers)) = cache.get(url) {
                debug!("Serving cached response for {url}");
                return Ok(ApiResponse::Cached { headers, body });
            }
        }

        let max_retries = self.policy.max_retries;
        let mut attempt: u32 = 0;
        let mut last_error: Option<Error> = None;

        while attempt <= max_retries {
            match self.transport.get(url) {
                Ok(response) => {
                    if is_rate_limited(response.status) {
                        let wait = retry_after(&response.headers);
                        if attempt < max_retries {
                            warn!(
                                "Rate limited (429), attempt {}/{}, waiting {wait}s",
                                attempt + 1,
                                max_retries + 1
                            );
                            std::thread::sleep(Duration::from_secs(wait));
                            attempt += 1;
                            continue;
                        }
                        return Err(Error::RateLimited {
                            retry_after_seconds: wait,
                        });
                    }

                    if self.policy.should_retry(response.status, attempt) {
                        let delay = self.policy.backoff(attempt + 1);
                        warn!(
                            "Request failed with {}, attempt {}/{}, retrying in {delay:?}",
                            response.status,
                            attempt + 1,
                            max_retries + 1
                        );
                        std::thread::sleep(delay);
                        attempt += 1;
                        last_error = Some(Error::http_status(response.status, response.body));
                        continue;
                    }

                    if response.status >= 400 {
                        return Err(Error::http_status(response.status, response.body));
                    }

                    debug!("Request succeeded: GET {url}");
                    return Ok(finish_success(self.cache.as_deref(), url, response));
                }
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    let delay = self.policy.backoff(attempt + 1);
                    warn!(
                        "Transport error ({e}), attempt {}/{}, retrying in {delay:?}",
                        attempt + 1,
                        max_retries + 1
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(Error::MaxRetriesExceeded { max_retries }))
    }
}
