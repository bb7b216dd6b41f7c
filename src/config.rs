//! Client configuration
//!
//! Defaults mirror the API's operational guidance: 3 retries with a
//! 100ms linear backoff base, roughly ten requests per second, and a
//! one hour response cache.

use crate::error::{Error, Result};
use crate::http::RateLimiterConfig;
use crate::retry::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Production endpoint of the Bundestag DIP API
pub const DEFAULT_BASE_URL: &str = "https://search.dip.bundestag.de/api/v1/";

/// Environment variable consulted when no API key is set explicitly
pub const API_KEY_ENV: &str = "DIP_API_KEY";

/// Response cache settings
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding the cache entries
    pub dir: PathBuf,
    /// How long an entry stays fresh
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".cache"),
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Everything a client needs to issue requests
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API
    pub base_url: String,
    /// Explicit API key; falls back to `DIP_API_KEY` when unset
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry behavior for transient failures
    pub retry: RetryPolicy,
    /// Client-side throttling; `None` disables it
    pub rate_limit: Option<RateLimiterConfig>,
    /// Response caching; `None` disables it
    pub cache: Option<CacheConfig>,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            rate_limit: Some(RateLimiterConfig::default()),
            cache: Some(CacheConfig::default()),
            user_agent: format!("dipfetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Start building a config from the defaults
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Resolve the effective API key.
    ///
    /// An explicit key wins; otherwise `DIP_API_KEY` is consulted. Empty
    /// values count as absent.
    pub fn resolved_api_key(&self) -> Result<String> {
        if let Some(key) = &self.api_key {
            if !key.is_empty() {
                return Ok(key.clone());
            }
        }
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::MissingApiKey),
        }
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Override the base URL
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Set the API key explicitly
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set how many retries follow the initial attempt
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.retry.max_retries = max_retries;
        self
    }

    /// Set the linear backoff base delay
    #[must_use]
    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.config.retry.base_delay = base_delay;
        self
    }

    /// Configure client-side throttling
    #[must_use]
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable client-side throttling
    #[must_use]
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Set the cache directory, enabling the cache if disabled
    #[must_use]
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.cache.get_or_insert_with(CacheConfig::default).dir = dir.into();
        self
    }

    /// Set the cache TTL, enabling the cache if disabled
    #[must_use]
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache.get_or_insert_with(CacheConfig::default).ttl = ttl;
        self
    }

    /// Disable response caching
    #[must_use]
    pub fn no_cache(mut self) -> Self {
        self.config.cache = None;
        self
    }

    /// Override the User-Agent header
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Finish building
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
