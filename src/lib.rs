//! # dipfetch
//!
//! Resilient data-fetch core for the Bundestag DIP API: deterministic
//! URL construction, a TTL-bounded file cache, retry with linear
//! backoff and Retry-After handling, and a cursor pagination driver,
//! exposed through an async and a blocking client.
//!
//! ## Quick start
//!
//! ```no_run
//! use dipfetch::{ClientConfig, DipClient, QueryParams};
//!
//! # async fn run() -> dipfetch::Result<()> {
//! let client = DipClient::new(ClientConfig::builder().api_key("...").build())?;
//! let filters = QueryParams::new().push("f.wahlperiode", 20);
//! let persons = client.fetch("person", 100, &filters).await?;
//! println!("fetched {} records", persons.len());
//! # Ok(())
//! # }
//! ```
//!
//! Without an async runtime, [`BlockingDipClient`] offers the same
//! operations behind plain function calls.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod paginate;
pub mod request;
pub mod retry;

pub use cache::ResponseCache;
pub use client::{BlockingDipClient, DipClient};
pub use config::{CacheConfig, ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL};
pub use error::{Error, Result};
pub use http::{
    ApiResponse, BlockingExecutor, BlockingHttpTransport, BlockingTransport, Executor,
    HttpTransport, RateLimiter, RateLimiterConfig, RawResponse, Transport,
};
pub use paginate::{
    fetch_pages, fetch_pages_blocking, FetchOutcome, FetchSession, Page, TerminalReason,
};
pub use request::{ParamValue, QueryParams, RequestSpec, UrlBuilder};
pub use retry::RetryPolicy;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
