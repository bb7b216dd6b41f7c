//! Transport contract and reqwest-backed implementations
//!
//! A transport issues exactly one GET and reports back status, headers,
//! and body. Retry decisions never live here; connection failures and
//! timeouts surface as errors for the executor to classify.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// The raw result of one transport call
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, names lowercased
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub body: String,
}

/// Suspendable transport for the cooperative-concurrent executor
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one GET request
    async fn get(&self, url: &str) -> Result<RawResponse>;
}

/// Thread-blocking transport for the synchronous executor
pub trait BlockingTransport: Send + Sync {
    /// Issue one GET request
    fn get(&self, url: &str) -> Result<RawResponse>;
}

/// Async transport backed by `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport with a per-call timeout and user agent
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<RawResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, self.timeout))?;

        let status = response.status().as_u16();
        let headers = header_map(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(e, self.timeout))?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Blocking transport backed by `reqwest::blocking::Client`
#[derive(Debug)]
pub struct BlockingHttpTransport {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl BlockingHttpTransport {
    /// Build a transport with a per-call timeout and user agent
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, timeout })
    }
}

impl BlockingTransport for BlockingHttpTransport {
    fn get(&self, url: &str) -> Result<RawResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| classify_reqwest_error(e, self.timeout))?;

        let status = response.status().as_u16();
        let headers = header_map(response.headers());
        let body = response
            .text()
            .map_err(|e| classify_reqwest_error(e, self.timeout))?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify_reqwest_error(e: reqwest::Error, timeout: Duration) -> Error {
    if e.is_timeout() {
        Error::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        Error::Connectivity(e)
    }
}

fn header_map(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}
