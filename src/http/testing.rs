//! Scripted in-memory transports for tests
//!
//! Plays back a fixed sequence of responses, recording call counts and
//! requested URLs. Works with paused tokio time, which real sockets do
//! not.

use super::transport::{BlockingTransport, RawResponse, Transport};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse>>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<RawResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// A script that answers every call with the same response
    pub fn repeating(status: u16, body: &str, times: usize) -> Self {
        Self::new((0..times).map(|_| ok(status, body)).collect())
    }

    pub fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    fn next(&self, url: &str) -> Result<RawResponse> {
        self.urls.lock().unwrap().push(url.to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("transport script exhausted at {url}"))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<RawResponse> {
        self.next(url)
    }
}

impl BlockingTransport for ScriptedTransport {
    fn get(&self, url: &str) -> Result<RawResponse> {
        self.next(url)
    }
}

/// A successful scripted response
pub(crate) fn ok(status: u16, body: &str) -> Result<RawResponse> {
    Ok(RawResponse {
        status,
        headers: HashMap::new(),
        body: body.to_string(),
    })
}

/// A scripted response carrying one header
pub(crate) fn ok_with_header(status: u16, body: &str, name: &str, value: &str) -> Result<RawResponse> {
    let mut headers = HashMap::new();
    headers.insert(name.to_string(), value.to_string());
    Ok(RawResponse {
        status,
        headers,
        body: body.to_string(),
    })
}

/// A scripted transport-level failure
pub(crate) fn timeout() -> Result<RawResponse> {
    Err(Error::Timeout { timeout_ms: 1000 })
}

/// JSON page body in the API's wire shape
pub(crate) fn page_body(ids: &[u32], cursor: &str) -> String {
    let documents: Vec<_> = ids
        .iter()
        .map(|id| serde_json::json!({ "id": id.to_string() }))
        .collect();
    serde_json::json!({ "documents": documents, "cursor": cursor }).to_string()
}
