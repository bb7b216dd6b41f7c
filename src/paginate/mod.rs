//! Cursor pagination driver
//!
//! Repeatedly invokes a request executor, following the response's
//! cursor field and accumulating documents until the requested count is
//! met or the sequence terminates. Retry and backoff belong to the
//! executor; the driver only decides whether to request another page.

use crate::error::{Error, Result};
use crate::http::{BlockingExecutor, BlockingTransport, Executor, Transport};
use crate::request::{QueryParams, RequestSpec, UrlBuilder};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};


/// The decoded body of one paginated response.
///
/// An empty `cursor` means the sequence is terminal. Never persisted as
/// a domain object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    /// Records carried by this page, opaque to the driver
    #[serde(default)]
    pub documents: Vec<Value>,
    /// Continuation token for the next page; empty means none
    #[serde(default)]
    pub cursor: String,
}

impl Page {
    /// Decode a response body into a page.
    ///
    /// Bodies that are not page-shaped (including `Null` from an
    /// undecodable response) read as an empty terminal page.
    pub fn from_body(body: &Value) -> Self {
        serde_json::from_value(body.clone()).unwrap_or_default()
    }
}

/// Why a paginated fetch stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalReason {
    /// The requested number of records was accumulated
    CountReached,
    /// A page arrived with no documents
    EmptyPage,
    /// A page arrived without a continuation cursor
    NoCursor,
    /// The request executor failed or exhausted its retries
    ExecutorFailure,
}

/// Result of one paginated fetch
#[derive(Debug)]
pub struct FetchOutcome {
    /// Accumulated records, truncated to the requested count
    pub records: Vec<Value>,
    /// Terminal state the fetch ended in
    pub reason: TerminalReason,
    /// The executor error, present iff `reason` is `ExecutorFailure`
    pub error: Option<Error>,
}

/// Per-invocation pagination accumulator.
///
/// Owned exclusively by one driver invocation; never shared across
/// calls, so concurrent fetches on one client cannot bleed state into
/// each other.
#[derive(Debug)]
pub struct FetchSession {
    requested: usize,
    collected: Vec<Value>,
    cursor: String,
}

impl FetchSession {
    /// Start a session aiming for `requested` records
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            collected: Vec::new(),
            cursor: String::new(),
        }
    }

    /// The cursor to inject into the next page request
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// Records accumulated so far
    pub fn collected(&self) -> usize {
        self.collected.len()
    }

    /// Fold one page into the session.
    ///
    /// Returns the terminal reason when pagination must stop, or `None`
    /// to continue with the page's cursor.
    pub fn absorb(&mut self, page: Page) -> Option<TerminalReason> {
        if page.documents.is_empty() {
            return Some(TerminalReason::EmptyPage);
        }
        self.collected.extend(page.documents);
        if self.collected.len() >= self.requested {
            return Some(TerminalReason::CountReached);
        }
        if page.cursor.is_empty() {
            return Some(TerminalReason::NoCursor);
        }
        self.cursor = page.cursor;
        None
    }

    /// Close the session. Records are truncated to the requested count
    /// no matter how the terminal state was reached.
    fn into_outcome(mut self, reason: TerminalReason, error: Option<Error>) -> FetchOutcome {
        self.collected.truncate(self.requested);
        FetchOutcome {
            records: self.collected,
            reason,
            error,
        }
    }
}

/// Fetch up to `count` records from a paginated endpoint (async).
///
/// Pages within one call are strictly ordered: the next page is only
/// requested once the prior page's cursor is known. An executor failure
/// terminates the sequence but keeps what was already accumulated.
pub async fn fetch_pages<T: Transport>(
    executor: &Executor<T>,
    urls: &UrlBuilder,
    endpoint: &str,
    count: usize,
    filters: &QueryParams,
) -> Result<FetchOutcome> {
    let mut session = FetchSession::new(count);
    if count == 0 {
        return Ok(session.into_outcome(TerminalReason::CountReached, None));
    }

    loop {
        let spec = RequestSpec::new(endpoint)
            .with_params(filters.clone())
            .with_cursor(session.cursor());
        let url = urls.build(&spec)?;
        debug!("Fetching page from {endpoint} ({} collected)", session.collected());

        match executor.execute(url.as_str()).await {
            Ok(response) => {
                let page = Page::from_body(response.body());
                if let Some(reason) = session.absorb(page) {
                    debug!(
                        "Pagination for {endpoint} done: {reason:?}, {} records",
                        session.collected()
                    );
                    return Ok(session.into_outcome(reason, None));
                }
            }
            Err(e) => {
                warn!(
                    "Stopping pagination for {endpoint} after {} records: {e}",
                    session.collected()
                );
                return Ok(session.into_outcome(TerminalReason::ExecutorFailure, Some(e)));
            }
        }
    }
}

/// Fetch up to `count` records from a paginated endpoint (blocking).
pub fn fetch_pages_blocking<T: BlockingTransport>(
    executor: &BlockingExecutor<T>,
    urls: &UrlBuilder,
    endpoint: &str,
    count: usize,
    filters: &QueryParams,
) -> Result<FetchOutcome> {
    let mut session = FetchSession::new(count);
    if count == 0 {
        return Ok(session.into_outcome(TerminalReason::CountReached, None));
    }

    loop {
        let spec = RequestSpec::new(endpoint)
            .with_params(filters.clone())
            .with_cursor(session.cursor());
        let url = urls.build(&spec)?;
        debug!("Fetching page from {endpoint} ({} collected)", session.collected());

        match executor.execute(url.as_str()) {
            Ok(response) => {
                let page = Page::from_body(response.body());
                if let Some(reason) = session.absorb(page) {
                    debug!(
                        "Pagination for {endpoint} done: {reason:?}, {} records",
                        session.collected()
                    );
                    return Ok(session.into_outcome(reason, None));
                }
            }
            Err(e) => {
                warn!(
                    "Stopping pagination for {endpoint} after {} records: {e}",
                    session.collected()
                );
                return Ok(session.into_outcome(TerminalReason::ExecutorFailure, Some(e)));
            }
        }
    }
}
