//! Request specification and URL construction
//!
//! Builds deterministic request URLs from an endpoint, ordered query
//! parameters, and an optional pagination cursor. Determinism matters:
//! the cache derives its keys from the built URL, so identical
//! (endpoint, params) must always yield byte-identical URLs.

use crate::error::Result;
use url::Url;

/// A query parameter value: a single scalar or a list of scalars.
///
/// List values expand to repeated `key=value` pairs in the URL
/// (e.g. `f_id=[1,2,3]` becomes `f_id=1&f_id=2&f_id=3`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A single value
    Scalar(String),
    /// Multiple values for the same key
    List(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

macro_rules! scalar_param {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for ParamValue {
                fn from(value: $t) -> Self {
                    Self::Scalar(value.to_string())
                }
            }
        )*
    };
}

scalar_param!(i32, i64, u32, u64, usize, bool);

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(items: Vec<T>) -> Self {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            match item.into() {
                ParamValue::Scalar(s) => values.push(s),
                ParamValue::List(mut list) => values.append(&mut list),
            }
        }
        Self::List(values)
    }
}

/// Ordered query parameters.
///
/// Insertion order is preserved so that URL construction is
/// deterministic. `None` values are omitted at insertion time via
/// [`QueryParams::push_opt`]; empty strings are kept and serialize as
/// `key=`.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(Vec<(String, ParamValue)>);

impl QueryParams {
    /// Create an empty parameter list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    #[must_use]
    pub fn push(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.0.push((key.into(), value.into()));
        self
    }

    /// Add a parameter only when a value is present
    #[must_use]
    pub fn push_opt<T: Into<ParamValue>>(self, key: impl Into<String>, value: Option<T>) -> Self {
        match value {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    /// Iterate over the parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &(String, ParamValue)> {
        self.0.iter()
    }

    /// Check whether no parameters are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// One logical request: endpoint, filters, and the pagination cursor.
///
/// Immutable per attempt; the pagination driver injects a fresh cursor
/// for each page.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// The API endpoint (e.g. "person", "aktivitaet")
    pub endpoint: String,
    /// Ordered filter parameters
    pub params: QueryParams,
    /// Continuation token, present on pages after the first
    pub cursor: Option<String>,
}

impl RequestSpec {
    /// Create a spec for an endpoint with no filters
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: QueryParams::new(),
            cursor: None,
        }
    }

    /// Set the filter parameters
    #[must_use]
    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    /// Set the pagination cursor; empty cursors are treated as absent
    #[must_use]
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        let cursor = cursor.into();
        self.cursor = if cursor.is_empty() { None } else { Some(cursor) };
        self
    }
}

/// Builds request URLs against a fixed base URL and API key.
///
/// The credential parameter is always appended last.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: Url,
    api_key: String,
}

impl UrlBuilder {
    /// Create a builder from a base URL string and an API key
    pub fn new(base: &str, api_key: impl Into<String>) -> Result<Self> {
        // A trailing slash is required for Url::join to keep the base path.
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        Ok(Self {
            base: Url::parse(&normalized)?,
            api_key: api_key.into(),
        })
    }

    /// The base URL requests are issued against
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Build the URL for a paginated listing request
    pub fn build(&self, spec: &RequestSpec) -> Result<Url> {
        let mut url = self.base.join(&spec.endpoint)?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(cursor) = &spec.cursor {
                query.append_pair("cursor", cursor);
            }
            for (key, value) in spec.params.iter() {
                match value {
                    ParamValue::Scalar(v) => {
                        query.append_pair(key, v);
                    }
                    ParamValue::List(items) => {
                        for item in items {
                            query.append_pair(key, item);
                        }
                    }
                }
            }
            query.append_pair("apikey", &self.api_key);
        }
        Ok(url)
    }

    /// Build the URL for a single-item lookup (`endpoint/{id}/`)
    pub fn build_item(&self, endpoint: &str, id: u64) -> Result<Url> {
        let mut url = self.base.join(&format!("{endpoint}/{id}/"))?;
        url.query_pairs_mut().append_pair("apikey", &self.api_key);
        Ok(url)
    }
}
