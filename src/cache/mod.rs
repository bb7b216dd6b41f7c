//! On-disk response cache
//!
//! Content-addressed, TTL-bounded persistence of prior API responses.
//! Caching is an optimization, never a correctness dependency: every
//! failure mode here degrades to a cache miss.

mod store;

pub use store::ResponseCache;
