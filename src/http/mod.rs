//! Request execution with retry and rate limiting
//!
//! One transport-agnostic contract (`issue one GET, get back
//! status/headers/body`), implemented twice: blocking and cooperative
//! async. The executor composes cache lookup, transport call, error
//! classification, the retry loop, and the cache write.

mod executor;
pub mod rate_limit;
mod transport;

pub use executor::{ApiResponse, BlockingExecutor, Executor};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use transport::{
    BlockingHttpTransport, BlockingTransport, HttpTransport, RawResponse, Transport,
};

#[cfg(test)]
pub(crate) mod testing;
