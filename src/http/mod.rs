//! HTTP client module
//!
//! Provides the transport used by every remote call.
//!
//! # Features
//!
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Authentication**: Integration with auth module
//! - **Cancellation**: Requests observe a shared cancellation token
//!
//! Nothing here retries. Each request surfaces its outcome exactly once.

mod client;
mod rate_limit;
mod types;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use types::{RawResponse, RequestBody, RequestConfig, ResponseMeta};

#[cfg(test)]
mod tests;
