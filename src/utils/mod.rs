//! Shared utilities: HTTP client, retry executor, rate limiter.
//!
//! - [`HttpClient`]: reqwest wrapper with the fixed user agent and timeouts
//! - [`with_retry`] / [`RetryConfig`]: bounded exponential-backoff executor
//! - [`RateLimiter`]: token-bucket limiter for provider request quotas

mod http;
mod ratelimit;
mod retry;

pub use http::HttpClient;
pub use ratelimit::RateLimiter;
pub use retry::{with_retry, RetryConfig};
