//! Fetch resilience and process-wide counters

pub mod circuit_breaker;
pub mod metrics;
pub mod rate_limiter;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use metrics::{Metrics, MetricsSnapshot};
pub use rate_limiter::RateLimiter;
pub use retry::{with_retry, RetryConfig, Retryable};
