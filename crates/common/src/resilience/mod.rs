//! Resilience patterns for fault tolerance
//!
//! Currently a single pattern: a **generic retry executor** with exponential
//! backoff and a pluggable retry policy. The executor is generic over the
//! operation's error type; callers decide what is retryable by implementing
//! [`RetryPolicy`] for their own error enum.
//!
//! Delays are deterministic (no jitter) so that backoff schedules can be
//! asserted exactly under a paused tokio clock.

pub mod retry;

// Re-export retry types
pub use retry::{
    ExponentialBackoff, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError,
    RetryExecutor, RetryPolicy, RetryResult,
};
