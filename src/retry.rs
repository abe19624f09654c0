//! Retry with exponential backoff for transient node failures

use std::time::{Duration, SystemTime};

/// Retry policy for read-only node calls.
///
/// Controls how many times a transiently-failed dispatch is attempted and
/// how long to wait between attempts using exponential backoff. Mutating
/// capabilities ignore this policy entirely; they execute at most once per
/// invocation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of dispatch attempts (first attempt included)
    pub max_attempts: u32,
    /// Base delay between attempts (doubles each attempt)
    pub base_delay: Duration,
    /// Maximum delay cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries; every failure is surfaced immediately
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

/// Compute the delay before the next retry attempt.
///
/// The delay follows exponential backoff:
/// `min(base_delay * 2^attempt + jitter, max_delay)`, where `attempt` is
/// zero-based (the delay after the first failed attempt uses `attempt = 0`).
///
/// Jitter is 0-25% of the computed delay, derived from `SystemTime` to avoid
/// pulling in a full random number generator.
#[must_use]
pub fn delay_for_attempt(policy: &RetryPolicy, attempt: u32) -> Duration {
    let base = policy
        .base_delay
        .saturating_mul(2u32.saturating_pow(attempt));
    let base = base.min(policy.max_delay);

    // Derive a simple jitter from subsecond nanos of the system clock
    let jitter_nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();

    // Scale to 0-25% of the base delay
    let jitter_fraction = f64::from(jitter_nanos % 250) / 1000.0;
    let jitter = base.mul_f64(jitter_fraction);

    (base + jitter).min(policy.max_delay)
}
