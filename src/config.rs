//! Configuration for the invocation bridge

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Deadline applied to each individual node dispatch; expiry maps to
    /// a `Timeout` failure
    pub dispatch_timeout: Duration,

    /// How long a mutating request's idempotency key stays in the dedup
    /// window after dispatch
    pub dedup_window: Duration,

    /// Retry policy for read-only capabilities on transient failures
    pub retry: RetryPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout: Duration::from_secs(30),
            dedup_window: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = BridgeConfig::default();
        assert_eq!(config.dispatch_timeout, Duration::from_secs(30));
        assert_eq!(config.dedup_window, Duration::from_secs(60));
        assert_eq!(config.retry.max_attempts, 3);
    }
}
