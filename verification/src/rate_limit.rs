//! Sliding-window rate limiting for verification starts.
//!
//! The counters live behind [`RateLimitStore`] so every instance of the
//! service shares them; the window math and the atomicity both belong to
//! the store. This wrapper owns the policy knobs and the failure policy:
//! when the counter store is unreachable we fail open and allow the
//! request — verification availability wins over strict abuse prevention —
//! and say so loudly in the logs.

use agegate_store::{RateDecision, RateLimitStore};
use agegate_types::Timestamp;
use std::sync::Arc;
use tracing::error;

/// Default cap: 5 verification starts per client per hour.
pub const DEFAULT_MAX_REQUESTS: u32 = 5;
pub const DEFAULT_WINDOW_MILLIS: u64 = 3_600_000;

#[derive(Clone, Copy, Debug)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_millis: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window_millis: DEFAULT_WINDOW_MILLIS,
        }
    }
}

pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    /// Count this attempt against `identifier`'s window and decide.
    pub fn check_and_record(&self, identifier: &str, now: Timestamp) -> RateDecision {
        match self.store.check_and_record(
            identifier,
            now,
            self.config.window_millis,
            self.config.max_requests,
        ) {
            Ok(decision) => decision,
            Err(e) => {
                error!(identifier, error = %e, "rate-limit store unreachable, failing open");
                RateDecision {
                    allowed: true,
                    remaining: 0,
                    reset_at: now,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agegate_store::{MemoryStore, StoreError};

    struct FailingStore;

    impl RateLimitStore for FailingStore {
        fn check_and_record(
            &self,
            _identifier: &str,
            _now: Timestamp,
            _window_millis: u64,
            _max_requests: u32,
        ) -> Result<RateDecision, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
    }

    #[test]
    fn default_config_is_five_per_hour() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 5);
        assert_eq!(config.window_millis, 3_600_000);
    }

    #[test]
    fn cap_applies_within_the_window() {
        let limiter = RateLimiter::new(Arc::new(MemoryStore::new()), RateLimitConfig::default());
        let now = Timestamp::from_millis(10_000);

        for _ in 0..5 {
            assert!(limiter.check_and_record("10.1.1.1", now).allowed);
        }
        let denied = limiter.check_and_record("10.1.1.1", now);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
    }

    #[test]
    fn window_elapse_frees_the_identifier() {
        let limiter = RateLimiter::new(
            Arc::new(MemoryStore::new()),
            RateLimitConfig {
                max_requests: 2,
                window_millis: 1_000,
            },
        );
        let t0 = Timestamp::from_millis(0);
        assert!(limiter.check_and_record("ip", t0).allowed);
        assert!(limiter.check_and_record("ip", t0).allowed);
        assert!(!limiter.check_and_record("ip", t0).allowed);

        assert!(limiter
            .check_and_record("ip", Timestamp::from_millis(1_500))
            .allowed);
    }

    #[test]
    fn unreachable_store_fails_open() {
        let limiter = RateLimiter::new(Arc::new(FailingStore), RateLimitConfig::default());
        let decision = limiter.check_and_record("ip", Timestamp::from_millis(1));
        assert!(decision.allowed);
    }
}
