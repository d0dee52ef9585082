//! Rate-limit counter storage trait.

use crate::StoreError;
use agegate_types::Timestamp;

/// Outcome of a rate-limit check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Attempts left in the window after this one (0 when denied).
    pub remaining: u32,
    /// When the oldest counted attempt leaves the window.
    pub reset_at: Timestamp,
}

/// Sliding-window attempt counters keyed by client identity.
///
/// `check_and_record` is one atomic operation — prune, count, and record
/// under the backend's own synchronization — so concurrent callers for the
/// same identifier can never push the count past the cap. In a
/// multi-instance deployment the backend must be a store shared across all
/// instances; a per-process map only bounds one process.
pub trait RateLimitStore: Send + Sync {
    /// Prune attempts older than `window_millis`, then either deny (at or
    /// over `max_requests`) or record the current attempt and allow.
    fn check_and_record(
        &self,
        identifier: &str,
        now: Timestamp,
        window_millis: u64,
        max_requests: u32,
    ) -> Result<RateDecision, StoreError>;
}
