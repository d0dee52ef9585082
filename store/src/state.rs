//! Verification state storage trait.

use crate::StoreError;
use agegate_types::{SessionId, StateRecord, Timestamp, UserId, VerificationState};

/// Trait for storing the one live [`VerificationState`] per user.
///
/// Writes are compare-and-set on the record's version counter, so every
/// mutation is single-record atomic and concurrent writers cannot silently
/// overwrite each other.
pub trait VerificationStateStore: Send + Sync {
    /// Read a user's state record. A user with no stored record reads as
    /// `Unverified` at version 0 — verification state exists implicitly
    /// from account creation.
    fn get_state(&self, user: &UserId) -> Result<StateRecord, StoreError>;

    /// Replace a user's state, failing with [`StoreError::Conflict`] when
    /// the stored version differs from `expected_version`. Returns the new
    /// version. Backends enforce session-id uniqueness and fail with
    /// [`StoreError::Duplicate`] when the state's session id already
    /// belongs to a different user.
    fn put_state(
        &self,
        user: &UserId,
        expected_version: u64,
        state: &VerificationState,
    ) -> Result<u64, StoreError>;

    /// Resolve the user a provider session belongs to. This is the only
    /// way webhook events are correlated to users; it covers superseded
    /// sessions too, so late events can be recognized (and ignored).
    fn find_user_by_session(&self, session: &SessionId) -> Result<Option<UserId>, StoreError>;

    /// All records currently in flight (`pending` or `review`), for the
    /// expiry sweep. Backends with many users should index this.
    fn iter_in_flight(&self) -> Result<Vec<StateRecord>, StoreError>;

    /// Users whose `pending` session started before `cutoff`.
    fn stale_pending_users(&self, cutoff: Timestamp) -> Result<Vec<UserId>, StoreError> {
        Ok(self
            .iter_in_flight()?
            .into_iter()
            .filter(|r| match &r.state {
                VerificationState::Pending(p) => p.started_at < cutoff,
                _ => false,
            })
            .map(|r| r.user_id)
            .collect())
    }
}
