//! Verification audit log storage trait.

use crate::StoreError;
use agegate_types::{UserId, VerificationLogEntry};

/// Append-only store for [`VerificationLogEntry`] records.
///
/// There is deliberately no update or delete operation: the log is the
/// reconstructable history of every user's verification state.
pub trait VerificationLogStore: Send + Sync {
    fn append(&self, entry: &VerificationLogEntry) -> Result<(), StoreError>;

    /// Most-recent-first entries for a user, up to `limit`.
    fn for_user(&self, user: &UserId, limit: usize) -> Result<Vec<VerificationLogEntry>, StoreError>;
}
