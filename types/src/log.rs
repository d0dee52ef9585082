//! Append-only audit records for the verification lifecycle.

use crate::ids::UserId;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// One immutable record per state transition or lifecycle event.
///
/// Entries are never mutated or deleted; the live `VerificationState` is a
/// latest-wins projection over them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationLogEntry {
    pub user_id: UserId,
    /// `"veriff"`, `"persona"`, `"yoti"` — or `"manual"` for operator actions.
    pub provider: String,
    /// Action name: `started`, `approved`, `rejected`, `review`, `expired`,
    /// or `approve`/`reject` for manual overrides.
    pub event: String,
    /// The canonical status the event represents.
    pub status: String,
    /// Opaque diagnostic blob carried from the provider or manual action.
    pub payload: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: Timestamp,
}

/// Client-request metadata stamped onto audit records.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip_address: Some(ip_address.into()),
            user_agent: Some(user_agent.into()),
        }
    }

    /// Context for internally-originated events (expiry sweeps, webhooks
    /// whose caller is the provider rather than the user).
    pub fn empty() -> Self {
        Self::default()
    }
}
