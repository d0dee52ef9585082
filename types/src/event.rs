//! The canonical, provider-agnostic webhook event.

use crate::ids::SessionId;
use serde::{Deserialize, Serialize};

/// The three-value status vocabulary every provider's events are mapped
/// onto. Deliberately has no "approved by default" arm: adapters map any
/// status they do not recognize to [`CanonicalStatus::Review`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalStatus {
    Approved,
    Rejected,
    Review,
}

impl CanonicalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStatus::Approved => "approved",
            CanonicalStatus::Rejected => "rejected",
            CanonicalStatus::Review => "review",
        }
    }
}

/// A provider webhook event normalized by the provider adapter.
///
/// `session_id` is the only correlation key; identity fields in provider
/// payloads are never used for authorization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub session_id: SessionId,
    pub status: CanonicalStatus,
    pub risk_score: Option<f64>,
    pub reason: Option<String>,
}
