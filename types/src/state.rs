//! The per-user verification state machine's data model.
//!
//! `VerificationState` is a tagged sum type over the six lifecycle stages,
//! so status handling is exhaustive at compile time and each stage carries
//! exactly the fields that exist in that stage. Exactly one live state
//! exists per user; a missing record reads as [`VerificationState::Unverified`].

use crate::ids::{ProviderKind, SessionId, UserId};
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Current lifecycle stage of a user's identity verification.
///
/// Serialized with an internal `status` tag matching the wire vocabulary:
/// `none`, `pending`, `review`, `approved`, `rejected`, `expired`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationState {
    /// No verification has ever been started (the default for new accounts).
    #[serde(rename = "none")]
    Unverified,
    /// A remote provider session exists and the user has not finished it.
    Pending(PendingSession),
    /// The provider could not decide automatically; a human must.
    Review(ReviewCase),
    /// Verified. Terminal for the session that produced it.
    Approved(ApprovedVerification),
    /// Not verified. Terminal for the session; the user may start over.
    Rejected(RejectedVerification),
    /// The pending session went stale before the provider decided.
    Expired(ExpiredSession),
}

/// An in-flight provider session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingSession {
    pub provider: ProviderKind,
    pub session_id: SessionId,
    /// Where the user completes the provider's flow. Kept so a concurrent
    /// second start can reuse the in-flight session instead of forking one.
    pub session_url: String,
    pub started_at: Timestamp,
}

/// A session the provider escalated to human review.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewCase {
    pub provider: ProviderKind,
    pub session_id: SessionId,
    pub started_at: Timestamp,
    pub risk_score: Option<f64>,
    pub reason: Option<String>,
}

/// A successfully verified user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApprovedVerification {
    pub provider: ProviderKind,
    pub session_id: SessionId,
    pub started_at: Timestamp,
    /// Set only on the transition into `approved`.
    pub verified_at: Timestamp,
    pub risk_score: Option<f64>,
    pub reason: Option<String>,
    /// Present only when a human operator overrode automated status.
    pub manual: Option<ManualReview>,
}

/// A rejected verification attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RejectedVerification {
    pub provider: ProviderKind,
    pub session_id: SessionId,
    pub started_at: Timestamp,
    pub decided_at: Timestamp,
    pub risk_score: Option<f64>,
    pub reason: Option<String>,
    /// Present only when a human operator overrode automated status.
    pub manual: Option<ManualReview>,
}

/// A pending session that aged out before the provider decided.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpiredSession {
    pub provider: ProviderKind,
    pub session_id: SessionId,
    pub started_at: Timestamp,
    pub expired_at: Timestamp,
}

/// Audit fields stamped when a human operator decides a case.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManualReview {
    pub reviewed_by: String,
    pub reason: Option<String>,
}

impl VerificationState {
    /// The canonical status string for this stage.
    pub fn status_str(&self) -> &'static str {
        match self {
            VerificationState::Unverified => "none",
            VerificationState::Pending(_) => "pending",
            VerificationState::Review(_) => "review",
            VerificationState::Approved(_) => "approved",
            VerificationState::Rejected(_) => "rejected",
            VerificationState::Expired(_) => "expired",
        }
    }

    /// Whether the user currently counts as verified.
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationState::Approved(_))
    }

    /// Whether a provider session is in flight (`pending` or `review`).
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            VerificationState::Pending(_) | VerificationState::Review(_)
        )
    }

    /// Whether the stage is terminal for its session: `approved`/`rejected`
    /// are not overridable by later non-manual events.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            VerificationState::Approved(_) | VerificationState::Rejected(_)
        )
    }

    /// The provider session correlated with this state, if any.
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            VerificationState::Unverified => None,
            VerificationState::Pending(p) => Some(&p.session_id),
            VerificationState::Review(r) => Some(&r.session_id),
            VerificationState::Approved(a) => Some(&a.session_id),
            VerificationState::Rejected(r) => Some(&r.session_id),
            VerificationState::Expired(e) => Some(&e.session_id),
        }
    }

    /// The provider that owns this state, if any.
    pub fn provider(&self) -> Option<ProviderKind> {
        match self {
            VerificationState::Unverified => None,
            VerificationState::Pending(p) => Some(p.provider),
            VerificationState::Review(r) => Some(r.provider),
            VerificationState::Approved(a) => Some(a.provider),
            VerificationState::Rejected(r) => Some(r.provider),
            VerificationState::Expired(e) => Some(e.provider),
        }
    }
}

/// A user's verification state as stored, with the version counter used for
/// compare-and-set writes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub user_id: UserId,
    /// Monotonically increasing; a CAS write must name the version it read.
    pub version: u64,
    pub state: VerificationState,
}

impl StateRecord {
    /// The implicit record every account starts with.
    pub fn unverified(user_id: UserId) -> Self {
        Self {
            user_id,
            version: 0,
            state: VerificationState::Unverified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> VerificationState {
        VerificationState::Pending(PendingSession {
            provider: ProviderKind::Veriff,
            session_id: SessionId::new("sess-1"),
            session_url: "https://verify.example/s/1".into(),
            started_at: Timestamp::from_secs(100),
        })
    }

    #[test]
    fn status_strings_match_wire_vocabulary() {
        assert_eq!(VerificationState::Unverified.status_str(), "none");
        assert_eq!(pending().status_str(), "pending");
    }

    #[test]
    fn serde_tag_is_the_status_field() {
        let json = serde_json::to_value(pending()).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["session_id"], "sess-1");

        let none = serde_json::to_value(VerificationState::Unverified).unwrap();
        assert_eq!(none["status"], "none");
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = VerificationState::Approved(ApprovedVerification {
            provider: ProviderKind::Persona,
            session_id: SessionId::new("sess-2"),
            started_at: Timestamp::from_secs(100),
            verified_at: Timestamp::from_secs(200),
            risk_score: Some(0.12),
            reason: None,
            manual: Some(ManualReview {
                reviewed_by: "admin-7".into(),
                reason: Some("documents re-checked".into()),
            }),
        });
        let json = serde_json::to_string(&state).unwrap();
        let back: VerificationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn terminal_and_in_flight_partition_the_stages() {
        assert!(pending().is_in_flight());
        assert!(!pending().is_terminal());
        assert!(!VerificationState::Unverified.is_in_flight());

        let rejected = VerificationState::Rejected(RejectedVerification {
            provider: ProviderKind::Yoti,
            session_id: SessionId::new("sess-3"),
            started_at: Timestamp::EPOCH,
            decided_at: Timestamp::from_secs(5),
            risk_score: None,
            reason: Some("document unreadable".into()),
            manual: None,
        });
        assert!(rejected.is_terminal());
        assert!(!rejected.is_verified());
    }

    #[test]
    fn unverified_record_starts_at_version_zero() {
        let record = StateRecord::unverified(UserId::new("u-1"));
        assert_eq!(record.version, 0);
        assert_eq!(record.state, VerificationState::Unverified);
    }
}
