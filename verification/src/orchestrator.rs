//! Verification orchestrator — connects the rate limiter, the provider
//! adapter, and the state/log stores into the per-user verification
//! state machine.
//!
//! ```text
//! none -[start]-> pending
//! pending -[provider approved]-> approved   (terminal, verified_at set)
//! pending -[provider rejected]-> rejected
//! pending -[provider review]-> review
//! review -[manual approve]-> approved
//! review -[manual reject]-> rejected
//! rejected/expired -[start]-> pending       (re-attempt)
//! approved -[start]-> refused
//! ```
//!
//! Terminal states are sticky: once a session reaches `approved` or
//! `rejected`, later non-manual events for that session cannot move it.

use crate::error::VerificationError;
use crate::rate_limit::RateLimiter;
use agegate_providers::{IdentityProvider, SessionRequest};
use agegate_store::{StoreError, VerificationLogStore, VerificationStateStore};
use agegate_types::{
    ApprovedVerification, CanonicalEvent, CanonicalStatus, ExpiredSession, ManualReview,
    PendingSession, ProviderKind, RejectedVerification, RequestContext, ReviewCase, StateRecord,
    Timestamp, UserId, VerificationLogEntry, VerificationState,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a successful `start`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StartOutcome {
    pub session_id: agegate_types::SessionId,
    pub session_url: String,
    pub provider: ProviderKind,
    /// True when a concurrent start already created the in-flight session
    /// and this call returned it instead of forking a second one.
    #[serde(skip)]
    pub reused: bool,
}

/// What happened to a webhook event. All three are acknowledged with
/// success to the provider; only `Applied` changed state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebhookDisposition {
    Applied,
    /// Re-delivery of an event the state already reflects.
    Duplicate,
    /// Event for a superseded session, a mismatched provider, or a sticky
    /// terminal state. No mutation.
    Ignored,
}

/// Operator decision on a verification case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManualAction {
    Approve,
    Reject,
}

impl ManualAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approve" => Some(ManualAction::Approve),
            "reject" => Some(ManualAction::Reject),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ManualAction::Approve => "approve",
            ManualAction::Reject => "reject",
        }
    }
}

/// A user's verification state plus recent audit history.
#[derive(Clone, Debug, Serialize)]
pub struct StatusReport {
    pub is_verified: bool,
    pub verification: VerificationState,
    pub logs: Vec<VerificationLogEntry>,
}

/// The single writer of `VerificationState`.
pub struct VerificationOrchestrator {
    states: Arc<dyn VerificationStateStore>,
    logs: Arc<dyn VerificationLogStore>,
    provider: Arc<dyn IdentityProvider>,
    rate_limiter: RateLimiter,
    /// Absolute webhook URL handed to providers when creating sessions.
    callback_url: String,
}

impl VerificationOrchestrator {
    pub fn new(
        states: Arc<dyn VerificationStateStore>,
        logs: Arc<dyn VerificationLogStore>,
        provider: Arc<dyn IdentityProvider>,
        rate_limiter: RateLimiter,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            states,
            logs,
            provider,
            rate_limiter,
            callback_url: callback_url.into(),
        }
    }

    /// Start (or supersede) a verification session for a user.
    ///
    /// Refuses for already-verified users before the rate limiter or the
    /// provider is touched. No `pending` state is written until the
    /// provider confirms the remote session, so a provider failure leaves
    /// the user exactly where they were.
    pub async fn start(
        &self,
        user: &UserId,
        email: &str,
        ctx: &RequestContext,
        now: Timestamp,
    ) -> Result<StartOutcome, VerificationError> {
        let record = self.states.get_state(user)?;
        if record.state.is_verified() {
            return Err(VerificationError::AlreadyVerified(user.clone()));
        }

        let identifier = ctx.ip_address.as_deref().unwrap_or("unknown");
        let decision = self.rate_limiter.check_and_record(identifier, now);
        if !decision.allowed {
            let retry_millis = decision.reset_at.as_millis().saturating_sub(now.as_millis());
            return Err(VerificationError::RateLimitExceeded {
                retry_after_secs: retry_millis.div_ceil(1000),
            });
        }

        let remote = self
            .provider
            .create_session(&SessionRequest {
                user_id: user.clone(),
                email: email.to_string(),
                callback_url: self.callback_url.clone(),
            })
            .await?;

        let pending = VerificationState::Pending(PendingSession {
            provider: self.provider.kind(),
            session_id: remote.session_id.clone(),
            session_url: remote.session_url.clone(),
            started_at: now,
        });

        match self.states.put_state(user, record.version, &pending) {
            Ok(_) => {}
            Err(StoreError::Conflict { .. }) => {
                // A concurrent writer got there first. If it opened a
                // session, hand that one out rather than forking a second.
                let current = self.states.get_state(user)?;
                match current.state {
                    VerificationState::Approved(_) => {
                        return Err(VerificationError::AlreadyVerified(user.clone()));
                    }
                    VerificationState::Pending(p) => {
                        info!(user = %user, session = %p.session_id, "reusing in-flight session after concurrent start");
                        return Ok(StartOutcome {
                            session_id: p.session_id,
                            session_url: p.session_url,
                            provider: p.provider,
                            reused: true,
                        });
                    }
                    _ => {
                        self.states.put_state(user, current.version, &pending)?;
                    }
                }
            }
            Err(e) => return Err(e.into()),
        }

        self.append_log(
            user,
            self.provider.kind().as_str(),
            "started",
            "pending",
            serde_json::json!({
                "session_id": remote.session_id.as_str(),
                "session_url": remote.session_url,
            }),
            ctx,
            now,
        )?;

        Ok(StartOutcome {
            session_id: remote.session_id,
            session_url: remote.session_url,
            provider: self.provider.kind(),
            reused: false,
        })
    }

    /// Apply a canonical webhook event, already signature-verified and
    /// parsed by the adapter for `provider`.
    ///
    /// The user is resolved only through the previously-recorded session
    /// id; an unmatched event is an error, never a soft success. Applying
    /// the same event twice is safe: the re-delivery appends a log entry
    /// and leaves state untouched.
    pub fn apply_webhook_event(
        &self,
        provider: ProviderKind,
        event: &CanonicalEvent,
        ctx: &RequestContext,
        now: Timestamp,
    ) -> Result<WebhookDisposition, VerificationError> {
        let user = self
            .states
            .find_user_by_session(&event.session_id)?
            .ok_or_else(|| VerificationError::SessionNotFound(event.session_id.clone()))?;

        let record = self.states.get_state(&user)?;

        if record.state.session_id() != Some(&event.session_id) {
            warn!(user = %user, session = %event.session_id, "webhook for superseded session ignored");
            return Ok(WebhookDisposition::Ignored);
        }
        if record.state.provider() != Some(provider) {
            warn!(user = %user, session = %event.session_id, %provider, "webhook provider does not own this session, ignored");
            return Ok(WebhookDisposition::Ignored);
        }

        let next = match &record.state {
            VerificationState::Pending(p) => {
                Self::decide(p.provider, &p.session_id, p.started_at, None, event, now)
            }
            VerificationState::Review(r) => match event.status {
                // A provider re-decision resolves the review case.
                CanonicalStatus::Approved | CanonicalStatus::Rejected => Self::decide(
                    r.provider,
                    &r.session_id,
                    r.started_at,
                    r.risk_score,
                    event,
                    now,
                ),
                CanonicalStatus::Review => {
                    self.log_event(&user, &record.state, event, ctx, now)?;
                    return Ok(WebhookDisposition::Duplicate);
                }
            },
            VerificationState::Approved(_) | VerificationState::Rejected(_) => {
                if record.state.status_str() == event.status.as_str() {
                    self.log_event(&user, &record.state, event, ctx, now)?;
                    return Ok(WebhookDisposition::Duplicate);
                }
                warn!(user = %user, session = %event.session_id, status = event.status.as_str(),
                    "event for terminal state ignored");
                return Ok(WebhookDisposition::Ignored);
            }
            VerificationState::Expired(_) => {
                warn!(user = %user, session = %event.session_id, "late event for expired session ignored");
                return Ok(WebhookDisposition::Ignored);
            }
            VerificationState::Unverified => {
                // The session index never points at an unverified record.
                return Err(VerificationError::SessionNotFound(event.session_id.clone()));
            }
        };

        self.states.put_state(&user, record.version, &next)?;
        self.log_event(&user, &next, event, ctx, now)?;
        Ok(WebhookDisposition::Applied)
    }

    /// Build the post-event state for an in-flight session.
    fn decide(
        provider: ProviderKind,
        session_id: &agegate_types::SessionId,
        started_at: Timestamp,
        prior_risk: Option<f64>,
        event: &CanonicalEvent,
        now: Timestamp,
    ) -> VerificationState {
        let risk_score = event.risk_score.or(prior_risk);
        match event.status {
            CanonicalStatus::Approved => VerificationState::Approved(ApprovedVerification {
                provider,
                session_id: session_id.clone(),
                started_at,
                verified_at: now,
                risk_score,
                reason: event.reason.clone(),
                manual: None,
            }),
            CanonicalStatus::Rejected => VerificationState::Rejected(RejectedVerification {
                provider,
                session_id: session_id.clone(),
                started_at,
                decided_at: now,
                risk_score,
                reason: event.reason.clone(),
                manual: None,
            }),
            CanonicalStatus::Review => VerificationState::Review(ReviewCase {
                provider,
                session_id: session_id.clone(),
                started_at,
                risk_score,
                reason: event.reason.clone(),
            }),
        }
    }

    /// Apply an operator decision directly.
    ///
    /// Valid for any user with verification history; the override is
    /// stamped with the operator identity and logged under
    /// `provider = "manual"`.
    pub fn apply_manual_override(
        &self,
        admin: &str,
        user: &UserId,
        action: ManualAction,
        reason: Option<String>,
        ctx: &RequestContext,
        now: Timestamp,
    ) -> Result<VerificationState, VerificationError> {
        let record = self.states.get_state(user)?;

        let (provider, session_id, started_at, risk_score, prior_reason) = match &record.state {
            VerificationState::Unverified => {
                return Err(VerificationError::NothingToReview(user.clone()));
            }
            VerificationState::Pending(p) => {
                (p.provider, p.session_id.clone(), p.started_at, None, None)
            }
            VerificationState::Review(r) => (
                r.provider,
                r.session_id.clone(),
                r.started_at,
                r.risk_score,
                r.reason.clone(),
            ),
            VerificationState::Approved(a) => (
                a.provider,
                a.session_id.clone(),
                a.started_at,
                a.risk_score,
                a.reason.clone(),
            ),
            VerificationState::Rejected(r) => (
                r.provider,
                r.session_id.clone(),
                r.started_at,
                r.risk_score,
                r.reason.clone(),
            ),
            VerificationState::Expired(e) => {
                (e.provider, e.session_id.clone(), e.started_at, None, None)
            }
        };

        let manual = Some(ManualReview {
            reviewed_by: admin.to_string(),
            reason: reason.clone(),
        });

        let next = match action {
            ManualAction::Approve => VerificationState::Approved(ApprovedVerification {
                provider,
                session_id,
                started_at,
                verified_at: now,
                risk_score,
                reason: prior_reason,
                manual,
            }),
            ManualAction::Reject => VerificationState::Rejected(RejectedVerification {
                provider,
                session_id,
                started_at,
                decided_at: now,
                risk_score,
                reason: prior_reason,
                manual,
            }),
        };

        self.states.put_state(user, record.version, &next)?;
        self.append_log(
            user,
            "manual",
            action.as_str(),
            next.status_str(),
            serde_json::json!({
                "reviewed_by": admin,
                "reason": reason,
            }),
            ctx,
            now,
        )?;

        Ok(next)
    }

    /// Current state plus the most recent `log_limit` audit entries.
    pub fn status(&self, user: &UserId, log_limit: usize) -> Result<StatusReport, VerificationError> {
        let record = self.states.get_state(user)?;
        let logs = self.logs.for_user(user, log_limit)?;
        Ok(StatusReport {
            is_verified: record.state.is_verified(),
            verification: record.state,
            logs,
        })
    }

    /// Sweep `pending` sessions older than `max_age_millis` to `expired`.
    ///
    /// Returns how many sessions were expired. A CAS conflict means a
    /// webhook raced the sweep and won; the session is skipped.
    pub fn expire_stale_sessions(
        &self,
        max_age_millis: u64,
        now: Timestamp,
    ) -> Result<usize, VerificationError> {
        let cutoff = Timestamp::from_millis(now.as_millis().saturating_sub(max_age_millis));
        let mut expired = 0;

        for user in self.states.stale_pending_users(cutoff)? {
            let record = self.states.get_state(&user)?;
            let VerificationState::Pending(p) = &record.state else {
                continue;
            };
            if p.started_at >= cutoff {
                continue;
            }

            let next = VerificationState::Expired(ExpiredSession {
                provider: p.provider,
                session_id: p.session_id.clone(),
                started_at: p.started_at,
                expired_at: now,
            });

            match self.states.put_state(&user, record.version, &next) {
                Ok(_) => {}
                Err(StoreError::Conflict { .. }) => continue,
                Err(e) => return Err(e.into()),
            }

            self.append_log(
                &user,
                p.provider.as_str(),
                "expired",
                "expired",
                serde_json::json!({ "session_id": p.session_id.as_str() }),
                &RequestContext::empty(),
                now,
            )?;
            info!(user = %user, session = %p.session_id, "pending session expired");
            expired += 1;
        }

        Ok(expired)
    }

    fn log_event(
        &self,
        user: &UserId,
        state: &VerificationState,
        event: &CanonicalEvent,
        ctx: &RequestContext,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        let provider = state
            .provider()
            .map(|p| p.as_str())
            .unwrap_or("unknown");
        self.append_log(
            user,
            provider,
            event.status.as_str(),
            event.status.as_str(),
            serde_json::json!({
                "session_id": event.session_id.as_str(),
                "risk_score": event.risk_score,
                "reason": event.reason,
            }),
            ctx,
            now,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn append_log(
        &self,
        user: &UserId,
        provider: &str,
        event: &str,
        status: &str,
        payload: serde_json::Value,
        ctx: &RequestContext,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        self.logs.append(&VerificationLogEntry {
            user_id: user.clone(),
            provider: provider.to_string(),
            event: event.to_string(),
            status: status.to_string(),
            payload,
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
            created_at: now,
        })?;
        Ok(())
    }

    /// Read-only access to the state record, for callers that need the
    /// raw projection (the access gate reads through its own handle).
    pub fn state_record(&self, user: &UserId) -> Result<StateRecord, VerificationError> {
        Ok(self.states.get_state(user)?)
    }
}
