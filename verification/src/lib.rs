//! Verification session orchestration.
//!
//! The orchestrator owns the per-user verification state machine: it starts
//! provider sessions, reconciles webhook events into state transitions,
//! applies manual operator overrides, and sweeps stale sessions to
//! `expired`. It is the only writer of `VerificationState`; everything else
//! reads. Session starts are guarded by a sliding-window [`RateLimiter`].

pub mod error;
pub mod orchestrator;
pub mod rate_limit;

pub use error::VerificationError;
pub use orchestrator::{
    ManualAction, StartOutcome, StatusReport, VerificationOrchestrator, WebhookDisposition,
};
pub use rate_limit::{RateLimitConfig, RateLimiter};
