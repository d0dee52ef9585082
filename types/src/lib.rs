//! Fundamental types for the agegate verification service.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: identifiers, timestamps, the verification state machine's sum
//! type, audit log entries, and the canonical provider event.

pub mod event;
pub mod ids;
pub mod log;
pub mod state;
pub mod time;

pub use event::{CanonicalEvent, CanonicalStatus};
pub use ids::{ProviderKind, SessionId, UnknownProviderError, UserId};
pub use log::{RequestContext, VerificationLogEntry};
pub use state::{
    ApprovedVerification, ExpiredSession, ManualReview, PendingSession, RejectedVerification,
    ReviewCase, StateRecord, VerificationState,
};
pub use time::Timestamp;
