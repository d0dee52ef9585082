//! Abstract storage traits for agegate.
//!
//! Every storage backend (the relational store in production, in-memory for
//! testing and single-instance runs) implements these traits. The rest of
//! the codebase depends only on the traits.

pub mod error;
pub mod log;
pub mod memory;
pub mod rate_limit;
pub mod state;

pub use error::StoreError;
pub use log::VerificationLogStore;
pub use memory::MemoryStore;
pub use rate_limit::{RateDecision, RateLimitStore};
pub use state::VerificationStateStore;
