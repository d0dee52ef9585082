//! Access gate for protected media.
//!
//! Verified users get signed, time-limited URLs from the object-storage
//! backend; everyone else is denied and the UI layer falls back to a
//! neutral placeholder. Nothing is cached — every call may mint a fresh
//! reference.

pub mod error;
pub mod gate;
pub mod signer;

pub use error::{AccessError, SigningError};
pub use gate::{AccessGate, SignedReference, DEFAULT_SIGNED_URL_TTL_SECS};
pub use signer::{HmacUrlSigner, SignedUrlBackend};
