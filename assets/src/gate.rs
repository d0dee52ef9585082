//! The access gate: verification state decides who gets signed URLs.

use crate::error::AccessError;
use crate::signer::SignedUrlBackend;
use agegate_store::VerificationStateStore;
use agegate_types::{Timestamp, UserId};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

/// Default lifetime of a signed reference: one hour.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

/// A minted signed reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignedReference {
    pub url: String,
    /// Seconds until the reference stops working.
    pub expires_in: u64,
}

/// Decides, per request, whether a caller may receive a signed reference
/// to a protected asset. Only reads verification state; never mutates it.
pub struct AccessGate {
    states: Arc<dyn VerificationStateStore>,
    backend: Arc<dyn SignedUrlBackend>,
    ttl_secs: u64,
}

impl AccessGate {
    pub fn new(
        states: Arc<dyn VerificationStateStore>,
        backend: Arc<dyn SignedUrlBackend>,
        ttl_secs: u64,
    ) -> Self {
        Self {
            states,
            backend,
            ttl_secs,
        }
    }

    /// Issue a signed reference for `asset_key`, or deny.
    ///
    /// The signing backend is only consulted after the caller's state
    /// reads `approved` — denied requests never reach storage.
    pub fn issue(
        &self,
        user: &UserId,
        asset_key: &str,
        now: Timestamp,
    ) -> Result<SignedReference, AccessError> {
        if asset_key.trim().is_empty() {
            return Err(AccessError::AssetKeyMissing);
        }

        let record = self.states.get_state(user)?;
        if !record.state.is_verified() {
            warn!(user = %user, asset = asset_key, "signed reference denied, user not verified");
            return Err(AccessError::VerificationRequired);
        }

        let url = self
            .backend
            .generate_signed_reference(asset_key, self.ttl_secs, now)
            .map_err(|e| {
                error!(asset = asset_key, error = %e, "signing backend failed");
                AccessError::SigningBackend(e)
            })?;

        Ok(SignedReference {
            url,
            expires_in: self.ttl_secs,
        })
    }
}
