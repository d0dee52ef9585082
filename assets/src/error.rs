use agegate_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("asset key is required")]
    AssetKeyMissing,

    #[error("verification required")]
    VerificationRequired,

    #[error("signing backend failed")]
    SigningBackend(#[source] SigningError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Failure inside a [`crate::SignedUrlBackend`]. The message describes the
/// failure mode, never credential material.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SigningError(pub String);
