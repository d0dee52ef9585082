use agegate_providers::ProviderError;
use agegate_store::StoreError;
use agegate_types::{SessionId, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("user {0} is already verified")]
    AlreadyVerified(UserId),

    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("no verification session matches {0}")]
    SessionNotFound(SessionId),

    #[error("user {0} has no verification to review")]
    NothingToReview(UserId),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
