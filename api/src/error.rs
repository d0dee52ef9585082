//! API error taxonomy and its HTTP mapping.
//!
//! Every user-visible failure carries a stable snake_case code; raw
//! upstream provider text never leaves the process (it goes to the logs).

use agegate_assets::AccessError;
use agegate_providers::ProviderError;
use agegate_verification::VerificationError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request is not authenticated")]
    Unauthenticated,

    #[error("admin access denied")]
    AdminForbidden,

    #[error("user is already verified")]
    AlreadyVerified,

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("webhook signature is invalid")]
    InvalidSignature,

    #[error("webhook payload is not recognized")]
    UnparseablePayload,

    #[error("no verification session matches the event")]
    SessionNotFound,

    #[error("unknown provider")]
    UnknownProvider,

    #[error("invalid manual action")]
    InvalidAction,

    #[error("user has no verification to review")]
    NothingToReview,

    #[error("verification required")]
    VerificationRequired,

    #[error("asset key is required")]
    AssetKeyMissing,

    #[error("identity provider unavailable")]
    ProviderUnavailable,

    #[error("signing backend unavailable")]
    SigningFailed,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Stable machine-readable code surfaced in response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthenticated => "unauthenticated",
            ApiError::AdminForbidden => "forbidden",
            ApiError::AlreadyVerified => "already_verified",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::InvalidSignature => "invalid_signature",
            ApiError::UnparseablePayload => "unparseable_payload",
            ApiError::SessionNotFound => "session_not_found",
            ApiError::UnknownProvider => "unknown_provider",
            ApiError::InvalidAction => "invalid_action",
            ApiError::NothingToReview => "nothing_to_review",
            ApiError::VerificationRequired => "verification_required",
            ApiError::AssetKeyMissing => "asset_key_missing",
            ApiError::ProviderUnavailable => "provider_unavailable",
            ApiError::SigningFailed => "signing_unavailable",
            ApiError::Config(_) => "configuration_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated | ApiError::InvalidSignature => StatusCode::UNAUTHORIZED,
            ApiError::AdminForbidden | ApiError::VerificationRequired => StatusCode::FORBIDDEN,
            ApiError::AlreadyVerified
            | ApiError::UnparseablePayload
            | ApiError::UnknownProvider
            | ApiError::InvalidAction
            | ApiError::NothingToReview
            | ApiError::AssetKeyMissing => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::SessionNotFound => StatusCode::NOT_FOUND,
            ApiError::ProviderUnavailable | ApiError::SigningFailed => StatusCode::BAD_GATEWAY,
            ApiError::Config(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }

        let body = match &self {
            ApiError::RateLimited { retry_after_secs } => serde_json::json!({
                "error": self.code(),
                "retry_after_secs": retry_after_secs,
            }),
            _ => serde_json::json!({ "error": self.code() }),
        };

        let mut response = (status, Json(body)).into_response();
        if let ApiError::RateLimited { retry_after_secs } = &self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<VerificationError> for ApiError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::AlreadyVerified(_) => ApiError::AlreadyVerified,
            VerificationError::RateLimitExceeded { retry_after_secs } => {
                ApiError::RateLimited { retry_after_secs }
            }
            VerificationError::SessionNotFound(_) => ApiError::SessionNotFound,
            VerificationError::NothingToReview(_) => ApiError::NothingToReview,
            VerificationError::Provider(ProviderError::Api(detail)) => {
                tracing::error!(error = %detail, "provider call failed");
                ApiError::ProviderUnavailable
            }
            VerificationError::Provider(e) => ApiError::Config(e.to_string()),
            VerificationError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AccessError> for ApiError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::AssetKeyMissing => ApiError::AssetKeyMissing,
            AccessError::VerificationRequired => ApiError::VerificationRequired,
            AccessError::SigningBackend(_) => ApiError::SigningFailed,
            AccessError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}
