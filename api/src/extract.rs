//! Request extractors for caller identity and request metadata.
//!
//! The session framework fronting this service is an external
//! collaborator: it authenticates the browser session and injects
//! `X-Authenticated-User` (and optionally `X-Authenticated-Email`) before
//! proxying. Requests arriving without that identity are unauthenticated.

use crate::error::ApiError;
use crate::state::AppState;
use agegate_types::{RequestContext, UserId};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

/// Identity header injected by the fronting session proxy.
pub const AUTH_USER_HEADER: &str = "x-authenticated-user";
/// Optional email header injected alongside the identity.
pub const AUTH_EMAIL_HEADER: &str = "x-authenticated-email";
/// Token header required for admin-only routes.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
}

/// The authenticated end user behind this request.
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = header_str(parts, AUTH_USER_HEADER).ok_or(ApiError::Unauthenticated)?;
        let email = header_str(parts, AUTH_EMAIL_HEADER).unwrap_or_default();
        Ok(AuthenticatedUser {
            user_id: UserId::new(user),
            email: email.to_string(),
        })
    }
}

/// An operator authorized for the admin surface: authenticated identity
/// plus the configured admin token. An empty configured token disables
/// admin routes entirely.
pub struct AdminIdentity(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AdminIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = header_str(parts, AUTH_USER_HEADER).ok_or(ApiError::Unauthenticated)?;
        let expected = &state.config.admin_token;
        let token = header_str(parts, ADMIN_TOKEN_HEADER).unwrap_or_default();
        if expected.is_empty() || token != expected {
            return Err(ApiError::AdminForbidden);
        }
        Ok(AdminIdentity(user.to_string()))
    }
}

/// Client metadata for audit records: IP from the proxy's
/// `X-Forwarded-For` (first hop) and the user agent.
pub struct RequestMeta(pub RequestContext);

#[async_trait]
impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = header_str(parts, "x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(|s| s.trim().to_string());
        let user_agent = header_str(parts, "user-agent").map(|s| s.to_string());
        Ok(RequestMeta(RequestContext {
            ip_address: ip,
            user_agent,
        }))
    }
}
