//! The provider adapter seam.

use crate::error::ProviderError;
use agegate_types::{CanonicalEvent, ProviderKind, SessionId, UserId};
use async_trait::async_trait;
use std::time::Duration;

/// Timeout applied to every outbound provider call. A timeout surfaces as
/// [`ProviderError::Api`]; no local state is written until the remote
/// session is confirmed.
pub const PROVIDER_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// What the orchestrator sends a provider to open a remote session.
#[derive(Clone, Debug)]
pub struct SessionRequest {
    pub user_id: UserId,
    pub email: String,
    /// Absolute URL of this service's webhook endpoint.
    pub callback_url: String,
}

/// The canonical result of creating a remote session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteSession {
    pub session_id: SessionId,
    /// Where the user completes the provider's verification flow.
    pub session_url: String,
}

/// One identity provider's capability set.
///
/// Adapters are selected by configuration, never special-cased at call
/// sites. Signature verification always runs over the exact raw payload
/// bytes — re-serialized JSON would not match the provider's MAC.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Create a remote verification session for a user. The request carries
    /// the webhook callback URL and the user id in the provider's
    /// vendor/reference field for later correlation.
    async fn create_session(&self, request: &SessionRequest)
        -> Result<RemoteSession, ProviderError>;

    /// Map a raw webhook payload onto the canonical event. Returns `None`
    /// when the payload shape is unrecognized (missing identifying fields).
    /// Status strings the adapter does not know map to
    /// `CanonicalStatus::Review`, never to `Approved`.
    fn parse_webhook(&self, raw: &[u8]) -> Option<CanonicalEvent>;

    /// Verify the provider's signature header against the raw payload
    /// bytes. A missing or empty secret makes this `false`, never `true`.
    fn verify_signature(&self, raw: &[u8], signature_header: &str) -> bool;
}
