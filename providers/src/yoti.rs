//! Yoti adapter.
//!
//! Sessions are created against the identity-verification API; completion
//! webhooks carry a flat `session_id`/`state` payload signed with a hex
//! HMAC-SHA256 of the raw body in the `X-Yoti-Signature` header.

use crate::adapter::{IdentityProvider, RemoteSession, SessionRequest, PROVIDER_HTTP_TIMEOUT};
use crate::config::ProviderCredentials;
use crate::error::ProviderError;
use crate::signature::verify_hmac_sha256_hex;
use agegate_types::{CanonicalEvent, CanonicalStatus, ProviderKind, SessionId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default Yoti API endpoint.
const YOTI_BASE_URL: &str = "https://api.yoti.com";

/// Header carrying Yoti's webhook signature.
pub const YOTI_SIGNATURE_HEADER: &str = "x-yoti-signature";

pub struct YotiProvider {
    api_key: String,
    secret: String,
    base_url: String,
    client: reqwest::Client,
}

impl YotiProvider {
    pub fn new(credentials: ProviderCredentials) -> Result<Self, ProviderError> {
        if credentials.api_key.is_empty() || credentials.secret.is_empty() {
            return Err(ProviderError::Config(
                "yoti requires api_key and secret".into(),
            ));
        }
        Ok(Self {
            api_key: credentials.api_key,
            secret: credentials.secret,
            base_url: credentials
                .base_url
                .unwrap_or_else(|| YOTI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// Map Yoti's recommendation states onto the canonical set; unknown
    /// vocabulary goes to `Review`.
    fn map_state(state: &str) -> CanonicalStatus {
        match state.to_ascii_uppercase().as_str() {
            "APPROVE" => CanonicalStatus::Approved,
            "REJECT" => CanonicalStatus::Rejected,
            "CONSIDER" => CanonicalStatus::Review,
            _ => CanonicalStatus::Review,
        }
    }
}

#[derive(Serialize)]
struct CreateSessionBody<'a> {
    user_tracking_id: &'a str,
    notifications: SessionNotifications<'a>,
}

#[derive(Serialize)]
struct SessionNotifications<'a> {
    endpoint: &'a str,
    topics: [&'a str; 1],
}

#[derive(Deserialize)]
struct CreateSessionResponse {
    session_id: String,
    session_url: String,
}

#[derive(Deserialize)]
struct CompletionWebhook {
    session_id: String,
    state: String,
    #[serde(default)]
    risk_score: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
}

#[async_trait]
impl IdentityProvider for YotiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Yoti
    }

    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<RemoteSession, ProviderError> {
        let body = CreateSessionBody {
            user_tracking_id: request.user_id.as_str(),
            notifications: SessionNotifications {
                endpoint: &request.callback_url,
                topics: ["session_completion"],
            },
        };

        let response = self
            .client
            .post(format!("{}/idverify/v1/sessions", self.base_url))
            .timeout(PROVIDER_HTTP_TIMEOUT)
            .header("X-Yoti-Auth-Token", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Api(format!("yoti session create: {e}")))?;

        if !response.status().is_success() {
            return Err(ProviderError::Api(format!(
                "yoti session create returned HTTP {}",
                response.status()
            )));
        }

        let parsed: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Api(format!("yoti session response: {e}")))?;

        Ok(RemoteSession {
            session_id: SessionId::new(parsed.session_id),
            session_url: parsed.session_url,
        })
    }

    fn parse_webhook(&self, raw: &[u8]) -> Option<CanonicalEvent> {
        let webhook: CompletionWebhook = serde_json::from_slice(raw).ok()?;
        Some(CanonicalEvent {
            session_id: SessionId::new(webhook.session_id),
            status: Self::map_state(&webhook.state),
            risk_score: webhook.risk_score,
            reason: webhook.reason,
        })
    }

    fn verify_signature(&self, raw: &[u8], signature_header: &str) -> bool {
        verify_hmac_sha256_hex(&self.secret, raw, signature_header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::hmac_sha256_hex;

    fn provider() -> YotiProvider {
        YotiProvider::new(ProviderCredentials::new("key", "yoti-secret")).unwrap()
    }

    #[test]
    fn states_map_onto_canonical_set() {
        assert_eq!(YotiProvider::map_state("APPROVE"), CanonicalStatus::Approved);
        assert_eq!(YotiProvider::map_state("approve"), CanonicalStatus::Approved);
        assert_eq!(YotiProvider::map_state("REJECT"), CanonicalStatus::Rejected);
        assert_eq!(YotiProvider::map_state("CONSIDER"), CanonicalStatus::Review);
        assert_eq!(YotiProvider::map_state("NOT_AVAILABLE"), CanonicalStatus::Review);
    }

    #[test]
    fn parse_webhook_reads_flat_payload() {
        let payload = br#"{"session_id":"y-77","topic":"session_completion","state":"REJECT","reason":"face mismatch"}"#;
        let event = provider().parse_webhook(payload).unwrap();
        assert_eq!(event.session_id, SessionId::new("y-77"));
        assert_eq!(event.status, CanonicalStatus::Rejected);
        assert_eq!(event.reason.as_deref(), Some("face mismatch"));
    }

    #[test]
    fn payload_without_state_is_not_recognized() {
        assert!(provider().parse_webhook(br#"{"session_id":"y-77"}"#).is_none());
    }

    #[test]
    fn signature_matches_raw_body_only() {
        let body = br#"{"session_id":"y-77","state":"APPROVE"}"#;
        let sig = hmac_sha256_hex("yoti-secret", body);
        assert!(provider().verify_signature(body, &sig));

        // Re-serialized JSON (different whitespace) must not verify.
        let reserialized = br#"{"session_id": "y-77", "state": "APPROVE"}"#;
        assert!(!provider().verify_signature(reserialized, &sig));
    }
}
