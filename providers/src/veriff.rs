//! Veriff adapter.
//!
//! Sessions are created against the station API; decision webhooks carry a
//! `verification` object and are signed with a hex HMAC-SHA256 of the raw
//! body in the `X-HMAC-SIGNATURE` header.

use crate::adapter::{IdentityProvider, RemoteSession, SessionRequest, PROVIDER_HTTP_TIMEOUT};
use crate::config::ProviderCredentials;
use crate::error::ProviderError;
use crate::signature::verify_hmac_sha256_hex;
use agegate_types::{CanonicalEvent, CanonicalStatus, ProviderKind, SessionId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default Veriff station API endpoint.
const VERIFF_BASE_URL: &str = "https://stationapi.veriff.com";

/// Header carrying Veriff's webhook signature.
pub const VERIFF_SIGNATURE_HEADER: &str = "x-hmac-signature";

#[derive(Debug)]
pub struct VeriffProvider {
    api_key: String,
    secret: String,
    base_url: String,
    client: reqwest::Client,
}

impl VeriffProvider {
    pub fn new(credentials: ProviderCredentials) -> Result<Self, ProviderError> {
        if credentials.api_key.is_empty() || credentials.secret.is_empty() {
            return Err(ProviderError::Config(
                "veriff requires api_key and secret".into(),
            ));
        }
        Ok(Self {
            api_key: credentials.api_key,
            secret: credentials.secret,
            base_url: credentials
                .base_url
                .unwrap_or_else(|| VERIFF_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// Map Veriff's decision vocabulary onto the canonical set.
    /// Anything unrecognized goes to `Review` — never `Approved`.
    fn map_status(status: &str) -> CanonicalStatus {
        match status.to_ascii_lowercase().as_str() {
            "approved" => CanonicalStatus::Approved,
            "declined" => CanonicalStatus::Rejected,
            "resubmission_requested" | "review" => CanonicalStatus::Review,
            _ => CanonicalStatus::Review,
        }
    }
}

#[derive(Serialize)]
struct CreateSessionBody<'a> {
    verification: CreateSessionVerification<'a>,
}

#[derive(Serialize)]
struct CreateSessionVerification<'a> {
    callback: &'a str,
    person: CreateSessionPerson<'a>,
    #[serde(rename = "vendorData")]
    vendor_data: &'a str,
}

#[derive(Serialize)]
struct CreateSessionPerson<'a> {
    email: &'a str,
}

#[derive(Deserialize)]
struct CreateSessionResponse {
    verification: CreatedVerification,
}

#[derive(Deserialize)]
struct CreatedVerification {
    id: String,
    url: String,
}

#[derive(Deserialize)]
struct DecisionWebhook {
    verification: DecisionPayload,
}

#[derive(Deserialize)]
struct DecisionPayload {
    id: String,
    status: String,
    #[serde(default, rename = "riskScore")]
    risk_score: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
}

#[async_trait]
impl IdentityProvider for VeriffProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Veriff
    }

    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<RemoteSession, ProviderError> {
        let body = CreateSessionBody {
            verification: CreateSessionVerification {
                callback: &request.callback_url,
                person: CreateSessionPerson {
                    email: &request.email,
                },
                vendor_data: request.user_id.as_str(),
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/sessions", self.base_url))
            .timeout(PROVIDER_HTTP_TIMEOUT)
            .header("X-AUTH-CLIENT", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Api(format!("veriff session create: {e}")))?;

        if !response.status().is_success() {
            return Err(ProviderError::Api(format!(
                "veriff session create returned HTTP {}",
                response.status()
            )));
        }

        let parsed: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Api(format!("veriff session response: {e}")))?;

        Ok(RemoteSession {
            session_id: SessionId::new(parsed.verification.id),
            session_url: parsed.verification.url,
        })
    }

    fn parse_webhook(&self, raw: &[u8]) -> Option<CanonicalEvent> {
        let webhook: DecisionWebhook = serde_json::from_slice(raw).ok()?;
        let decision = webhook.verification;
        Some(CanonicalEvent {
            session_id: SessionId::new(decision.id),
            status: Self::map_status(&decision.status),
            risk_score: decision.risk_score,
            reason: decision.reason,
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
    use proptest::prelude::*;

    fn provider() -> VeriffProvider {
        VeriffProvider::new(ProviderCredentials::new("key", "webhook-secret")).unwrap()
    }

    #[test]
    fn missing_credentials_is_a_config_error() {
        let err = VeriffProvider::new(ProviderCredentials::new("", "")).unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[test]
    fn decision_statuses_map_onto_canonical_set() {
        assert_eq!(VeriffProvider::map_status("approved"), CanonicalStatus::Approved);
        assert_eq!(VeriffProvider::map_status("declined"), CanonicalStatus::Rejected);
        assert_eq!(
            VeriffProvider::map_status("resubmission_requested"),
            CanonicalStatus::Review
        );
        assert_eq!(VeriffProvider::map_status("review"), CanonicalStatus::Review);
    }

    #[test]
    fn unknown_status_fails_safe_to_review() {
        assert_eq!(VeriffProvider::map_status("expired"), CanonicalStatus::Review);
        assert_eq!(VeriffProvider::map_status("abandoned"), CanonicalStatus::Review);
        assert_eq!(VeriffProvider::map_status(""), CanonicalStatus::Review);
    }

    #[test]
    fn parse_webhook_extracts_canonical_event() {
        let payload = br#"{
            "status": "success",
            "verification": {
                "id": "sess-123",
                "status": "approved",
                "riskScore": 0.07,
                "vendorData": "u-1"
            }
        }"#;
        let event = provider().parse_webhook(payload).unwrap();
        assert_eq!(event.session_id, SessionId::new("sess-123"));
        assert_eq!(event.status, CanonicalStatus::Approved);
        assert_eq!(event.risk_score, Some(0.07));
    }

    #[test]
    fn unrecognized_shape_parses_to_none() {
        assert!(provider().parse_webhook(b"{}").is_none());
        assert!(provider().parse_webhook(b"not json").is_none());
        assert!(provider()
            .parse_webhook(br#"{"verification":{"status":"approved"}}"#)
            .is_none());
    }

    #[test]
    fn signature_verifies_over_raw_bytes() {
        let body = br#"{"verification":{"id":"s","status":"approved"}}"#;
        let sig = hmac_sha256_hex("webhook-secret", body);
        assert!(provider().verify_signature(body, &sig));
        assert!(!provider().verify_signature(b"tampered", &sig));
        assert!(!provider().verify_signature(body, "deadbeef"));
    }

    proptest! {
        /// The fail-safe mapping invariant: no status string outside the
        /// explicitly approved/rejected vocabulary ever maps to Approved.
        #[test]
        fn arbitrary_statuses_never_map_to_approved(status in "\\PC*") {
            prop_assume!(status.to_ascii_lowercase() != "approved");
            prop_assert_ne!(VeriffProvider::map_status(&status), CanonicalStatus::Approved);
        }
    }
}
