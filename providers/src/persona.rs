//! Persona adapter.
//!
//! Inquiries are created over the REST API with bearer auth; webhook events
//! nest the inquiry under `data.attributes.payload`. Signatures arrive as
//! `Persona-Signature: t=<unix>,v1=<hex>` where `v1` is HMAC-SHA256 over
//! `"<t>.<raw body>"`.

use crate::adapter::{IdentityProvider, RemoteSession, SessionRequest, PROVIDER_HTTP_TIMEOUT};
use crate::config::ProviderCredentials;
use crate::error::ProviderError;
use crate::signature::verify_hmac_sha256_hex;
use agegate_types::{CanonicalEvent, CanonicalStatus, ProviderKind, SessionId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default Persona API endpoint.
const PERSONA_BASE_URL: &str = "https://withpersona.com";

/// Hosted flow the user is sent to for a created inquiry.
const PERSONA_INQUIRY_URL: &str = "https://inquiry.withpersona.com/verify";

/// Header carrying Persona's webhook signature.
pub const PERSONA_SIGNATURE_HEADER: &str = "persona-signature";

pub struct PersonaProvider {
    api_key: String,
    secret: String,
    base_url: String,
    client: reqwest::Client,
}

impl PersonaProvider {
    pub fn new(credentials: ProviderCredentials) -> Result<Self, ProviderError> {
        if credentials.api_key.is_empty() || credentials.secret.is_empty() {
            return Err(ProviderError::Config(
                "persona requires api_key and secret".into(),
            ));
        }
        Ok(Self {
            api_key: credentials.api_key,
            secret: credentials.secret,
            base_url: credentials
                .base_url
                .unwrap_or_else(|| PERSONA_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        })
    }

    /// Map Persona's inquiry statuses onto the canonical set; unknown
    /// vocabulary goes to `Review`.
    fn map_status(status: &str) -> CanonicalStatus {
        match status.to_ascii_lowercase().as_str() {
            "completed" | "approved" => CanonicalStatus::Approved,
            "declined" | "failed" => CanonicalStatus::Rejected,
            "needs_review" | "needs-review" | "marked-for-review" => CanonicalStatus::Review,
            _ => CanonicalStatus::Review,
        }
    }
}

#[derive(Serialize)]
struct CreateInquiryBody<'a> {
    data: CreateInquiryData<'a>,
}

#[derive(Serialize)]
struct CreateInquiryData<'a> {
    attributes: CreateInquiryAttributes<'a>,
}

#[derive(Serialize)]
struct CreateInquiryAttributes<'a> {
    #[serde(rename = "reference-id")]
    reference_id: &'a str,
    #[serde(rename = "email-address")]
    email_address: &'a str,
    #[serde(rename = "webhook-url")]
    webhook_url: &'a str,
}

#[derive(Deserialize)]
struct CreateInquiryResponse {
    data: CreatedInquiry,
}

#[derive(Deserialize)]
struct CreatedInquiry {
    id: String,
}

#[derive(Deserialize)]
struct PersonaWebhook {
    data: PersonaEventData,
}

#[derive(Deserialize)]
struct PersonaEventData {
    attributes: PersonaEventAttributes,
}

#[derive(Deserialize)]
struct PersonaEventAttributes {
    payload: PersonaPayload,
}

#[derive(Deserialize)]
struct PersonaPayload {
    data: PersonaInquiry,
}

#[derive(Deserialize)]
struct PersonaInquiry {
    id: String,
    attributes: PersonaInquiryAttributes,
}

#[derive(Deserialize)]
struct PersonaInquiryAttributes {
    status: String,
    #[serde(default, rename = "risk-score")]
    risk_score: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
}

#[async_trait]
impl IdentityProvider for PersonaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Persona
    }

    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<RemoteSession, ProviderError> {
        let body = CreateInquiryBody {
            data: CreateInquiryData {
                attributes: CreateInquiryAttributes {
                    reference_id: request.user_id.as_str(),
                    email_address: &request.email,
                    webhook_url: &request.callback_url,
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/api/v1/inquiries", self.base_url))
            .timeout(PROVIDER_HTTP_TIMEOUT)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Api(format!("persona inquiry create: {e}")))?;

        if !response.status().is_success() {
            return Err(ProviderError::Api(format!(
                "persona inquiry create returned HTTP {}",
                response.status()
            )));
        }

        let parsed: CreateInquiryResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Api(format!("persona inquiry response: {e}")))?;

        let session_url = format!("{}?inquiry-id={}", PERSONA_INQUIRY_URL, parsed.data.id);
        Ok(RemoteSession {
            session_id: SessionId::new(parsed.data.id),
            session_url,
        })
    }

    fn parse_webhook(&self, raw: &[u8]) -> Option<CanonicalEvent> {
        let webhook: PersonaWebhook = serde_json::from_slice(raw).ok()?;
        let inquiry = webhook.data.attributes.payload.data;
        Some(CanonicalEvent {
            session_id: SessionId::new(inquiry.id),
            status: Self::map_status(&inquiry.attributes.status),
            risk_score: inquiry.attributes.risk_score,
            reason: inquiry.attributes.reason,
        })
    }

    fn verify_signature(&self, raw: &[u8], signature_header: &str) -> bool {
        if self.secret.is_empty() {
            return false;
        }

        let mut timestamp = None;
        let mut v1 = None;
        for part in signature_header.split(',') {
            let part = part.trim();
            if let Some(value) = part.strip_prefix("t=") {
                timestamp = Some(value);
            } else if let Some(value) = part.strip_prefix("v1=") {
                v1 = Some(value);
            }
        }
        let (Some(timestamp), Some(v1)) = (timestamp, v1) else {
            return false;
        };

        // The MAC covers "<t>.<raw>" so the timestamp cannot be swapped.
        let mut message = Vec::with_capacity(timestamp.len() + 1 + raw.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.push(b'.');
        message.extend_from_slice(raw);
        verify_hmac_sha256_hex(&self.secret, &message, v1)
    }
}
