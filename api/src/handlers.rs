//! Request handlers.

use crate::error::ApiError;
use crate::extract::{AdminIdentity, AuthenticatedUser, RequestMeta};
use crate::state::AppState;
use agegate_assets::SignedReference;
use agegate_providers::{
    persona::PERSONA_SIGNATURE_HEADER, veriff::VERIFF_SIGNATURE_HEADER,
    yoti::YOTI_SIGNATURE_HEADER,
};
use agegate_types::{ProviderKind, Timestamp, UserId};
use agegate_verification::{ManualAction, StatusReport, VerificationError};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use prometheus::TextEncoder;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

/// Header a provider (or its webhook configuration) uses to advertise
/// which adapter should handle the callback. Only selects the
/// verification algorithm — trust comes from the signature check.
pub const PROVIDER_HEADER: &str = "x-verification-provider";

/// Fallback signature header checked when the provider-specific one is
/// absent.
const GENERIC_SIGNATURE_HEADER: &str = "x-signature";

// ── Verification ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StartResponse {
    pub session_url: String,
    pub session_id: String,
    pub provider: String,
}

#[derive(Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

#[derive(Deserialize)]
pub struct ManualRequest {
    pub user_id: String,
    pub action: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct ManualResponse {
    pub success: bool,
    pub action: String,
}

// ── Assets ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SignedAssetQuery {
    #[serde(default)]
    pub key: Option<String>,
}

// ── Operational ──────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// ── Handlers ─────────────────────────────────────────────────────────────

/// `POST /verify/start`
pub async fn start_verification(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    RequestMeta(ctx): RequestMeta,
) -> Result<Json<StartResponse>, ApiError> {
    let outcome = state
        .orchestrator
        .start(&user.user_id, &user.email, &ctx, Timestamp::now())
        .await
        .map_err(|e| {
            if matches!(e, VerificationError::RateLimitExceeded { .. }) {
                state.metrics.starts_rate_limited.inc();
            }
            ApiError::from(e)
        })?;

    state.metrics.sessions_started.inc();
    Ok(Json(StartResponse {
        session_url: outcome.session_url,
        session_id: outcome.session_id.to_string(),
        provider: outcome.provider.to_string(),
    }))
}

/// `GET /verify/status`
pub async fn verification_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<StatusReport>, ApiError> {
    let report = state
        .orchestrator
        .status(&user.user_id, state.config.status_log_limit)?;
    Ok(Json(report))
}

/// `POST /verify/webhook` — the trust boundary.
///
/// Works on the raw body bytes; the payload is not parsed as JSON until
/// its signature has been verified, and nothing reaches the orchestrator
/// otherwise. Success is returned for duplicates too, since providers
/// retry on non-2xx.
pub async fn ingest_webhook(
    State(state): State<AppState>,
    RequestMeta(ctx): RequestMeta,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let started = Instant::now();
    state.metrics.webhooks_received.inc();

    let result = process_webhook(&state, &ctx, &headers, &body);

    state
        .metrics
        .webhook_process_time_ms
        .observe(started.elapsed().as_secs_f64() * 1000.0);
    result.map(Json)
}

fn process_webhook(
    state: &AppState,
    ctx: &agegate_types::RequestContext,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<WebhookAck, ApiError> {
    let kind = match headers.get(PROVIDER_HEADER) {
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|s| s.parse::<ProviderKind>().ok())
            .ok_or(ApiError::UnknownProvider)?,
        None => state.registry.active_kind(),
    };

    let adapter = state.registry.get(kind).ok_or(ApiError::UnknownProvider)?;

    let signature = headers
        .get(signature_header(kind))
        .or_else(|| headers.get(GENERIC_SIGNATURE_HEADER))
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !adapter.verify_signature(body, signature) {
        state.metrics.webhooks_rejected_signature.inc();
        warn!(provider = %kind, ip = ctx.ip_address.as_deref(), "webhook signature rejected");
        return Err(ApiError::InvalidSignature);
    }

    let event = adapter
        .parse_webhook(body)
        .ok_or(ApiError::UnparseablePayload)?;

    match state
        .orchestrator
        .apply_webhook_event(kind, &event, ctx, Timestamp::now())
    {
        Ok(_) => Ok(WebhookAck { received: true }),
        Err(VerificationError::SessionNotFound(session)) => {
            state.metrics.webhooks_unmatched.inc();
            warn!(provider = %kind, session = %session, "webhook matched no recorded session");
            Err(ApiError::SessionNotFound)
        }
        Err(e) => Err(e.into()),
    }
}

/// The signature header each provider sends.
fn signature_header(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::Veriff => VERIFF_SIGNATURE_HEADER,
        ProviderKind::Persona => PERSONA_SIGNATURE_HEADER,
        ProviderKind::Yoti => YOTI_SIGNATURE_HEADER,
    }
}

/// `POST /verify/manual` — admin-only operator override.
pub async fn manual_override(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    RequestMeta(ctx): RequestMeta,
    Json(request): Json<ManualRequest>,
) -> Result<Json<ManualResponse>, ApiError> {
    let action = ManualAction::parse(&request.action).ok_or(ApiError::InvalidAction)?;

    state.orchestrator.apply_manual_override(
        &admin,
        &UserId::new(request.user_id),
        action,
        request.reason,
        &ctx,
        Timestamp::now(),
    )?;

    state.metrics.manual_overrides.inc();
    Ok(Json(ManualResponse {
        success: true,
        action: action.as_str().to_string(),
    }))
}

/// `GET /assets/signed?key=...`
pub async fn signed_asset(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<SignedAssetQuery>,
) -> Result<Json<SignedReference>, ApiError> {
    let key = query.key.unwrap_or_default();
    let reference = state
        .gate
        .issue(&user.user_id, &key, Timestamp::now())
        .map_err(|e| {
            if matches!(e, agegate_assets::AccessError::VerificationRequired) {
                state.metrics.access_denied.inc();
            }
            ApiError::from(e)
        })?;

    state.metrics.signed_urls_issued.inc();
    Ok(Json(reference))
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `GET /metrics` — Prometheus text exposition.
pub async fn metrics_text(State(state): State<AppState>) -> Result<String, ApiError> {
    let encoder = TextEncoder::new();
    encoder
        .encode_to_string(&state.metrics.registry.gather())
        .map_err(|e| ApiError::Internal(e.to_string()))
}
