//! Axum router assembly and the HTTP server.

use crate::error::ApiError;
use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Build the service router over shared state.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/verify/start", post(handlers::start_verification))
        .route("/verify/status", get(handlers::verification_status))
        .route("/verify/webhook", post(handlers::ingest_webhook))
        .route("/verify/manual", post(handlers::manual_override))
        .route("/assets/signed", get(handlers::signed_asset))
        .route("/health", get(handlers::health));

    if state.config.enable_metrics {
        router = router.route("/metrics", get(handlers::metrics_text));
    }

    router.layer(CorsLayer::permissive()).with_state(state)
}

/// The HTTP server, configured from [`AppState`].
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Bind and serve until a shutdown signal arrives.
    pub async fn start(&self) -> Result<(), ApiError> {
        let addr = format!(
            "{}:{}",
            self.state.config.bind_addr, self.state.config.port
        );
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::Internal(format!("bind {addr}: {e}")))?;
        info!("agegate API listening on {}", addr);

        axum::serve(listener, build_router(self.state.clone()))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
