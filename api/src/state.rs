//! Shared application state handed to every handler.

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::metrics::ApiMetrics;
use agegate_assets::{AccessGate, HmacUrlSigner};
use agegate_providers::ProviderRegistry;
use agegate_store::{
    MemoryStore, RateLimitStore, VerificationLogStore, VerificationStateStore,
};
use agegate_verification::{RateLimiter, VerificationOrchestrator};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<VerificationOrchestrator>,
    pub registry: Arc<ProviderRegistry>,
    pub gate: Arc<AccessGate>,
    pub metrics: Arc<ApiMetrics>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    /// Assemble the service over an in-memory store. Production
    /// deployments swap the store arguments of [`AppState::assemble`] for
    /// a shared backend; the rate-limit counters in particular must be
    /// shared across instances for the cap to mean anything.
    pub fn from_config(config: ServiceConfig) -> Result<Self, ApiError> {
        let store = Arc::new(MemoryStore::new());
        let registry = ProviderRegistry::from_config(config.provider, &config.providers)
            .map_err(|e| ApiError::Config(e.to_string()))?;
        Self::assemble(config, store.clone(), store.clone(), store, registry)
    }

    /// Wire the orchestrator, gate, and registry over explicit store
    /// handles.
    pub fn assemble(
        config: ServiceConfig,
        states: Arc<dyn VerificationStateStore>,
        logs: Arc<dyn VerificationLogStore>,
        rate_counters: Arc<dyn RateLimitStore>,
        registry: ProviderRegistry,
    ) -> Result<Self, ApiError> {
        let signer = HmacUrlSigner::new(&config.media_base_url, &config.media_signing_secret)
            .map_err(|e| ApiError::Config(e.to_string()))?;

        let gate = AccessGate::new(
            states.clone(),
            Arc::new(signer),
            config.signed_url_ttl_secs,
        );

        let orchestrator = VerificationOrchestrator::new(
            states,
            logs,
            registry.active(),
            RateLimiter::new(rate_counters, config.rate_limit_config()),
            config.callback_url(),
        );

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            registry: Arc::new(registry),
            gate: Arc::new(gate),
            metrics: Arc::new(ApiMetrics::new()),
            config: Arc::new(config),
        })
    }
}
