//! Prometheus metrics for the verification service.
//!
//! The [`ApiMetrics`] struct owns a dedicated [`Registry`] that the
//! `/metrics` endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry, Histogram,
    HistogramOpts, IntCounter, Opts, Registry,
};

/// Central collection of all service-level Prometheus metrics.
pub struct ApiMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Verification sessions successfully started.
    pub sessions_started: IntCounter,
    /// Start requests denied by the rate limiter.
    pub starts_rate_limited: IntCounter,
    /// Webhook requests received (before any validation).
    pub webhooks_received: IntCounter,
    /// Webhooks rejected for a bad or missing signature.
    pub webhooks_rejected_signature: IntCounter,
    /// Webhooks whose session matched no recorded state.
    pub webhooks_unmatched: IntCounter,
    /// Manual operator overrides applied.
    pub manual_overrides: IntCounter,
    /// Signed media references issued.
    pub signed_urls_issued: IntCounter,
    /// Signed-reference requests denied for lack of verification.
    pub access_denied: IntCounter,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Webhook processing time in milliseconds (signature check through
    /// state transition).
    pub webhook_process_time_ms: Histogram,
}

impl ApiMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let sessions_started = register_int_counter_with_registry!(
            Opts::new(
                "agegate_sessions_started_total",
                "Verification sessions successfully started"
            ),
            registry
        )
        .expect("failed to register sessions_started counter");

        let starts_rate_limited = register_int_counter_with_registry!(
            Opts::new(
                "agegate_starts_rate_limited_total",
                "Start requests denied by the rate limiter"
            ),
            registry
        )
        .expect("failed to register starts_rate_limited counter");

        let webhooks_received = register_int_counter_with_registry!(
            Opts::new(
                "agegate_webhooks_received_total",
                "Webhook requests received"
            ),
            registry
        )
        .expect("failed to register webhooks_received counter");

        let webhooks_rejected_signature = register_int_counter_with_registry!(
            Opts::new(
                "agegate_webhooks_rejected_signature_total",
                "Webhooks rejected for an invalid signature"
            ),
            registry
        )
        .expect("failed to register webhooks_rejected_signature counter");

        let webhooks_unmatched = register_int_counter_with_registry!(
            Opts::new(
                "agegate_webhooks_unmatched_total",
                "Webhooks whose session matched no recorded state"
            ),
            registry
        )
        .expect("failed to register webhooks_unmatched counter");

        let manual_overrides = register_int_counter_with_registry!(
            Opts::new(
                "agegate_manual_overrides_total",
                "Manual operator overrides applied"
            ),
            registry
        )
        .expect("failed to register manual_overrides counter");

        let signed_urls_issued = register_int_counter_with_registry!(
            Opts::new(
                "agegate_signed_urls_issued_total",
                "Signed media references issued"
            ),
            registry
        )
        .expect("failed to register signed_urls_issued counter");

        let access_denied = register_int_counter_with_registry!(
            Opts::new(
                "agegate_access_denied_total",
                "Signed-reference requests denied for lack of verification"
            ),
            registry
        )
        .expect("failed to register access_denied counter");

        // Exponential buckets covering 1 ms → ~4 s.
        let webhook_process_time_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "agegate_webhook_process_time_ms",
                "Webhook processing time in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(1.0, 2.0, 12).unwrap()),
            registry
        )
        .expect("failed to register webhook_process_time_ms histogram");

        Self {
            registry,
            sessions_started,
            starts_rate_limited,
            webhooks_received,
            webhooks_rejected_signature,
            webhooks_unmatched,
            manual_overrides,
            signed_urls_issued,
            access_denied,
            webhook_process_time_ms,
        }
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_increment() {
        let metrics = ApiMetrics::new();
        assert_eq!(metrics.webhooks_received.get(), 0);
        metrics.webhooks_received.inc();
        assert_eq!(metrics.webhooks_received.get(), 1);
    }

    #[test]
    fn registry_gathers_all_families() {
        let metrics = ApiMetrics::new();
        metrics.sessions_started.inc();
        let families = metrics.registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "agegate_sessions_started_total"));
    }
}
