//! Service configuration with TOML file support.

use agegate_providers::ProvidersConfig;
use agegate_types::ProviderKind;
use agegate_verification::RateLimitConfig;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Configuration for the agegate service.
///
/// Can be loaded from a TOML file via [`ServiceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Address to bind the HTTP listener to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// HTTP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL of this service; providers call back to
    /// `<public_base_url>/verify/webhook`.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Which provider new verification sessions are created with.
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,

    /// Verification starts allowed per client within the window.
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    /// Sliding rate-limit window in milliseconds.
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,

    /// Lifetime of signed media references, in seconds.
    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,

    /// Base URL signed media references point at.
    #[serde(default = "default_media_base_url")]
    pub media_base_url: String,

    /// Secret the media host shares for URL signatures.
    #[serde(default)]
    pub media_signing_secret: String,

    /// Token required by `/verify/manual`. Empty disables the endpoint.
    #[serde(default)]
    pub admin_token: String,

    /// Pending sessions older than this are swept to `expired`.
    #[serde(default = "default_session_max_age_secs")]
    pub session_max_age_secs: u64,

    /// How often the expiry sweep runs.
    #[serde(default = "default_expiry_sweep_interval_secs")]
    pub expiry_sweep_interval_secs: u64,

    /// How many audit entries `/verify/status` returns.
    #[serde(default = "default_status_log_limit")]
    pub status_log_limit: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to expose the Prometheus `/metrics` endpoint.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Per-provider credentials. Providers without credentials are not
    /// registered at all. Last field so the TOML tables serialize after
    /// the scalar options.
    #[serde(default)]
    pub providers: ProvidersConfig,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8430
}

fn default_public_base_url() -> String {
    "http://localhost:8430".to_string()
}

fn default_provider() -> ProviderKind {
    ProviderKind::Veriff
}

fn default_rate_limit_max_requests() -> u32 {
    5
}

fn default_rate_limit_window_ms() -> u64 {
    3_600_000
}

fn default_signed_url_ttl_secs() -> u64 {
    3600
}

fn default_media_base_url() -> String {
    "http://localhost:8430/media".to_string()
}

fn default_session_max_age_secs() -> u64 {
    7 * 24 * 3600
}

fn default_expiry_sweep_interval_secs() -> u64 {
    3600
}

fn default_status_log_limit() -> usize {
    20
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ApiError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ApiError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ApiError> {
        toml::from_str(s).map_err(|e| ApiError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("ServiceConfig is always serializable to TOML")
    }

    /// The absolute webhook URL handed to providers.
    pub fn callback_url(&self) -> String {
        format!(
            "{}/verify/webhook",
            self.public_base_url.trim_end_matches('/')
        )
    }

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        RateLimitConfig {
            max_requests: self.rate_limit_max_requests,
            window_millis: self.rate_limit_window_ms,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            public_base_url: default_public_base_url(),
            provider: default_provider(),
            providers: ProvidersConfig::default(),
            rate_limit_max_requests: default_rate_limit_max_requests(),
            rate_limit_window_ms: default_rate_limit_window_ms(),
            signed_url_ttl_secs: default_signed_url_ttl_secs(),
            media_base_url: default_media_base_url(),
            media_signing_secret: String::new(),
            admin_token: String::new(),
            session_max_age_secs: default_session_max_age_secs(),
            expiry_sweep_interval_secs: default_expiry_sweep_interval_secs(),
            status_log_limit: default_status_log_limit(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ServiceConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = ServiceConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.port, config.port);
        assert_eq!(parsed.rate_limit_max_requests, config.rate_limit_max_requests);
        assert_eq!(parsed.provider, ProviderKind::Veriff);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.port, 8430);
        assert_eq!(config.rate_limit_max_requests, 5);
        assert_eq!(config.rate_limit_window_ms, 3_600_000);
        assert_eq!(config.signed_url_ttl_secs, 3600);
        assert_eq!(config.log_format, "human");
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            port = 9000
            provider = "persona"
            rate_limit_max_requests = 10

            [providers.persona]
            api_key = "k"
            secret = "s"
        "#;
        let config = ServiceConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.port, 9000);
        assert_eq!(config.provider, ProviderKind::Persona);
        assert_eq!(config.rate_limit_max_requests, 10);
        assert_eq!(config.log_level, "info"); // default
        assert!(config.providers.persona.is_some());
        assert!(config.providers.veriff.is_none());
    }

    #[test]
    fn callback_url_strips_trailing_slash() {
        let mut config = ServiceConfig::default();
        config.public_base_url = "https://shop.example/".into();
        assert_eq!(config.callback_url(), "https://shop.example/verify/webhook");
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = ServiceConfig::from_toml_file("/nonexistent/agegate.toml");
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[test]
    fn config_file_loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 1234").unwrap();
        let config = ServiceConfig::from_toml_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.port, 1234);
    }
}
