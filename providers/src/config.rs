//! Provider credential configuration.

use serde::{Deserialize, Serialize};

/// API credentials for one provider. `base_url` overrides the provider's
/// production endpoint (sandbox environments, tests).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub api_key: String,
    pub secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderCredentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Credentials per provider; providers left unset are simply not
/// registered and cannot verify webhooks or open sessions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub veriff: Option<ProviderCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<ProviderCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yoti: Option<ProviderCredentials>,
}
