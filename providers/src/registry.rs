//! Provider selection by configuration.

use crate::adapter::IdentityProvider;
use crate::config::ProvidersConfig;
use crate::error::ProviderError;
use crate::persona::PersonaProvider;
use crate::veriff::VeriffProvider;
use crate::yoti::YotiProvider;
use agegate_types::ProviderKind;
use std::collections::HashMap;
use std::sync::Arc;

/// All configured provider adapters plus the one that new sessions use.
///
/// Webhook handling looks adapters up by kind: a provider without
/// configured credentials is absent here, so its webhooks can never pass
/// signature verification.
pub struct ProviderRegistry {
    active: ProviderKind,
    adapters: HashMap<ProviderKind, Arc<dyn IdentityProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("active", &self.active)
            .field("adapters", &self.adapters.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    /// Build adapters for every provider with credentials. Fails when the
    /// active provider is among the unconfigured ones.
    pub fn from_config(
        active: ProviderKind,
        config: &ProvidersConfig,
    ) -> Result<Self, ProviderError> {
        let mut adapters: HashMap<ProviderKind, Arc<dyn IdentityProvider>> = HashMap::new();

        if let Some(credentials) = &config.veriff {
            adapters.insert(
                ProviderKind::Veriff,
                Arc::new(VeriffProvider::new(credentials.clone())?),
            );
        }
        if let Some(credentials) = &config.persona {
            adapters.insert(
                ProviderKind::Persona,
                Arc::new(PersonaProvider::new(credentials.clone())?),
            );
        }
        if let Some(credentials) = &config.yoti {
            adapters.insert(
                ProviderKind::Yoti,
                Arc::new(YotiProvider::new(credentials.clone())?),
            );
        }

        if !adapters.contains_key(&active) {
            return Err(ProviderError::NotConfigured(active));
        }

        Ok(Self { active, adapters })
    }

    /// A registry holding exactly one adapter, which is also the active
    /// one. Used by tests with mock adapters.
    pub fn single(adapter: Arc<dyn IdentityProvider>) -> Self {
        let active = adapter.kind();
        let mut adapters: HashMap<ProviderKind, Arc<dyn IdentityProvider>> = HashMap::new();
        adapters.insert(active, adapter);
        Self { active, adapters }
    }

    pub fn active_kind(&self) -> ProviderKind {
        self.active
    }

    /// The adapter new verification sessions are created with.
    pub fn active(&self) -> Arc<dyn IdentityProvider> {
        Arc::clone(
            self.adapters
                .get(&self.active)
                .expect("active adapter is always registered"),
        )
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn IdentityProvider>> {
        self.adapters.get(&kind).map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderCredentials;

    #[test]
    fn registry_requires_the_active_provider_to_be_configured() {
        let config = ProvidersConfig {
            veriff: Some(ProviderCredentials::new("k", "s")),
            ..Default::default()
        };

        let err = ProviderRegistry::from_config(ProviderKind::Persona, &config).unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(ProviderKind::Persona)));
    }

    #[test]
    fn unconfigured_providers_are_absent() {
        let config = ProvidersConfig {
            veriff: Some(ProviderCredentials::new("k", "s")),
            ..Default::default()
        };
        let registry = ProviderRegistry::from_config(ProviderKind::Veriff, &config).unwrap();

        assert_eq!(registry.active_kind(), ProviderKind::Veriff);
        assert!(registry.get(ProviderKind::Veriff).is_some());
        assert!(registry.get(ProviderKind::Yoti).is_none());
    }

    #[test]
    fn all_three_providers_register() {
        let config = ProvidersConfig {
            veriff: Some(ProviderCredentials::new("k1", "s1")),
            persona: Some(ProviderCredentials::new("k2", "s2")),
            yoti: Some(ProviderCredentials::new("k3", "s3")),
        };
        let registry = ProviderRegistry::from_config(ProviderKind::Yoti, &config).unwrap();
        for kind in ProviderKind::ALL {
            assert!(registry.get(kind).is_some(), "{kind} should be registered");
        }
    }
}
