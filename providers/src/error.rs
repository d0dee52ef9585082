use agegate_types::ProviderKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider configuration error: {0}")]
    Config(String),

    #[error("provider {0} is not configured")]
    NotConfigured(ProviderKind),

    #[error("provider API error: {0}")]
    Api(String),
}
