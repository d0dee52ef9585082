//! Identity provider adapters.
//!
//! Each third-party provider (Veriff, Persona, Yoti) is hidden behind the
//! [`IdentityProvider`] trait: create a remote session, parse a webhook
//! payload into the canonical event, verify a webhook signature. The rest
//! of the system depends only on the canonical shapes — adding a provider
//! touches this crate alone.

pub mod adapter;
pub mod config;
pub mod error;
pub mod persona;
pub mod registry;
pub mod signature;
pub mod veriff;
pub mod yoti;

pub use adapter::{IdentityProvider, RemoteSession, SessionRequest};
pub use config::{ProviderCredentials, ProvidersConfig};
pub use error::ProviderError;
pub use persona::PersonaProvider;
pub use registry::ProviderRegistry;
pub use veriff::VeriffProvider;
pub use yoti::YotiProvider;
