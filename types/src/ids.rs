//! Identifier newtypes: users, provider sessions, and provider kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identity of a user account, assigned by the (external) account system.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Opaque identifier a provider assigns to a remote verification session.
///
/// This is the correlation key between webhook events and local state:
/// webhooks are matched on it, never on identity fields in the payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The identity providers agegate can speak to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Veriff,
    Persona,
    Yoti,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] =
        [ProviderKind::Veriff, ProviderKind::Persona, ProviderKind::Yoti];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Veriff => "veriff",
            ProviderKind::Persona => "persona",
            ProviderKind::Yoti => "yoti",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown identity provider: {0}")]
pub struct UnknownProviderError(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "veriff" => Ok(ProviderKind::Veriff),
            "persona" => Ok(ProviderKind::Persona),
            "yoti" => Ok(ProviderKind::Yoti),
            other => Err(UnknownProviderError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_round_trips_through_str() {
        for kind in ProviderKind::ALL {
            let parsed: ProviderKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn provider_kind_parse_is_case_insensitive() {
        assert_eq!("VERIFF".parse::<ProviderKind>().unwrap(), ProviderKind::Veriff);
        assert_eq!("Persona".parse::<ProviderKind>().unwrap(), ProviderKind::Persona);
    }

    #[test]
    fn unknown_provider_is_an_error() {
        let err = "onfido".parse::<ProviderKind>().unwrap_err();
        assert!(err.to_string().contains("onfido"));
    }

    #[test]
    fn provider_kind_serde_uses_lowercase() {
        let json = serde_json::to_string(&ProviderKind::Yoti).unwrap();
        assert_eq!(json, "\"yoti\"");
    }

    #[test]
    fn user_and_session_ids_display_raw() {
        assert_eq!(UserId::new("u-1").to_string(), "u-1");
        assert_eq!(SessionId::new("sess-9").as_str(), "sess-9");
    }
}
