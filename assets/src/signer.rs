//! Signed-URL backends.

use crate::error::SigningError;
use agegate_types::Timestamp;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The object-storage collaborator's signing capability. Implementations
/// return an absolute URL granting read access to `asset_key` until
/// `now + ttl_secs`.
pub trait SignedUrlBackend: Send + Sync {
    fn generate_signed_reference(
        &self,
        asset_key: &str,
        ttl_secs: u64,
        now: Timestamp,
    ) -> Result<String, SigningError>;
}

/// HMAC-based signer for storage fronted by our own media host: the host
/// recomputes the MAC over `"<key>\n<expires>"` and rejects expired or
/// tampered URLs.
pub struct HmacUrlSigner {
    base_url: String,
    secret: String,
}

impl HmacUrlSigner {
    pub fn new(
        base_url: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, SigningError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SigningError("signing secret is not configured".into()));
        }
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret,
        })
    }

    fn sign(&self, asset_key: &str, expires: u64) -> String {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).expect("hmac accepts any key length");
        mac.update(asset_key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl SignedUrlBackend for HmacUrlSigner {
    fn generate_signed_reference(
        &self,
        asset_key: &str,
        ttl_secs: u64,
        now: Timestamp,
    ) -> Result<String, SigningError> {
        let expires = now.as_secs().saturating_add(ttl_secs);
        let sig = self.sign(asset_key, expires);
        Ok(format!(
            "{}/{}?expires={}&sig={}",
            self.base_url, asset_key, expires, sig
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_secret_fails_construction() {
        assert!(HmacUrlSigner::new("https://media.example", "").is_err());
    }

    #[test]
    fn reference_embeds_expiry_and_signature() {
        let signer = HmacUrlSigner::new("https://media.example/", "media-secret").unwrap();
        let url = signer
            .generate_signed_reference("covers/abc.jpg", 3600, Timestamp::from_secs(1_000))
            .unwrap();

        assert!(url.starts_with("https://media.example/covers/abc.jpg?expires=4600&sig="));
        let sig = url.split("sig=").nth(1).unwrap();
        assert_eq!(sig, signer.sign("covers/abc.jpg", 4600));
    }

    #[test]
    fn signature_depends_on_key_and_expiry() {
        let signer = HmacUrlSigner::new("https://media.example", "media-secret").unwrap();
        let a = signer.sign("a.jpg", 100);
        assert_ne!(a, signer.sign("b.jpg", 100));
        assert_ne!(a, signer.sign("a.jpg", 101));
    }
}
