//! HMAC-SHA256 webhook signature helpers.
//!
//! All comparisons go through `Mac::verify_slice`, which is constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `payload` under `secret`.
pub fn hmac_sha256_hex(secret: &str, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a hex-encoded HMAC-SHA256 signature over `payload`.
///
/// Returns `false` for an empty secret, malformed hex, or a mismatch —
/// verification can only pass against a real configured secret.
pub fn verify_hmac_sha256_hex(secret: &str, payload: &[u8], signature_hex: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let expected = match hex::decode(signature_hex.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}
