// Webhook Delivery Signatures
//
// Every outbound delivery is signed with HMAC-SHA256 over the exact bytes
// of the request body, keyed by the subscription secret. Receivers verify
// by recomputing the MAC over the raw body they received.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Lowercase hex HMAC-SHA256 of `body` keyed by `secret`.
pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Check a hex signature against `body`. MAC comparison is constant-time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let expected = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_round_trip() {
        let body = br#"{"id":"abc","event":"lead_created"}"#;
        let signature = compute_signature("whsec_test", body);

        assert!(verify_signature("whsec_test", body, &signature));
    }

    #[test]
    fn test_known_vector() {
        // RFC-style reference value for HMAC-SHA256("key", ...)
        let signature =
            compute_signature("key", b"The quick brown fox jumps over the lazy dog");

        assert_eq!(
            signature,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn test_tampered_body_fails() {
        let signature = compute_signature("whsec_test", b"original payload");

        assert!(!verify_signature("whsec_test", b"tampered payload", &signature));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let signature = compute_signature("whsec_test", b"payload");

        assert!(!verify_signature("whsec_other", b"payload", &signature));
    }

    #[test]
    fn test_malformed_hex_fails() {
        assert!(!verify_signature("whsec_test", b"payload", "not hex at all"));
    }
}
