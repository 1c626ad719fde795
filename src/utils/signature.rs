//! HMAC-SHA256 webhook signatures.
//!
//! Wire contract: the signed message is the forwarded body bytes followed by
//! the decimal epoch-millisecond timestamp, with no separator. The hex digest
//! travels in `X-Webhook-Signature`, the timestamp in `X-Webhook-Timestamp`.

use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const TIMESTAMP_HEADER: &str = "x-webhook-timestamp";
pub const ACTION_HEADER: &str = "x-webhook-action";

/// Transport metadata attached to a forwarded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub body: Vec<u8>,
    pub timestamp: i64,
    pub signature: Option<String>,
}

impl SignedRequest {
    /// Sign `body` at `timestamp`. Without a secret the request stays unsigned.
    pub fn new(body: Vec<u8>, timestamp: i64, secret: Option<&str>) -> Result<Self> {
        let signature = secret
            .map(|secret| generate_signature(secret, &body, timestamp))
            .transpose()?;
        Ok(Self {
            body,
            timestamp,
            signature,
        })
    }
}

fn keyed_mac(secret: &str, body: &[u8], timestamp: i64) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow!("Invalid HMAC secret: {}", e))?;
    mac.update(body);
    mac.update(timestamp.to_string().as_bytes());
    Ok(mac)
}

/// `hex(HMAC-SHA256(secret, body || timestamp))`, 64 lowercase hex chars.
pub fn generate_signature(secret: &str, body: &[u8], timestamp: i64) -> Result<String> {
    let mac = keyed_mac(secret, body, timestamp)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Check a hex signature in constant time.
pub fn verify_signature(secret: &str, body: &[u8], timestamp: i64, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    keyed_mac(secret, body, timestamp)
        .map(|mac| mac.verify_slice(&expected).is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_vector() {
        // HMAC-SHA256("s3cr3t", "{\"x\":1}1700000000000")
        let signature = generate_signature("s3cr3t", br#"{"x":1}"#, 1_700_000_000_000).unwrap();
        assert_eq!(
            signature,
            "b6b3166c5afced5679fa3d584b96563663c86beb39e083ab724b05c692c3e76c"
        );
    }

    #[test]
    fn test_timestamp_digits_are_part_of_the_message() {
        // "body" + "12" and "body1" + "2" sign the same bytes
        assert_eq!(
            generate_signature("k", b"body", 12).unwrap(),
            generate_signature("k", b"body1", 2).unwrap()
        );
        assert_ne!(
            generate_signature("k", b"body", 12).unwrap(),
            generate_signature("k", b"body", 13).unwrap()
        );
    }

    #[test]
    fn test_verify_accepts_own_signature() {
        let body = br#"{"campaign_id":"c-1"}"#;
        let signature = generate_signature("secret", body, 42).unwrap();
        assert!(verify_signature("secret", body, 42, &signature));
        assert!(!verify_signature("secret", body, 43, &signature));
        assert!(!verify_signature("other", body, 42, &signature));
        assert!(!verify_signature("secret", b"{}", 42, &signature));
        assert!(!verify_signature("secret", body, 42, "not-hex"));
    }

    #[test]
    fn test_signed_request_without_secret() {
        let request = SignedRequest::new(b"{}".to_vec(), 1, None).unwrap();
        assert!(request.signature.is_none());

        let signed = SignedRequest::new(b"{}".to_vec(), 1, Some("k")).unwrap();
        assert_eq!(signed.signature, Some(generate_signature("k", b"{}", 1).unwrap()));
    }

    proptest! {
        #[test]
        fn prop_signature_is_deterministic(
            secret in ".{0,32}",
            body in prop::collection::vec(any::<u8>(), 0..256),
            timestamp in 0i64..4_000_000_000_000,
        ) {
            let first = generate_signature(&secret, &body, timestamp).unwrap();
            let second = generate_signature(&secret, &body, timestamp).unwrap();
            prop_assert_eq!(first.len(), 64);
            prop_assert_eq!(&first, &second);
            prop_assert!(verify_signature(&secret, &body, timestamp, &first));
        }
    }
}
