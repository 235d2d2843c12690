//! Signature schemes.
//!
//! A scheme maps `(time, payload, secret)` to an opaque signature value and is
//! identified on the wire by its integer version (`v1=...`).

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{SignatureError, SignatureResult};

type HmacSha256 = Hmac<Sha256>;

/// A versioned signing algorithm.
///
/// Implementations must be deterministic and must not emit `,` in their
/// output, since the package wire format is comma separated.
pub trait SignatureScheme: Send + Sync + fmt::Debug {
    /// Version number written after the `v` in the wire format.
    fn version(&self) -> i64;

    /// Compute the signature value for `payload` signed at `t` with `secret`.
    fn sign(&self, t: DateTime<Utc>, payload: &[u8], secret: &str) -> SignatureResult<String>;
}

/// Shared handle to a registered scheme.
pub type SchemeRef = Arc<dyn SignatureScheme>;

/// HMAC-SHA256 over the timestamp and payload in the following format:
///
/// ```text
/// {unix timestamp}.{payload}
/// ```
///
/// The digest is hex-encoded (lowercase).
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureSchemeV1;

impl SignatureSchemeV1 {
    pub const VERSION: i64 = 1;
}

impl SignatureScheme for SignatureSchemeV1 {
    fn version(&self) -> i64 {
        Self::VERSION
    }

    fn sign(&self, t: DateTime<Utc>, payload: &[u8], secret: &str) -> SignatureResult<String> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| SignatureError::InvalidScheme)?;

        mac.update(t.timestamp().to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);

        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_time, TEST_PAYLOAD, TEST_SECRET};

    #[test]
    fn test_v1_version() {
        assert_eq!(SignatureSchemeV1.version(), 1);
    }

    #[test]
    fn test_v1_reference_vectors() {
        let ts = test_time();
        assert_eq!(
            SignatureSchemeV1.sign(ts, TEST_PAYLOAD, TEST_SECRET).unwrap(),
            "b70100cf2943bec15996e3ae9392d0dcaf21f285fa81969108185d47b292dfa2"
        );
        assert_eq!(
            SignatureSchemeV1
                .sign(ts, TEST_PAYLOAD, "other-secret")
                .unwrap(),
            "817555f45dd54e36c87ad1a349083e5d2e706cae2eae7f4077379f5444f5b985"
        );
        assert_eq!(
            SignatureSchemeV1
                .sign(ts + chrono::Duration::minutes(1), TEST_PAYLOAD, "other-secret")
                .unwrap(),
            "eb5eb314fd727bcbae0713640b66540c64dc7e7cfa18f715deee29ed5db59347"
        );
    }

    #[test]
    fn test_v1_is_deterministic() {
        let ts = test_time();
        let a = SignatureSchemeV1.sign(ts, TEST_PAYLOAD, TEST_SECRET).unwrap();
        let b = SignatureSchemeV1.sign(ts, TEST_PAYLOAD, TEST_SECRET).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_v1_each_input_changes_output() {
        let ts = test_time();
        let base = SignatureSchemeV1.sign(ts, TEST_PAYLOAD, TEST_SECRET).unwrap();

        let other_time = SignatureSchemeV1
            .sign(ts + chrono::Duration::seconds(1), TEST_PAYLOAD, TEST_SECRET)
            .unwrap();
        let other_payload = SignatureSchemeV1
            .sign(ts, b"other-payload", TEST_SECRET)
            .unwrap();
        let other_secret = SignatureSchemeV1
            .sign(ts, TEST_PAYLOAD, "some-secret")
            .unwrap();

        assert_ne!(base, other_time);
        assert_ne!(base, other_payload);
        assert_ne!(base, other_secret);
    }

    #[test]
    fn test_v1_output_is_lowercase_hex() {
        let value = SignatureSchemeV1.sign(test_time(), b"", "").unwrap();
        assert_eq!(value.len(), 64);
        assert!(value
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_v1_ignores_subsecond_precision() {
        let ts = test_time();
        let with_nanos = ts + chrono::Duration::milliseconds(750);
        assert_eq!(
            SignatureSchemeV1.sign(ts, TEST_PAYLOAD, TEST_SECRET).unwrap(),
            SignatureSchemeV1
                .sign(with_nanos, TEST_PAYLOAD, TEST_SECRET)
                .unwrap()
        );
    }
}
