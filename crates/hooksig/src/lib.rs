//! hooksig: sign, verify and receive signed webhooks.
//!
//! Library half of the `hooksig` binary. The CLI commands are thin wrappers
//! around [`sign_payload`], [`verify_payload`] and [`server::build_router`].

pub mod config;
pub mod error;
pub mod server;

pub use config::{RootConfig, ServerConfig, SigningConfig, VerificationConfig};
pub use error::{RootError, RootResult};

use chrono::{DateTime, Utc};
use hooksig_core::{SchemeRegistry, SignatureError, SignaturePackage, VerificationOptions};

/// Sign `payload` and return the `Do-Signature` header value.
pub fn sign_payload<S: AsRef<str>>(
    registry: &SchemeRegistry,
    t: DateTime<Utc>,
    payload: &[u8],
    secrets: &[S],
) -> RootResult<String> {
    if secrets.is_empty() {
        return Err(RootError::Config("at least one secret is required".into()));
    }
    let package = SignaturePackage::new(registry, t, payload, secrets)?;
    Ok(package.to_string())
}

/// Verify a `Do-Signature` header value against `payload`.
///
/// Succeeds if any of `secrets` verifies.
pub fn verify_payload<S: AsRef<str>>(
    registry: &SchemeRegistry,
    header: &str,
    payload: &[u8],
    secrets: &[S],
    opts: &VerificationOptions,
) -> RootResult<()> {
    if header.is_empty() {
        return Err(SignatureError::NotSigned.into());
    }
    let package = SignaturePackage::parse(registry, header)
        .map_err(hooksig_http::HttpError::ParseHeader)?;
    package.verify_any(payload, secrets, opts)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 1, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_sign_payload() {
        let header = sign_payload(
            SchemeRegistry::builtin(),
            t(),
            "it is wednesday my dudes \u{1F577}\u{FE0F}".as_bytes(),
            &["du-TY1GUFGk"],
        )
        .unwrap();
        assert_eq!(
            header,
            "t=946720800,v1=b70100cf2943bec15996e3ae9392d0dcaf21f285fa81969108185d47b292dfa2"
        );
    }

    #[test]
    fn test_sign_payload_requires_secret() {
        let none: [&str; 0] = [];
        assert!(matches!(
            sign_payload(SchemeRegistry::builtin(), t(), b"x", &none),
            Err(RootError::Config(_))
        ));
    }

    #[test]
    fn test_verify_payload() {
        let registry = SchemeRegistry::builtin();
        let header = sign_payload(registry, t(), b"body", &["a", "b"]).unwrap();
        let opts = VerificationOptions::new().at(t());

        verify_payload(registry, &header, b"body", &["zzz", "b"], &opts).unwrap();

        let err = verify_payload(registry, &header, b"body", &["zzz"], &opts).unwrap_err();
        assert_eq!(err.to_string(), "signature error: no verified signature");

        let err = verify_payload(registry, "", b"body", &["a"], &opts).unwrap_err();
        assert_eq!(err.to_string(), "signature error: payload not signed");

        let none: [&str; 0] = [];
        let stale = VerificationOptions::new().at(t() + chrono::TimeDelta::hours(2));
        let err = verify_payload(registry, &header, b"body", &none, &stale).unwrap_err();
        assert_eq!(err.to_string(), "signature error: signature has expired");

        let err = verify_payload(registry, "garbage", b"body", &["a"], &opts).unwrap_err();
        assert_eq!(
            err.to_string(),
            "http error: parsing signature header: invalid signature package"
        );
    }
}
