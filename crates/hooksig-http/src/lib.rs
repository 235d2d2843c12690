//! HTTP binding for hooksig signature packages.
//!
//! Senders attach a [`SignaturePackage`] to the `Do-Signature` header of a
//! request; receivers read it back and verify it against the request body.
//! The body is never consumed: buffered bodies are borrowed, streaming axum
//! bodies are read once and replaced with an identical buffered copy.

pub mod error;
pub mod middleware;

use axum::body::{Body, Bytes};
use chrono::{DateTime, Utc};
use http::header::{HeaderName, HeaderValue};
use http::Request;

use hooksig_core::{SchemeRegistry, SignatureError, SignaturePackage, VerificationOptions};

pub use error::{HttpError, HttpResult};
pub use middleware::{require_signature, Verifier};

/// Header carrying the serialized signature package.
pub const SIGNATURE_HEADER: HeaderName = HeaderName::from_static("do-signature");

/// Header carrying the `{namespace}.{name}` event name.
pub const EVENT_NAME_HEADER: HeaderName = HeaderName::from_static("do-event-name");

/// Namespaced event name, e.g. `event_name("droplet", "created")`.
pub fn event_name(namespace: &str, name: &str) -> String {
    format!("{namespace}.{name}")
}

/// Set the `Do-Event-Name` header.
pub fn set_event_name<B>(req: &mut Request<B>, namespace: &str, name: &str) -> HttpResult<()> {
    let value = HeaderValue::from_str(&event_name(namespace, name))?;
    req.headers_mut().insert(EVENT_NAME_HEADER, value);
    Ok(())
}

/// The `Do-Event-Name` header, if present and valid text. Not validated further.
pub fn event_name_of<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(EVENT_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
}

/// Sign the request body with every scheme in `registry` and every secret,
/// and set the `Do-Signature` header.
pub fn sign_request<B, S>(
    req: &mut Request<B>,
    registry: &SchemeRegistry,
    t: DateTime<Utc>,
    secrets: &[S],
) -> HttpResult<()>
where
    B: AsRef<[u8]>,
    S: AsRef<str>,
{
    let package = SignaturePackage::new(registry, t, req.body().as_ref(), secrets)?;
    let value = HeaderValue::from_str(&package.to_string())?;
    req.headers_mut().insert(SIGNATURE_HEADER, value);

    tracing::debug!(
        signatures = package.signatures().len(),
        timestamp = package.timestamp().timestamp(),
        "signed request"
    );
    Ok(())
}

/// Verify a request whose body is already buffered.
pub fn verify_request<B>(
    req: &Request<B>,
    registry: &SchemeRegistry,
    secret: &str,
    opts: &VerificationOptions,
) -> HttpResult<()>
where
    B: AsRef<[u8]>,
{
    let package = read_package(req, registry)?;
    package.verify(req.body().as_ref(), secret, opts)?;
    Ok(())
}

/// Verify a request with a streaming body.
///
/// At most `limit` bytes are read. On success or verification failure the
/// body is replaced with a buffered copy so downstream handlers can read it.
pub async fn verify_body(
    req: &mut Request<Body>,
    registry: &SchemeRegistry,
    secret: &str,
    opts: &VerificationOptions,
    limit: usize,
) -> HttpResult<()> {
    let package = read_package(req, registry)?;
    let body = buffer_body(req, limit).await?;
    package.verify(&body, secret, opts)?;
    Ok(())
}

/// Read and parse the `Do-Signature` header.
///
/// A missing or empty header means the request is not signed.
pub fn read_package<B>(req: &Request<B>, registry: &SchemeRegistry) -> HttpResult<SignaturePackage> {
    let header = match req.headers().get(SIGNATURE_HEADER) {
        Some(value) if !value.is_empty() => value,
        _ => {
            tracing::warn!("request rejected: missing signature header");
            return Err(SignatureError::NotSigned.into());
        }
    };

    let text = std::str::from_utf8(header.as_bytes())
        .map_err(|_| HttpError::ParseHeader(SignatureError::InvalidPackage))?;
    SignaturePackage::parse(registry, text).map_err(HttpError::ParseHeader)
}

/// Read the whole body and put an identical buffered copy back in its place.
pub async fn buffer_body(req: &mut Request<Body>, limit: usize) -> HttpResult<Bytes> {
    let body = std::mem::take(req.body_mut());
    let bytes = axum::body::to_bytes(body, limit)
        .await
        .map_err(HttpError::ReadBody)?;
    *req.body_mut() = Body::from(bytes.clone());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PAYLOAD: &[u8] = "it is wednesday my dudes \u{1F577}\u{FE0F}".as_bytes();
    const SECRET: &str = "du-TY1GUFGk";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 1, 1, 10, 0, 0).unwrap()
    }

    fn signed_request(secrets: &[&str]) -> Request<Vec<u8>> {
        let mut req = Request::post("/webhook").body(PAYLOAD.to_vec()).unwrap();
        sign_request(&mut req, SchemeRegistry::builtin(), now(), secrets).unwrap();
        req
    }

    #[test]
    fn test_event_name() {
        assert_eq!(event_name("droplet", "created"), "droplet.created");
    }

    #[test]
    fn test_event_name_header() {
        let mut req = Request::post("/").body(Vec::<u8>::new()).unwrap();
        assert_eq!(event_name_of(&req), None);
        set_event_name(&mut req, "droplet", "created").unwrap();
        assert_eq!(event_name_of(&req), Some("droplet.created"));
        assert_eq!(req.headers().get("Do-Event-Name").unwrap(), "droplet.created");
    }

    #[test]
    fn test_sign_request_sets_header_and_keeps_body() {
        let req = signed_request(&[SECRET, "other-secret"]);
        assert_eq!(
            req.headers().get("Do-Signature").unwrap(),
            "t=946720800,\
             v1=b70100cf2943bec15996e3ae9392d0dcaf21f285fa81969108185d47b292dfa2,\
             v1=817555f45dd54e36c87ad1a349083e5d2e706cae2eae7f4077379f5444f5b985"
        );
        assert_eq!(req.body().as_slice(), PAYLOAD);
    }

    #[test]
    fn test_verify_request() {
        let req = signed_request(&[SECRET, "other-secret"]);
        let opts = VerificationOptions::new().at(now());
        let registry = SchemeRegistry::builtin();

        verify_request(&req, registry, SECRET, &opts).unwrap();
        verify_request(&req, registry, "other-secret", &opts).unwrap();

        let err = verify_request(&req, registry, "unrelated", &opts).unwrap_err();
        assert_eq!(
            err.signature_error(),
            Some(&SignatureError::NoVerifiedSignature)
        );
    }

    #[test]
    fn test_verify_request_unsigned() {
        let req = Request::post("/").body(PAYLOAD.to_vec()).unwrap();
        let err = verify_request(
            &req,
            SchemeRegistry::builtin(),
            SECRET,
            &VerificationOptions::new().at(now()),
        )
        .unwrap_err();
        assert!(matches!(err, HttpError::Signature(SignatureError::NotSigned)));
        assert_eq!(err.to_string(), "payload not signed");
    }

    #[test]
    fn test_verify_request_empty_header_is_unsigned() {
        let req = Request::post("/")
            .header(SIGNATURE_HEADER, "")
            .body(PAYLOAD.to_vec())
            .unwrap();
        let err = verify_request(
            &req,
            SchemeRegistry::builtin(),
            SECRET,
            &VerificationOptions::new().at(now()),
        )
        .unwrap_err();
        assert!(matches!(err, HttpError::Signature(SignatureError::NotSigned)));
    }

    #[test]
    fn test_verify_request_non_utf8_header() {
        let req = Request::post("/")
            .header(SIGNATURE_HEADER, HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap())
            .body(PAYLOAD.to_vec())
            .unwrap();
        let err = verify_request(
            &req,
            SchemeRegistry::builtin(),
            SECRET,
            &VerificationOptions::new().at(now()),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "parsing signature header: invalid signature package"
        );
    }

    #[tokio::test]
    async fn test_buffer_body_restores_body() {
        let mut req = Request::post("/").body(Body::from(PAYLOAD)).unwrap();
        let bytes = buffer_body(&mut req, 1024).await.unwrap();
        assert_eq!(&bytes[..], PAYLOAD);

        let again = axum::body::to_bytes(std::mem::take(req.body_mut()), 1024)
            .await
            .unwrap();
        assert_eq!(&again[..], PAYLOAD);
    }

    #[tokio::test]
    async fn test_buffer_body_over_limit() {
        let mut req = Request::post("/").body(Body::from(PAYLOAD)).unwrap();
        let err = buffer_body(&mut req, 4).await.unwrap_err();
        assert!(matches!(err, HttpError::ReadBody(_)));
        assert!(err.to_string().starts_with("reading request body: "));
    }
}
