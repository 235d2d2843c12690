use axum::http::StatusCode;
use hooksig_core::SignatureError;
use thiserror::Error;

/// Error type for the hooksig-http crate.
///
/// Each variant names the phase that failed and keeps the cause reachable
/// through [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("parsing signature header: {0}")]
    ParseHeader(#[source] SignatureError),

    #[error("reading request body: {0}")]
    ReadBody(#[source] axum::Error),

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

impl HttpError {
    /// The protocol-level error, if this failure came from the signature layer.
    pub fn signature_error(&self) -> Option<&SignatureError> {
        match self {
            HttpError::ParseHeader(e) | HttpError::Signature(e) => Some(e),
            HttpError::ReadBody(_) | HttpError::InvalidHeaderValue(_) => None,
        }
    }

    /// Status a receiver should answer with when rejecting a request.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HttpError::Signature(e) if e.is_policy_failure() => StatusCode::UNAUTHORIZED,
            HttpError::Signature(_) | HttpError::ParseHeader(_) | HttpError::ReadBody(_) => {
                StatusCode::BAD_REQUEST
            }
            HttpError::InvalidHeaderValue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias for hooksig-http operations.
pub type HttpResult<T> = Result<T, HttpError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_parse_header_prefix() {
        let err = HttpError::ParseHeader(SignatureError::InvalidPackage);
        assert_eq!(
            err.to_string(),
            "parsing signature header: invalid signature package"
        );
        assert_eq!(
            err.source().unwrap().to_string(),
            "invalid signature package"
        );
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_read_body_prefix() {
        let err = HttpError::ReadBody(axum::Error::new(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection reset",
        )));
        assert_eq!(err.to_string(), "reading request body: connection reset");
        assert!(err.source().is_some());
        assert!(err.signature_error().is_none());
    }

    #[test]
    fn test_signature_errors_are_transparent() {
        let err = HttpError::from(SignatureError::NotSigned);
        assert_eq!(err.to_string(), "payload not signed");
        assert_eq!(err.signature_error(), Some(&SignatureError::NotSigned));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            HttpError::from(SignatureError::Expired).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            HttpError::from(SignatureError::NoVerifiedSignature).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            HttpError::from(SignatureError::InvalidScheme).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
