use thiserror::Error;

/// Error type for the hooksig-core crate.
///
/// Display strings are part of the wire contract: receivers match on them,
/// so they must stay byte-for-byte stable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature has expired")]
    Expired,

    #[error("no verified signature")]
    NoVerifiedSignature,

    #[error("payload not signed")]
    NotSigned,

    #[error("invalid signature format")]
    InvalidFormat,

    #[error("signature scheme version must be an integer")]
    VersionNotInteger,

    #[error("invalid signature scheme version {0}")]
    UnknownVersion(i64),

    #[error("invalid signature scheme")]
    InvalidScheme,

    #[error("invalid signature package")]
    InvalidPackage,

    #[error("timestamp cannot be specified multiple times")]
    DuplicateTimestamp,

    #[error("timestamp must be an integer")]
    TimestampNotInteger,

    #[error("missing timestamp")]
    MissingTimestamp,
}

impl SignatureError {
    /// True for outcomes of the verification policy (stale, unsigned or
    /// unmatched payloads) as opposed to malformed input.
    pub fn is_policy_failure(&self) -> bool {
        matches!(
            self,
            SignatureError::Expired | SignatureError::NoVerifiedSignature | SignatureError::NotSigned
        )
    }
}

/// Result type alias for hooksig-core operations.
pub type SignatureResult<T> = Result<T, SignatureError>;
