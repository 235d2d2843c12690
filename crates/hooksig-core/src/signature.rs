//! A single `(scheme, value)` signature and its `v{version}={value}` encoding.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;

use crate::error::{SignatureError, SignatureResult};
use crate::registry::SchemeRegistry;
use crate::scheme::SchemeRef;

/// A signature value together with the scheme that produced it.
#[derive(Clone)]
pub struct Signature {
    scheme: SchemeRef,
    value: String,
}

impl Signature {
    /// Wrap an existing value. No validation is performed on `value`.
    pub fn new(scheme: SchemeRef, value: impl Into<String>) -> Self {
        Self {
            scheme,
            value: value.into(),
        }
    }

    /// Sign `payload` at `t` with `secret` under `scheme`.
    pub fn sign(
        scheme: &SchemeRef,
        t: DateTime<Utc>,
        payload: &[u8],
        secret: &str,
    ) -> SignatureResult<Self> {
        let value = scheme.sign(t, payload, secret)?;
        Ok(Self {
            scheme: Arc::clone(scheme),
            value,
        })
    }

    /// Parse `v{version}={value}`, resolving the version in `registry`.
    ///
    /// The value is opaque and taken verbatim; an empty value parses and
    /// simply never verifies.
    pub fn parse(registry: &SchemeRegistry, text: &str) -> SignatureResult<Self> {
        let (key, value) = text.split_once('=').ok_or(SignatureError::InvalidFormat)?;
        let version = key
            .strip_prefix('v')
            .ok_or(SignatureError::InvalidFormat)?
            .parse::<i64>()
            .map_err(|_| SignatureError::VersionNotInteger)?;
        let scheme = registry
            .lookup(version)
            .ok_or(SignatureError::UnknownVersion(version))?;

        Ok(Self {
            scheme,
            value: value.to_string(),
        })
    }

    pub fn scheme(&self) -> &SchemeRef {
        &self.scheme
    }

    pub fn version(&self) -> i64 {
        self.scheme.version()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Compare signature values without leaking timing information.
    ///
    /// Only the values are compared; the scheme is not.
    pub fn ct_eq(&self, other: &Signature) -> bool {
        self.value.as_bytes().ct_eq(other.value.as_bytes()).into()
    }

    /// Check this signature against `payload` and `secret`. `t` must be the
    /// timestamp the signature was generated for.
    pub fn verify(&self, payload: &[u8], secret: &str, t: DateTime<Utc>) -> SignatureResult<()> {
        let fresh = Signature::sign(&self.scheme, t, payload, secret)
            .map_err(|_| SignatureError::InvalidScheme)?;

        if !self.ct_eq(&fresh) {
            return Err(SignatureError::NoVerifiedSignature);
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}={}", self.scheme.version(), self.value)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("version", &self.scheme.version())
            .field("value", &self.value)
            .finish()
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.scheme.version() == other.scheme.version() && self.ct_eq(other)
    }
}

impl Eq for Signature {}

impl FromStr for Signature {
    type Err = SignatureError;

    /// Parses against [`SchemeRegistry::builtin`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Signature::parse(SchemeRegistry::builtin(), s)
    }
}
