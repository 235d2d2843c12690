//! Signature packages: one timestamp, many signatures.
//!
//! Wire format:
//!
//! ```text
//! t=<unix seconds>,v<version>=<value>[,v<version>=<value>...]
//! ```
//!
//! A package carries one signature per (scheme, secret) pair so that secrets
//! can be rotated and schemes upgraded without breaking receivers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{SignatureError, SignatureResult};
use crate::options::VerificationOptions;
use crate::registry::SchemeRegistry;
use crate::signature::Signature;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignaturePackage {
    timestamp: DateTime<Utc>,
    signatures: Vec<Signature>,
}

impl SignaturePackage {
    /// Sign `payload` with every scheme in `registry` and every secret.
    ///
    /// Signatures are ordered by scheme (registration order), then by secret.
    /// `t` is truncated to whole seconds.
    pub fn new<S: AsRef<str>>(
        registry: &SchemeRegistry,
        t: DateTime<Utc>,
        payload: &[u8],
        secrets: &[S],
    ) -> SignatureResult<Self> {
        let timestamp = whole_seconds(t)?;
        let mut signatures = Vec::with_capacity(registry.len() * secrets.len());

        for scheme in registry.all() {
            for secret in secrets {
                signatures.push(Signature::sign(
                    scheme,
                    timestamp,
                    payload,
                    secret.as_ref(),
                )?);
            }
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }

    /// Assemble a package from already computed signatures.
    pub fn from_parts(t: DateTime<Utc>, signatures: Vec<Signature>) -> SignatureResult<Self> {
        Ok(Self {
            timestamp: whole_seconds(t)?,
            signatures,
        })
    }

    /// Parse a package, resolving signature versions in `registry`.
    ///
    /// Fields may appear in any order but `t` must appear exactly once.
    pub fn parse(registry: &SchemeRegistry, text: &str) -> SignatureResult<Self> {
        let mut timestamp = None;
        let mut signatures = Vec::new();

        for field in text.split(',') {
            let (key, value) = field
                .split_once('=')
                .ok_or(SignatureError::InvalidPackage)?;

            if key == "t" {
                if timestamp.is_some() {
                    return Err(SignatureError::DuplicateTimestamp);
                }
                let seconds = value
                    .parse::<i64>()
                    .map_err(|_| SignatureError::TimestampNotInteger)?;
                timestamp = Some(
                    DateTime::from_timestamp(seconds, 0)
                        .ok_or(SignatureError::TimestampNotInteger)?,
                );
            } else {
                signatures.push(Signature::parse(registry, field)?);
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
        tracing::debug!(
            timestamp = timestamp.timestamp(),
            signatures = signatures.len(),
            "parsed signature package"
        );

        Ok(Self {
            timestamp,
            signatures,
        })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// True when the package carries no signatures at all.
    pub fn is_unsigned(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Verify the package against `payload` and `secret`.
    ///
    /// Passes if at least one signature from a trusted scheme matches.
    pub fn verify(
        &self,
        payload: &[u8],
        secret: &str,
        opts: &VerificationOptions,
    ) -> SignatureResult<()> {
        self.verify_any(payload, &[secret], opts)
    }

    /// Verify the package against `payload` with any of `secrets`.
    ///
    /// Age and unsigned checks run once, before any secret is tried, so an
    /// empty `secrets` still reports an expired or unsigned package.
    pub fn verify_any<S: AsRef<str>>(
        &self,
        payload: &[u8],
        secrets: &[S],
        opts: &VerificationOptions,
    ) -> SignatureResult<()> {
        self.check_fresh(opts)?;

        if self.signatures.is_empty() {
            tracing::warn!("signature package rejected: no signatures");
            return Err(SignatureError::NotSigned);
        }

        for secret in secrets {
            if self.matches(payload, secret.as_ref(), opts) {
                return Ok(());
            }
        }

        tracing::warn!(
            signatures = self.signatures.len(),
            secrets = secrets.len(),
            "signature package rejected: no verified signature"
        );
        Err(SignatureError::NoVerifiedSignature)
    }

    fn check_fresh(&self, opts: &VerificationOptions) -> SignatureResult<()> {
        if opts.ignore_tolerance {
            return Ok(());
        }
        let tolerance = TimeDelta::from_std(opts.effective_tolerance()).unwrap_or(TimeDelta::MAX);
        let age = opts.now().signed_duration_since(self.timestamp);
        if age > tolerance {
            tracing::warn!(
                age_secs = age.num_seconds(),
                tolerance_secs = tolerance.num_seconds(),
                "signature package rejected: expired"
            );
            return Err(SignatureError::Expired);
        }
        Ok(())
    }

    fn matches(&self, payload: &[u8], secret: &str, opts: &VerificationOptions) -> bool {
        for sig in &self.signatures {
            if opts.is_untrusted(sig.version()) {
                tracing::debug!(version = sig.version(), "skipping untrusted scheme");
                continue;
            }
            if sig.verify(payload, secret, self.timestamp).is_ok() {
                tracing::debug!(version = sig.version(), "signature verified");
                return true;
            }
        }
        false
    }
}

impl fmt::Display for SignaturePackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.timestamp.timestamp())?;
        for sig in &self.signatures {
            write!(f, ",{sig}")?;
        }
        Ok(())
    }
}

impl FromStr for SignaturePackage {
    type Err = SignatureError;

    /// Parses against [`SchemeRegistry::builtin`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignaturePackage::parse(SchemeRegistry::builtin(), s)
    }
}

fn whole_seconds(t: DateTime<Utc>) -> SignatureResult<DateTime<Utc>> {
    DateTime::from_timestamp(t.timestamp(), 0).ok_or(SignatureError::TimestampNotInteger)
}
