//! hooksig core
//!
//! Replay-resistant webhook payload signing with multiple secrets and
//! versioned signature schemes.
//!
//! Key features:
//! - Open [`SignatureScheme`] trait with an explicit [`SchemeRegistry`]
//! - HMAC-SHA256 reference scheme ([`SignatureSchemeV1`])
//! - Constant-time signature comparison
//! - [`SignaturePackage`] wire format: `t=<unix>,v1=<hex>[,...]`
//! - Verification with timestamp tolerance and untrusted-scheme filtering
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use hooksig_core::{SchemeRegistry, SignaturePackage, VerificationOptions};
//!
//! let t = Utc.with_ymd_and_hms(2000, 1, 1, 10, 0, 0).unwrap();
//! let package =
//!     SignaturePackage::new(SchemeRegistry::builtin(), t, b"payload", &["old", "new"]).unwrap();
//!
//! let header = package.to_string();
//! let parsed: SignaturePackage = header.parse().unwrap();
//! parsed
//!     .verify(b"payload", "new", &VerificationOptions::new().at(t))
//!     .unwrap();
//! ```

pub mod error;
pub mod options;
pub mod package;
pub mod registry;
pub mod scheme;
pub mod signature;

pub use error::{SignatureError, SignatureResult};
pub use options::{VerificationOptions, DEFAULT_TOLERANCE};
pub use package::SignaturePackage;
pub use registry::SchemeRegistry;
pub use scheme::{SchemeRef, SignatureScheme, SignatureSchemeV1};
pub use signature::Signature;
