//! Axum middleware that rejects requests without a valid signature package.

use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use hooksig_core::{SchemeRegistry, VerificationOptions};

use crate::error::HttpResult;
use crate::{buffer_body, read_package};

/// Default cap on buffered request bodies (1 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Receiver-side verification settings.
///
/// Holds every secret the receiver currently accepts, so the receiver can
/// rotate secrets independently of the sender.
#[derive(Clone)]
pub struct Verifier {
    registry: SchemeRegistry,
    secrets: Vec<String>,
    options: VerificationOptions,
    body_limit: usize,
}

impl Verifier {
    pub fn new(registry: SchemeRegistry, secrets: Vec<String>) -> Self {
        Self {
            registry,
            secrets,
            options: VerificationOptions::default(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_options(mut self, options: VerificationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn registry(&self) -> &SchemeRegistry {
        &self.registry
    }

    pub fn options(&self) -> &VerificationOptions {
        &self.options
    }

    /// Verify `req`, leaving a buffered copy of the body in place.
    ///
    /// Succeeds if the package verifies under any configured secret. With no
    /// secrets configured nothing can verify.
    pub async fn verify(&self, req: &mut Request) -> HttpResult<()> {
        let package = read_package(req, &self.registry)?;
        let body = buffer_body(req, self.body_limit).await?;
        package.verify_any(&body, self.secrets.as_slice(), &self.options)?;
        Ok(())
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("registry", &self.registry)
            .field("secrets", &self.secrets.len())
            .field("options", &self.options)
            .field("body_limit", &self.body_limit)
            .finish()
    }
}

/// `axum::middleware::from_fn_with_state` handler.
///
/// Rejected requests get the error text as a plain-text body and a status
/// from [`crate::HttpError::status_code`].
pub async fn require_signature(
    State(verifier): State<Arc<Verifier>>,
    mut req: Request,
    next: Next,
) -> Response {
    match verifier.verify(&mut req).await {
        Ok(()) => next.run(req).await,
        Err(e) => {
            tracing::warn!(error = %e, path = %req.uri().path(), "webhook rejected");
            (e.status_code(), e.to_string()).into_response()
        }
    }
}
