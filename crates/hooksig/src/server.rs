//! Axum webhook receiver.
//!
//! `POST /webhook` is guarded by the signature middleware; `GET /health`
//! is open.

use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use hooksig_http::{require_signature, EVENT_NAME_HEADER};

use crate::config::RootConfig;

/// Build the Axum router for the receiver.
pub fn build_router(config: &RootConfig) -> Router {
    let verifier = Arc::new(config.verifier());

    let webhook = Router::new()
        .route("/webhook", post(handle_webhook))
        .layer(middleware::from_fn_with_state(verifier, require_signature));

    Router::new()
        .route("/health", get(handle_health))
        .merge(webhook)
}

/// POST /webhook -- reached only with a verified signature
async fn handle_webhook(headers: HeaderMap, body: Bytes) -> (StatusCode, Json<serde_json::Value>) {
    let event = headers
        .get(EVENT_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info!(event = %event, bytes = body.len(), "webhook accepted");

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "accepted",
            "event": event,
            "bytes": body.len(),
        })),
    )
}

/// GET /health -- server info
async fn handle_health() -> Json<serde_json::Value> {
    let schemes: Vec<i64> = hooksig_core::SchemeRegistry::builtin()
        .all()
        .iter()
        .map(|s| s.version())
        .collect();

    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "schemes": schemes,
    }))
}
