//! Health, info, and fallback endpoints.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::warn;

use crate::utils::http;
use crate::AppContext;

const SERVICE_NAME: &str = "Custom Webhook Receiver";

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "timestamp": http::now(),
    }))
}

/// GET /info
pub async fn info(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "main_webhook": "/webhook",
            "custom_webhook": "/webhook/{path}",
            "lastlink_webhook": "/webhook/lastlink",
            "health_check": "/health",
            "info": "/info",
        },
        "supported_formats": ["JSON", "XML", "Form Data", "Multipart", "Raw Data"],
        "security": {
            "token_auth": ctx.config.token_auth_enabled(),
            "signature_verification": ctx.config.signature_verification_enabled(),
        },
        "timestamp": http::now(),
    }))
}

/// Fallback for unknown paths.
pub async fn not_found(uri: axum::http::Uri) -> impl IntoResponse {
    warn!("404 - Path not found: {}", uri.path());
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "available_endpoints": ["/webhook", "/webhook/{path}", "/health", "/info"],
        })),
    )
}
