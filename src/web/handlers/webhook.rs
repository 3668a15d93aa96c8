//! The generic webhook receiver.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, warn};

use crate::auth::{self, AuthError};
use crate::payload::{self, RawRequest};
use crate::record::{self, RequestRecord};
use crate::signature;
use crate::utils::http::AckResponse;
use crate::AppContext;

/// POST /webhook
pub async fn receive(
    State(ctx): State<Arc<AppContext>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(ctx, connect_info, headers, body, "/webhook".to_string()).await
}

/// POST /webhook/{*path} — same behavior, custom path recorded.
pub async fn receive_custom(
    State(ctx): State<Arc<AppContext>>,
    Path(path): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = format!("/webhook/{}", path);
    info!("Custom webhook path: {}", path);
    handle(ctx, connect_info, headers, body, path).await
}

async fn handle(
    ctx: Arc<AppContext>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
    path: String,
) -> Response {
    let req = raw_request(&headers, body, connect_info);

    // Token authentication, when configured.
    let auth_header = req.headers.get("authorization").map(|s| s.as_str());
    if let Err(e) = auth::verify_token(auth_header, ctx.config.token.as_deref()) {
        warn!(
            "Unauthorized webhook attempt from {}: {}",
            req.source_address,
            match e {
                AuthError::MissingToken => "missing token",
                AuthError::InvalidToken => "invalid token",
            }
        );
        return (StatusCode::UNAUTHORIZED, Json(AckResponse::error("Unauthorized")))
            .into_response();
    }

    // Signature verification, when configured.
    let sig = req
        .headers
        .get("x-hub-signature-256")
        .or_else(|| req.headers.get("x-signature"))
        .map(|s| s.as_str());
    if !signature::verify(&req.body, sig, ctx.config.secret.as_deref()) {
        warn!("Invalid signature from {}", req.source_address);
        return (
            StatusCode::FORBIDDEN,
            Json(AckResponse::error("Invalid signature")),
        )
            .into_response();
    }

    match process(&req, &path).await {
        Ok(response) => response,
        Err(e) => {
            // Never leak internals to the sender.
            error!("Error processing webhook: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AckResponse::error("Internal server error")),
            )
                .into_response()
        }
    }
}

/// Decode, record, acknowledge. Decode failures are values, so the sender
/// is still acknowledged with 200; only unexpected faults reach the 500
/// branch in `handle`.
async fn process(req: &RawRequest, path: &str) -> anyhow::Result<Response> {
    let payload = payload::dispatch(req).await;
    record::log_request(&RequestRecord::new(req, path, &payload));

    info!("Webhook processed successfully");
    let content_type = req.content_type.clone().unwrap_or_else(|| "unknown".to_string());
    let ack = AckResponse::success("Webhook received successfully").with_content_type(content_type);
    Ok((StatusCode::OK, Json(ack)).into_response())
}

/// Snapshot the incoming call into an immutable value.
pub(super) fn raw_request(
    headers: &HeaderMap,
    body: Bytes,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> RawRequest {
    let header_map: BTreeMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect();

    let source_address = header_map
        .get("x-forwarded-for")
        .cloned()
        .or_else(|| connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    let content_type = header_map.get("content-type").cloned();

    RawRequest {
        content_type,
        headers: header_map,
        body,
        source_address,
    }
}
