use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::AppContext;

pub mod lastlink;
pub mod service;
pub mod webhook;

pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/webhook", post(webhook::receive))
        .route("/webhook/lastlink", post(lastlink::receive))
        .route("/webhook/lastlink/orders", post(lastlink::orders))
        .route("/webhook/lastlink/payments", post(lastlink::payments))
        .route("/webhook/lastlink/customers", post(lastlink::customers))
        .route("/webhook/*path", post(webhook::receive_custom))
        .route("/health", get(service::health))
        .route("/info", get(service::info))
        .fallback(service::not_found)
        .with_state(ctx)
}
