//! Structured delivery records.
//!
//! Every accepted webhook produces one record carrying the decoded payload
//! and the headers worth keeping; the record is emitted through `tracing`
//! so it lands on stdout and in the rolling log file alike.

use std::collections::BTreeMap;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::payload::{DecodedPayload, RawRequest};
use crate::utils::http;
use crate::Config;

/// Headers preserved in delivery records; everything else is dropped.
const SELECTED_HEADERS: [&str; 8] = [
    "user-agent",
    "x-forwarded-for",
    "authorization",
    "x-hub-signature",
    "x-hub-signature-256",
    "x-github-event",
    "x-gitlab-event",
    "x-event-type",
];

#[derive(Debug, Serialize)]
pub struct RequestRecord<'a> {
    pub request_id: String,
    pub timestamp: String,
    pub source_address: &'a str,
    pub content_type: &'a str,
    pub path: &'a str,
    pub headers: BTreeMap<&'a str, &'a str>,
    pub payload: &'a DecodedPayload,
}

impl<'a> RequestRecord<'a> {
    pub fn new(req: &'a RawRequest, path: &'a str, payload: &'a DecodedPayload) -> Self {
        let headers = SELECTED_HEADERS
            .iter()
            .filter_map(|name| req.headers.get(*name).map(|v| (*name, v.as_str())))
            .collect();
        Self {
            request_id: Uuid::new_v4().to_string(),
            timestamp: http::now(),
            source_address: &req.source_address,
            content_type: req.content_type.as_deref().unwrap_or("unknown"),
            path,
            headers,
            payload,
        }
    }
}

/// Emit one delivery record at info level.
pub fn log_request(record: &RequestRecord) {
    let rendered = serde_json::to_string_pretty(record)
        .unwrap_or_else(|e| format!("{{\"error\":\"record serialization failed: {}\"}}", e));
    info!("Webhook data received:\n{}", rendered);
}

static STARTUP_ANNOUNCED: OnceCell<()> = OnceCell::new();

/// Log the security posture once at process start.
///
/// Explicit one-time initialization; calling again is a no-op, so request
/// handling stays free of startup concerns.
pub fn announce_startup(config: &Config) {
    STARTUP_ANNOUNCED.get_or_init(|| {
        info!(
            "Token auth: {}",
            if config.token_auth_enabled() { "Enabled" } else { "Disabled" }
        );
        info!(
            "Signature verification: {}",
            if config.signature_verification_enabled() { "Enabled" } else { "Disabled" }
        );
    });
}
