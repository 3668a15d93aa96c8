//! Lastlink payment-platform receivers.
//!
//! This family reports failures with HTTP 400 rather than 500; that is the
//! platform's observed contract, not an accident.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{error, info};

use crate::payload::{self, DecodedPayload};
use crate::record::{self, RequestRecord};
use crate::utils::http::AckResponse;
use crate::AppContext;

use super::webhook::raw_request;

/// POST /webhook/lastlink
///
/// Accepts JSON, form, or raw bodies; detects the event type from the
/// `X-Event-Type` header or the payload's `event_type` / `type` field.
pub async fn receive(
    State(_ctx): State<Arc<AppContext>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let req = raw_request(&headers, body, connect_info);

    let media_type = req.media_type();
    let payload = if media_type.contains("application/json") {
        match serde_json::from_slice::<Value>(&req.body) {
            Ok(value) => DecodedPayload::Json(value),
            Err(e) => return bad_request(format!("Error processing webhook: {}", e)),
        }
    } else if media_type.contains("application/x-www-form-urlencoded") {
        DecodedPayload::Form(payload::form::parse_urlencoded(&req.body))
    } else {
        DecodedPayload::Raw(payload::RawBlob {
            content_type: req.content_type.clone().unwrap_or_else(|| "unknown".to_string()),
            size: req.body.len(),
            raw_data: req.body_text(),
        })
    };

    let event_type = detect_event_type(&req.headers.get("x-event-type").cloned(), &payload);
    info!("Lastlink webhook received, event type: {}", event_type);
    record::log_request(&RequestRecord::new(&req, "/webhook/lastlink", &payload));

    let ack = AckResponse::success("Webhook received successfully").with_event_type(event_type);
    (StatusCode::OK, Json(ack)).into_response()
}

/// POST /webhook/lastlink/orders
pub async fn orders(
    State(_ctx): State<Arc<AppContext>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    json_endpoint(connect_info, headers, body, "/webhook/lastlink/orders", |data| {
        info!("Order summary: {}", order_summary(data));
        "Order webhook processed"
    })
    .await
}

/// POST /webhook/lastlink/payments
pub async fn payments(
    State(_ctx): State<Arc<AppContext>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    json_endpoint(connect_info, headers, body, "/webhook/lastlink/payments", |data| {
        info!("Payment summary: {}", payment_summary(data));
        "Payment webhook processed"
    })
    .await
}

/// POST /webhook/lastlink/customers
pub async fn customers(
    State(_ctx): State<Arc<AppContext>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    json_endpoint(connect_info, headers, body, "/webhook/lastlink/customers", |data| {
        info!("Customer summary: {}", customer_summary(data));
        "Customer webhook processed"
    })
    .await
}

/// Shared body for the JSON-only sub-endpoints: parse, record, summarize.
async fn json_endpoint(
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
    path: &str,
    summarize: impl FnOnce(&Value) -> &'static str,
) -> Response {
    let req = raw_request(&headers, body, connect_info);

    let data = match serde_json::from_slice::<Value>(&req.body) {
        Ok(value) => value,
        Err(e) => return bad_request(e.to_string()),
    };

    let message = summarize(&data);
    let payload = DecodedPayload::Json(data);
    record::log_request(&RequestRecord::new(&req, path, &payload));

    (StatusCode::OK, Json(AckResponse::success(message))).into_response()
}

fn bad_request(message: String) -> Response {
    error!("Lastlink webhook error: {}", message);
    (StatusCode::BAD_REQUEST, Json(AckResponse::error(message))).into_response()
}

fn detect_event_type(header: &Option<String>, payload: &DecodedPayload) -> String {
    match payload {
        DecodedPayload::Json(Value::Object(map)) => {
            for key in ["event_type", "type"] {
                if let Some(Value::String(s)) = map.get(key) {
                    return s.clone();
                }
            }
        }
        DecodedPayload::Form(fields) => {
            for key in ["event_type", "type"] {
                if let Some(s) = fields.get(key) {
                    return s.clone();
                }
            }
        }
        _ => {}
    }
    header.clone().unwrap_or_else(|| "unknown".to_string())
}

fn order_summary(data: &Value) -> String {
    format!(
        "id={}, status={}, customer={}, email={}",
        field(data, &["order_id", "id"]),
        field(data, &["status"]),
        nested(data, "customer", "name"),
        nested(data, "customer", "email"),
    )
}

fn payment_summary(data: &Value) -> String {
    format!(
        "id={}, amount={}, status={}, method={}",
        field(data, &["payment_id", "id"]),
        field(data, &["amount"]),
        field(data, &["status"]),
        field(data, &["payment_method"]),
    )
}

fn customer_summary(data: &Value) -> String {
    format!(
        "id={}, name={}, email={}, action={}",
        field(data, &["customer_id", "id"]),
        field(data, &["name"]),
        field(data, &["email"]),
        field(data, &["action"]),
    )
}

/// First present key rendered for the summary line; "N/A" when absent.
fn field(data: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| data.get(key))
        .map(render)
        .unwrap_or_else(|| "N/A".to_string())
}

fn nested(data: &Value, outer: &str, inner: &str) -> String {
    data.get(outer)
        .and_then(|v| v.get(inner))
        .map(render)
        .unwrap_or_else(|| "N/A".to_string())
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_type_prefers_payload_over_header() {
        let payload = DecodedPayload::Json(json!({"event_type": "purchase"}));
        let header = Some("from-header".to_string());
        assert_eq!(detect_event_type(&header, &payload), "purchase");
    }

    #[test]
    fn event_type_falls_back_to_type_then_header() {
        let payload = DecodedPayload::Json(json!({"type": "refund"}));
        assert_eq!(detect_event_type(&None, &payload), "refund");

        let payload = DecodedPayload::Json(json!({"other": 1}));
        let header = Some("order.paid".to_string());
        assert_eq!(detect_event_type(&header, &payload), "order.paid");
        assert_eq!(detect_event_type(&None, &payload), "unknown");
    }

    #[test]
    fn event_type_read_from_form_payload() {
        let fields = std::collections::BTreeMap::from([(
            "event_type".to_string(),
            "purchase".to_string(),
        )]);
        let payload = DecodedPayload::Form(fields);
        assert_eq!(detect_event_type(&None, &payload), "purchase");

        let fields =
            std::collections::BTreeMap::from([("type".to_string(), "refund".to_string())]);
        let payload = DecodedPayload::Form(fields);
        let header = Some("from-header".to_string());
        assert_eq!(detect_event_type(&header, &payload), "refund");
    }

    #[test]
    fn customer_summary_includes_name() {
        let data = json!({
            "customer_id": "c_9",
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "action": "created",
        });
        let summary = customer_summary(&data);
        assert_eq!(
            summary,
            "id=c_9, name=Ada Lovelace, email=ada@example.com, action=created"
        );
    }

    #[test]
    fn summaries_render_absent_fields_as_na() {
        let summary = order_summary(&json!({"id": 7}));
        assert_eq!(summary, "id=7, status=N/A, customer=N/A, email=N/A");
        let summary = payment_summary(&json!({}));
        assert_eq!(summary, "id=N/A, amount=N/A, status=N/A, method=N/A");
    }

    #[test]
    fn field_takes_first_present_key() {
        let data = json!({"id": 42, "status": "paid"});
        assert_eq!(field(&data, &["payment_id", "id"]), "42");
        assert_eq!(field(&data, &["status"]), "paid");
        assert_eq!(field(&data, &["missing"]), "N/A");
    }

    #[test]
    fn nested_handles_missing_paths() {
        let data = json!({"customer": {"name": "Ada"}});
        assert_eq!(nested(&data, "customer", "name"), "Ada");
        assert_eq!(nested(&data, "customer", "email"), "N/A");
        assert_eq!(nested(&data, "missing", "name"), "N/A");
    }
}
