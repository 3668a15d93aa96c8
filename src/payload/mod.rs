//! Content-type driven decoding of webhook bodies.
//!
//! Every branch degrades to a value instead of propagating a parse failure:
//! webhook senders commonly disable themselves or retry-storm on non-2xx
//! responses, so a malformed body must still be acknowledgeable.

pub mod form;
pub mod xml;

use std::collections::BTreeMap;

use axum::body::Bytes;
use serde::Serialize;
use tracing::warn;

pub use xml::{XmlNode, XmlTree};

/// One incoming webhook call, captured before any decoding.
#[derive(Debug, Clone)]
pub struct RawRequest {
    /// Raw `Content-Type` header value, parameters intact.
    pub content_type: Option<String>,
    /// Headers with lower-cased names.
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
    pub source_address: String,
}

impl RawRequest {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Content type lower-cased with parameters stripped, for matching.
    pub fn media_type(&self) -> String {
        self.content_type
            .as_deref()
            .unwrap_or("")
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase()
    }
}

/// Decoded body, tagged by how it was interpreted. Serializes untagged so
/// log records show each variant's natural JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DecodedPayload {
    Json(serde_json::Value),
    Xml(XmlTree),
    Form(BTreeMap<String, String>),
    Multipart(MultipartSummary),
    Raw(RawBlob),
    Error(DecodeError),
}

/// Multipart body reduced to field values and uploaded file names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MultipartSummary {
    pub form_data: BTreeMap<String, String>,
    pub files: Vec<String>,
}

/// Body of an unrecognized content type, kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawBlob {
    pub content_type: String,
    pub raw_data: String,
    pub size: usize,
}

/// A decode failure, carrying the original text so it is never dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeError {
    pub error: String,
    pub raw_body: String,
}

impl DecodeError {
    fn new(error: impl Into<String>, raw_body: String) -> Self {
        Self {
            error: error.into(),
            raw_body,
        }
    }
}

/// Decode a request body according to its content type.
///
/// First containment match on the normalized media type wins; anything
/// unrecognized (or an absent content type) is kept as a raw blob.
pub async fn dispatch(req: &RawRequest) -> DecodedPayload {
    let media_type = req.media_type();

    if media_type.contains("application/json") {
        return decode_json(req);
    }
    if media_type.contains("application/xml") || media_type.contains("text/xml") {
        return decode_xml(req);
    }
    if media_type.contains("application/x-www-form-urlencoded") {
        return DecodedPayload::Form(form::parse_urlencoded(&req.body));
    }
    if media_type.contains("multipart/form-data") {
        return decode_multipart(req).await;
    }

    DecodedPayload::Raw(RawBlob {
        content_type: req.content_type.clone().unwrap_or_else(|| "unknown".to_string()),
        // Byte length of the body, not of the lossily decoded text.
        size: req.body.len(),
        raw_data: req.body_text(),
    })
}

fn decode_json(req: &RawRequest) -> DecodedPayload {
    if req.body.is_empty() {
        return DecodedPayload::Error(DecodeError::new("Empty JSON body", String::new()));
    }
    match serde_json::from_slice(&req.body) {
        Ok(value) => DecodedPayload::Json(value),
        Err(e) => {
            warn!("JSON parse error from {}: {}", req.source_address, e);
            DecodedPayload::Error(DecodeError::new("Invalid JSON", req.body_text()))
        }
    }
}

fn decode_xml(req: &RawRequest) -> DecodedPayload {
    let text = req.body_text();
    match xml::normalize(&text) {
        Ok(tree) => DecodedPayload::Xml(tree),
        Err(e) => {
            warn!("XML parse error from {}: {}", req.source_address, e);
            DecodedPayload::Error(DecodeError::new("Invalid XML", text))
        }
    }
}

async fn decode_multipart(req: &RawRequest) -> DecodedPayload {
    let content_type = req.content_type.as_deref().unwrap_or("");
    match form::parse_multipart(content_type, req.body.clone()).await {
        Ok(summary) => DecodedPayload::Multipart(summary),
        Err(e) => {
            warn!("Multipart parse error from {}: {}", req.source_address, e);
            DecodedPayload::Error(DecodeError::new("Invalid multipart body", req.body_text()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(content_type: Option<&str>, body: &str) -> RawRequest {
        RawRequest {
            content_type: content_type.map(|s| s.to_string()),
            headers: BTreeMap::new(),
            body: Bytes::from(body.to_string()),
            source_address: "127.0.0.1".to_string(),
        }
    }

    #[tokio::test]
    async fn json_body_is_parsed() {
        let req = request(Some("application/json"), r#"{"event":"push","id":7}"#);
        let payload = dispatch(&req).await;
        assert_eq!(payload, DecodedPayload::Json(json!({"event": "push", "id": 7})));
    }

    #[tokio::test]
    async fn json_charset_parameter_is_ignored() {
        let req = request(Some("Application/JSON; charset=utf-8"), "[1,2]");
        assert_eq!(dispatch(&req).await, DecodedPayload::Json(json!([1, 2])));
    }

    #[tokio::test]
    async fn invalid_json_degrades_to_fallback() {
        let req = request(Some("application/json"), "not valid json");
        match dispatch(&req).await {
            DecodedPayload::Error(e) => {
                assert_eq!(e.raw_body, "not valid json");
                assert!(!e.error.is_empty());
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_json_body_degrades_to_fallback() {
        let req = request(Some("application/json"), "");
        assert!(matches!(dispatch(&req).await, DecodedPayload::Error(_)));
    }

    #[tokio::test]
    async fn xml_body_is_normalized() {
        let req = request(Some("text/xml"), "<a><b>1</b><b>2</b></a>");
        match dispatch(&req).await {
            DecodedPayload::Xml(tree) => {
                let expected = XmlNode::List(vec![
                    XmlNode::Text("1".to_string()),
                    XmlNode::Text("2".to_string()),
                ]);
                match &tree["a"] {
                    XmlNode::Map(map) => assert_eq!(map["b"], expected),
                    other => panic!("expected map, got {:?}", other),
                }
            }
            other => panic!("expected xml, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_xml_keeps_raw_text() {
        let req = request(Some("application/xml"), "<a><b></a>");
        match dispatch(&req).await {
            DecodedPayload::Error(e) => assert_eq!(e.raw_body, "<a><b></a>"),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn form_last_value_wins() {
        let req = request(Some("application/x-www-form-urlencoded"), "a=1&a=2");
        let expected = BTreeMap::from([("a".to_string(), "2".to_string())]);
        assert_eq!(dispatch(&req).await, DecodedPayload::Form(expected));
    }

    #[tokio::test]
    async fn unknown_content_type_is_a_raw_blob() {
        let req = request(Some("application/octet-stream"), "0123456789");
        match dispatch(&req).await {
            DecodedPayload::Raw(blob) => {
                assert_eq!(blob.size, 10);
                assert_eq!(blob.raw_data, "0123456789");
                assert_eq!(blob.content_type, "application/octet-stream");
            }
            other => panic!("expected raw blob, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn absent_content_type_is_a_raw_blob() {
        let req = request(None, "hello");
        match dispatch(&req).await {
            DecodedPayload::Raw(blob) => {
                assert_eq!(blob.content_type, "unknown");
                assert_eq!(blob.size, 5);
            }
            other => panic!("expected raw blob, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn raw_blob_size_is_byte_length_for_invalid_utf8() {
        let req = RawRequest {
            content_type: Some("application/octet-stream".to_string()),
            headers: BTreeMap::new(),
            body: Bytes::from_static(&[0xff, 0xfe, 0x61, 0x62]),
            source_address: "127.0.0.1".to_string(),
        };
        match dispatch(&req).await {
            DecodedPayload::Raw(blob) => {
                assert_eq!(blob.size, 4);
                // The lossy text is larger: each invalid byte becomes U+FFFD.
                assert!(blob.raw_data.len() > 4);
            }
            other => panic!("expected raw blob, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_multipart_degrades_to_fallback() {
        let req = request(Some("multipart/form-data"), "no boundary here");
        assert!(matches!(dispatch(&req).await, DecodedPayload::Error(_)));
    }

    #[test]
    fn payload_serializes_untagged() {
        let payload = DecodedPayload::Raw(RawBlob {
            content_type: "text/plain".to_string(),
            raw_data: "hi".to_string(),
            size: 2,
        });
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({"content_type": "text/plain", "raw_data": "hi", "size": 2}));
    }
}
