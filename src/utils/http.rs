use chrono::Local;
use serde::Serialize;

/// JSON envelope returned to every webhook sender.
///
/// `status` is `"success"` or `"error"`; `timestamp` is ISO-8601 local time.
/// The optional fields only appear on the responses that carry them.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub status: &'static str,
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_received: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

impl AckResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
            timestamp: now(),
            data_received: None,
            content_type: None,
            event_type: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            timestamp: now(),
            data_received: None,
            content_type: None,
            event_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.data_received = Some(true);
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }
}

pub fn now() -> String {
    Local::now().to_rfc3339()
}
