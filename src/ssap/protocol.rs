use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Type tag of a message sent to the TV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutboundKind {
    Register,
    Request,
}

/// Message sent from this client to the TV
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutboundMessage {
    #[serde(rename = "type")]
    pub kind: OutboundKind,
    /// Correlation id, echoed back by the TV on the matching response
    pub id: String,
    /// Endpoint (e.g. "ssap://audio/getVolume"); only set on requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl OutboundMessage {
    pub fn register(id: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: OutboundKind::Register,
            id: id.into(),
            uri: None,
            payload,
        }
    }

    pub fn request(uri: impl Into<String>, id: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: OutboundKind::Request,
            id: id.into(),
            uri: Some(uri.into()),
            payload,
        }
    }
}

/// Type tag of a message received from the TV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InboundKind {
    Registered,
    Response,
    Error,
    /// Anything else the TV may push; ignored
    #[serde(other)]
    Other,
}

/// Message received from the TV
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: InboundKind,
    /// Numeric ids are accepted and rendered as text; other shapes read as absent
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub payload: Value,
    /// Usually a string, but firmware versions differ
    #[serde(default)]
    pub error: Option<Value>,
}

impl InboundMessage {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// The `error` field as text, whatever its JSON shape.
    pub fn error_text(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(id) => Some(id),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
