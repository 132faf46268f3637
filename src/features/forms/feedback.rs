//! Server replies and user-visible feedback.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::features::outbox::HttpResponse;

/// Shown when a submission was stored for later.
pub const QUEUED_MESSAGE: &str =
    "You are offline. The submission was saved and will be sent when the connection returns.";

/// Shown when a 2xx reply carries no message.
pub const SUCCESS_MESSAGE: &str = "Saved.";

/// Shown when the live attempt timed out.
pub const TIMEOUT_MESSAGE: &str = "The server did not respond in time. Please try again.";

/// The JSON body the clinic server answers with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerReply {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    /// Flashed messages: plain strings or `[category, message]` pairs.
    #[serde(default)]
    pub messages: Vec<Value>,
    #[serde(default)]
    pub category: Option<String>,
    /// Replacement markup for the form's target element.
    #[serde(default)]
    pub html: Option<String>,
}

impl ServerReply {
    /// Parse a response body. Empty or malformed bodies give `None`.
    #[must_use]
    pub fn parse(body: &str) -> Option<Self> {
        if body.trim().is_empty() {
            return None;
        }
        serde_json::from_str(body).ok()
    }

    /// `message`, or the flashed `messages` joined, whichever is present.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        if let Some(message) = self.message.as_deref().filter(|m| !m.trim().is_empty()) {
            return Some(message.to_string());
        }

        let joined = self
            .messages
            .iter()
            .filter_map(flashed_text)
            .collect::<Vec<_>>()
            .join(" ");
        (!joined.is_empty()).then_some(joined)
    }
}

fn flashed_text(entry: &Value) -> Option<String> {
    match entry {
        Value::String(text) => Some(text.clone()),
        Value::Array(pair) => pair.last().and_then(Value::as_str).map(str::to_string),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// State shown next to the submitting control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum Feedback {
    /// The attempt is in progress.
    Loading,
    Success(String),
    Error(String),
    /// Stored for replay. Neutral, not an error.
    Queued(String),
}

impl Feedback {
    /// Feedback for a received response.
    #[must_use]
    pub fn from_response(response: &HttpResponse, reply: Option<&ServerReply>) -> Self {
        let text = reply.and_then(ServerReply::text);
        if succeeded(response, reply) {
            Self::Success(text.unwrap_or_else(|| SUCCESS_MESSAGE.to_string()))
        } else {
            Self::Error(text.unwrap_or_else(|| format!("Request failed (HTTP {})", response.status)))
        }
    }

    /// The message, empty while loading.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Loading => "",
            Self::Success(message) | Self::Error(message) | Self::Queued(message) => message,
        }
    }
}

/// 2xx and the reply does not say otherwise.
#[must_use]
pub fn succeeded(response: &HttpResponse, reply: Option<&ServerReply>) -> bool {
    response.is_success() && reply.and_then(|r| r.success) != Some(false)
}
