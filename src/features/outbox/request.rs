//! Queued request descriptors.
//!
//! A [`QueuedRequest`] is exactly what gets persisted: a JSON object
//! `{url, method, headers, body?}` where `body` is one of
//! `{"form": [[key, value], ...]}`, `{"json": ...}` or `{"text": "..."}`.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Headers the transport computes itself; they are never stored.
const MANAGED_HEADERS: [&str; 4] = ["content-length", "host", "connection", "transfer-encoding"];

static AUTH_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/(?:login|register|logout)/?$")
        .unwrap_or_else(|e| panic!("Invalid auth path regex: {e}"))
});

/// Content type for raw text bodies.
pub const TEXT_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";

/// Request body, stored in exactly one representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestBody {
    /// Form-encoded pairs, in submission order. Keys may repeat.
    Form(Vec<(String, String)>),
    /// Arbitrary JSON value.
    Json(serde_json::Value),
    /// Raw text.
    Text(String),
}

impl RequestBody {
    /// Look up the first value of a form field.
    #[must_use]
    pub fn form_value(&self, name: &str) -> Option<&str> {
        match self {
            Self::Form(pairs) => pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            Self::Json(_) | Self::Text(_) => None,
        }
    }
}

/// A pending mutation, as persisted in the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedRequest {
    /// Destination endpoint, absolute or relative to the server base URL.
    pub url: String,
    /// HTTP verb.
    #[serde(default = "default_method")]
    pub method: String,
    /// Caller-supplied headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Request body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
}

fn default_method() -> String {
    "POST".to_string()
}

impl QueuedRequest {
    /// A bodiless `POST` to `url`.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Override the HTTP verb. The verb is normalized to upper case.
    #[must_use]
    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.trim().to_ascii_uppercase();
        self
    }

    /// Add a header. Transport-managed headers are silently ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        let name = name.trim();
        if !is_managed_header(name) {
            self.headers.insert(name.to_string(), value.to_string());
        }
        self
    }

    /// Attach a form-encoded body.
    #[must_use]
    pub fn with_form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.body = Some(RequestBody::Form(pairs));
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_json(mut self, value: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    /// Attach a raw text body.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(text.into()));
        self
    }

    /// Whether this request targets a login, register or logout endpoint.
    #[must_use]
    pub fn is_auth_endpoint(&self) -> bool {
        is_auth_endpoint(&self.url)
    }

    /// Short `METHOD url` label for logs and listings.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// Whether `url`'s path ends in `/login`, `/register` or `/logout`.
///
/// Query string and fragment are ignored, as is a single trailing slash.
#[must_use]
pub fn is_auth_endpoint(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    AUTH_PATH.is_match(path)
}

fn is_managed_header(name: &str) -> bool {
    MANAGED_HEADERS
        .iter()
        .any(|managed| managed.eq_ignore_ascii_case(name))
}
