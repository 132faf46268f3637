//! Network dispatcher.
//!
//! Performs exactly one HTTP attempt per call, bounded by an optional
//! timeout. It never touches the queue.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::request::{QueuedRequest, RequestBody, TEXT_CONTENT_TYPE};
use crate::error::VetboxError;

/// Override values that disable the timeout entirely.
const DISABLED_TIMEOUT_VALUES: [&str; 6] = ["0", "false", "off", "no", "none", "disabled"];

/// A response as received, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, lower-cased names.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body as text; empty when there was none.
    #[serde(default)]
    pub body: String,
}

impl HttpResponse {
    /// A response with the given status and body and no headers.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Whether the status is 4xx, a permanent client error.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }
}

/// Why an attempt produced no response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No response arrived before the timeout.
    #[error("timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The connection failed or dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The descriptor cannot be turned into a request at all.
    #[error("invalid request: {0}")]
    Invalid(String),
}

/// One-shot HTTP delivery.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    /// Send `request` once. `timeout = None` waits indefinitely.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no response was obtained.
    fn send(
        &self,
        request: &QueuedRequest,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError>;
}

/// Resolve the effective timeout for one attempt.
///
/// A per-form override wins. Recognized disabling values mean no timeout; a
/// positive number is taken as milliseconds; anything else uses `default`.
#[must_use]
pub fn resolve_timeout(override_value: Option<&str>, default: Option<Duration>) -> Option<Duration> {
    let Some(raw) = override_value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return default;
    };

    if DISABLED_TIMEOUT_VALUES
        .iter()
        .any(|disabled| disabled.eq_ignore_ascii_case(raw))
    {
        return None;
    }

    if let Ok(ms) = raw.parse::<u64>() {
        return Some(Duration::from_millis(ms));
    }

    match raw.parse::<f64>() {
        Ok(ms) if ms.is_finite() && ms > 0.0 => Some(Duration::from_secs_f64(ms / 1000.0)),
        Ok(ms) if ms == 0.0 => None,
        _ => default,
    }
}

/// [`Transport`] over a blocking `reqwest` client.
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Build a transport resolving relative URLs against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is malformed or the client cannot be
    /// built.
    pub fn new(base_url: &str) -> Result<Self, VetboxError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| VetboxError::Http(format!("Invalid base URL {base_url}: {e}")))?;

        // Per-attempt timeouts only; the client itself never gives up.
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| VetboxError::Http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// The URL a request descriptor resolves to.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Invalid`] if the URL cannot be resolved.
    pub fn resolve_url(&self, url: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(url)
            .map_err(|e| TransportError::Invalid(format!("bad url {url}: {e}")))
    }
}

fn header_map(request: &QueuedRequest) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &request.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::Invalid(format!("header {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| TransportError::Invalid(format!("header value for {name}: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn classify(error: &reqwest::Error, timeout: Option<Duration>) -> TransportError {
    match timeout {
        Some(limit) if error.is_timeout() => TransportError::Timeout(limit),
        _ => TransportError::Network(error.to_string()),
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: &QueuedRequest,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        let url = self.resolve_url(&request.url)?;
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| TransportError::Invalid(format!("method {}: {e}", request.method)))?;
        let headers = header_map(request)?;

        let mut builder = self.client.request(method, url);
        builder = match &request.body {
            Some(RequestBody::Form(pairs)) => builder.form(pairs),
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Text(text)) => builder
                .header(CONTENT_TYPE, TEXT_CONTENT_TYPE)
                .body(text.clone()),
            None => builder,
        };
        // Caller headers replace the defaults set by the body encoders.
        builder = builder.headers(headers);
        if let Some(limit) = timeout {
            builder = builder.timeout(limit);
        }

        debug!(request = %request.label(), ?timeout, "dispatching");
        let response = builder.send().map_err(|e| classify(&e, timeout))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        // The server has answered; a truncated body must not turn that into a
        // retryable failure.
        let body = response.text().unwrap_or_else(|e| {
            warn!(request = %request.label(), status, error = %e, "failed to read response body");
            String::new()
        });

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
