//! Per-form configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::features::outbox::{QueuedRequest, RequestBody};

/// How a form submits and what happens afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Identifies the form for the double-submit guard and events.
    pub id: String,
    /// Destination URL.
    pub action: String,
    /// HTTP verb.
    #[serde(default = "default_method")]
    pub method: String,
    /// Headers sent with every submission.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Timeout override, e.g. `"2500"` or `"off"`.
    #[serde(default)]
    pub timeout: Option<String>,
    /// Ask this question before submitting.
    #[serde(default)]
    pub confirm: Option<String>,
    /// Selector of the element replaced by a reply's `html`.
    #[serde(default)]
    pub target: Option<String>,
    /// Skip the page reload after a successful submission.
    #[serde(default)]
    pub no_reload: bool,
    /// Fields that must be present and non-blank.
    #[serde(default)]
    pub required: Vec<String>,
}

fn default_method() -> String {
    "POST".to_string()
}

impl FormConfig {
    /// A `POST` form with no extras.
    #[must_use]
    pub fn new(id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            method: default_method(),
            headers: BTreeMap::new(),
            timeout: None,
            confirm: None,
            target: None,
            no_reload: false,
            required: Vec::new(),
        }
    }

    /// Build the request descriptor for one submission.
    #[must_use]
    pub fn request(&self, body: Option<RequestBody>) -> QueuedRequest {
        let mut request = self
            .headers
            .iter()
            .fold(QueuedRequest::post(&self.action), |request, (name, value)| {
                request.with_header(name, value)
            })
            .with_method(&self.method);
        request.body = body;
        request
    }

    /// The first required field missing from `body`, if any.
    ///
    /// Form bodies and JSON objects are checked by field name; a field with
    /// a blank or null value counts as missing. Other bodies satisfy no
    /// requirement.
    #[must_use]
    pub fn missing_field(&self, body: Option<&RequestBody>) -> Option<&str> {
        self.required
            .iter()
            .find(|field| !has_field(body, field))
            .map(String::as_str)
    }
}

fn has_field(body: Option<&RequestBody>, field: &str) -> bool {
    match body {
        Some(form @ RequestBody::Form(_)) => form
            .form_value(field)
            .is_some_and(|value| !value.trim().is_empty()),
        Some(RequestBody::Json(value)) => match value.get(field) {
            Some(serde_json::Value::String(text)) => !text.trim().is_empty(),
            Some(serde_json::Value::Null) | None => false,
            Some(_) => true,
        },
        Some(RequestBody::Text(_)) | None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_carries_form_settings() {
        let mut form = FormConfig::new("sale-delete", "/api/sales/3");
        form.method = "delete".to_string();
        form.headers.insert("X-CSRFToken".to_string(), "t0k".to_string());

        let request = form.request(None);
        assert_eq!(request.label(), "DELETE /api/sales/3");
        assert_eq!(
            request.headers.get("X-CSRFToken").map(String::as_str),
            Some("t0k")
        );
        assert!(request.body.is_none());
    }

    #[test]
    fn test_missing_field_in_form_body() {
        let mut form = FormConfig::new("animal", "/animals/new");
        form.required = vec!["name".to_string(), "species".to_string()];

        let complete = RequestBody::Form(vec![
            ("name".to_string(), "Rex".to_string()),
            ("species".to_string(), "dog".to_string()),
        ]);
        assert_eq!(form.missing_field(Some(&complete)), None);

        let blank = RequestBody::Form(vec![
            ("name".to_string(), "Rex".to_string()),
            ("species".to_string(), "  ".to_string()),
        ]);
        assert_eq!(form.missing_field(Some(&blank)), Some("species"));
        assert_eq!(form.missing_field(None), Some("name"));
    }

    #[test]
    fn test_missing_field_in_json_body() {
        let mut form = FormConfig::new("share", "/api/shares");
        form.required = vec!["tutor_id".to_string()];

        let present = RequestBody::Json(json!({"tutor_id": 5}));
        assert_eq!(form.missing_field(Some(&present)), None);

        let null = RequestBody::Json(json!({"tutor_id": null}));
        assert_eq!(form.missing_field(Some(&null)), Some("tutor_id"));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let form: FormConfig =
            serde_yaml::from_str("id: note\naction: /notes\ntimeout: 'off'\n").unwrap();
        assert_eq!(form.method, "POST");
        assert_eq!(form.timeout.as_deref(), Some("off"));
        assert!(!form.no_reload);
        assert!(form.required.is_empty());
    }
}
