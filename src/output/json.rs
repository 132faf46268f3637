//! JSON output formatting for vetbox.

use serde::Serialize;
use serde_json::json;

use crate::error::VetboxError;
use crate::features::outbox::{DrainState, QueuedRequest};

/// Format the queued requests as JSON
///
/// # Errors
///
/// Returns `VetboxError::Parse` if JSON serialization fails.
pub fn format_queue_json(queue: &[QueuedRequest], key: &str) -> Result<String, VetboxError> {
    let items: Vec<_> = queue
        .iter()
        .enumerate()
        .map(|(position, request)| json!({"position": position, "request": request}))
        .collect();
    let output = json!({
        "key": key,
        "count": queue.len(),
        "items": items
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format the outbox status as JSON
///
/// # Errors
///
/// Returns `VetboxError::Parse` if JSON serialization fails.
pub fn format_status_json(
    pending: usize,
    state: &DrainState,
    online: bool,
    key: &str,
) -> Result<String, VetboxError> {
    let output = json!({
        "pending": pending,
        "drain": state,
        "online": online,
        "key": key
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Generic JSON formatter for any serializable type
///
/// # Errors
///
/// Returns `VetboxError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, VetboxError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_format_queue_json_empty() {
        let result = format_queue_json(&[], "vetbox.offlineQueue").unwrap();

        assert!(result.contains("\"key\": \"vetbox.offlineQueue\""));
        assert!(result.contains("\"count\": 0"));
        assert!(result.contains("\"items\": []"));
    }

    #[test]
    fn test_format_queue_json_positions() {
        let queue = vec![
            QueuedRequest::post("/api/shares"),
            QueuedRequest::post("/api/sales/3").with_method("DELETE"),
        ];
        let value: Value = serde_json::from_str(&format_queue_json(&queue, "q").unwrap()).unwrap();

        assert_eq!(value["count"], 2);
        assert_eq!(value["items"][1]["position"], 1);
        assert_eq!(value["items"][1]["request"]["method"], "DELETE");
    }

    #[test]
    fn test_format_status_json_blocked() {
        let state = DrainState::Blocked("HTTP 503".to_string());
        let value: Value =
            serde_json::from_str(&format_status_json(2, &state, true, "q").unwrap()).unwrap();

        assert_eq!(value["pending"], 2);
        assert_eq!(value["drain"]["state"], "blocked");
        assert_eq!(value["drain"]["error"], "HTTP 503");
        assert_eq!(value["online"], true);
    }
}
