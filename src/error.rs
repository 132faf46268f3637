//! Error types for vetbox.

use thiserror::Error;

/// Errors raised by the outbox library and the CLI.
#[derive(Debug, Error)]
pub enum VetboxError {
    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The backing `SQLite` store failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Filesystem or terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    /// YAML (de)serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The HTTP client could not be built or a URL was malformed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A live submission got no response in time.
    ///
    /// The request may or may not have been applied by the server, so it is
    /// never queued for replay.
    #[error("Request to {url} timed out after {timeout_ms} ms")]
    Timeout {
        /// Destination of the timed-out request.
        url: String,
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// The request could not be sent and its endpoint may not be queued.
    #[error("Cannot queue request to {0}: authentication endpoints are never replayed")]
    NotQueueable(String),

    /// A requested item does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl VetboxError {
    /// Whether this error is the distinguished timeout kind.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = VetboxError::Timeout {
            url: "/api/appointments".to_string(),
            timeout_ms: 10_000,
        };
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Request to /api/appointments timed out after 10000 ms"
        );
    }

    #[test]
    fn test_other_errors_are_not_timeouts() {
        assert!(!VetboxError::NotFound("entry 3".to_string()).is_timeout());
        assert!(!VetboxError::Http("bad url".to_string()).is_timeout());
    }
}
