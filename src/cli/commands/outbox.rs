//! Queue management commands.

use crate::cli::args::OutputFormat;
use crate::error::VetboxError;
use crate::features::outbox::Outbox;
use crate::output::{format_queue, format_report, format_status, to_json};

/// Execute drain command
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn drain(outbox: &Outbox, format: OutputFormat) -> Result<String, VetboxError> {
    let report = outbox.drain();
    format_report(&report, format)
}

/// Execute status command
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn status(outbox: &Outbox, format: OutputFormat) -> Result<String, VetboxError> {
    format_status(
        outbox.len(),
        &outbox.state(),
        outbox.connectivity().is_online(),
        outbox.storage_key(),
        format,
    )
}

/// Execute list command
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn list(outbox: &Outbox, format: OutputFormat) -> Result<String, VetboxError> {
    format_queue(&outbox.pending(), outbox.storage_key(), format)
}

/// Execute discard command
///
/// # Errors
///
/// Returns `VetboxError::NotFound` if nothing is queued at `position`.
pub fn discard(
    outbox: &Outbox,
    position: usize,
    format: OutputFormat,
) -> Result<String, VetboxError> {
    let removed = outbox.discard(position)?;

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({
            "discarded": removed,
            "remaining": outbox.len(),
        })),
        OutputFormat::Pretty => Ok(format!("Discarded {}", removed.label())),
    }
}

/// Execute clear command
///
/// # Errors
///
/// Returns `VetboxError::Config` without `--force`.
pub fn clear(outbox: &Outbox, force: bool, format: OutputFormat) -> Result<String, VetboxError> {
    if !force {
        return Err(VetboxError::Config(
            "Use --force to clear the outbox".to_string(),
        ));
    }
    let count = outbox.clear();

    match format {
        OutputFormat::Json => to_json(&serde_json::json!({"cleared": count})),
        OutputFormat::Pretty => Ok(format!("Cleared {count} queued requests")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::outbox::dispatch::MockTransport;
    use crate::features::outbox::{QueueStore, QueuedRequest, StaticConnectivity};
    use crate::storage::MemoryKvStore;

    fn offline_outbox(queue: &[QueuedRequest]) -> Outbox {
        let store = QueueStore::new(Box::new(MemoryKvStore::new()), "q");
        store.save(queue);
        Outbox::new(
            store,
            Box::new(MockTransport::new()),
            Box::new(StaticConnectivity::new(false)),
        )
    }

    #[test]
    fn test_clear_requires_force() {
        let outbox = offline_outbox(&[QueuedRequest::post("/a")]);
        assert!(matches!(
            clear(&outbox, false, OutputFormat::Pretty),
            Err(VetboxError::Config(_))
        ));
        assert_eq!(outbox.len(), 1);

        let output = clear(&outbox, true, OutputFormat::Json).unwrap();
        assert!(output.contains("\"cleared\": 1"));
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_discard_out_of_range() {
        let outbox = offline_outbox(&[QueuedRequest::post("/a")]);
        assert!(matches!(
            discard(&outbox, 3, OutputFormat::Pretty),
            Err(VetboxError::NotFound(_))
        ));
    }

    #[test]
    fn test_discard_reports_label() {
        let outbox = offline_outbox(&[QueuedRequest::post("/a"), QueuedRequest::post("/b")]);
        assert_eq!(
            discard(&outbox, 1, OutputFormat::Pretty).unwrap(),
            "Discarded POST /b"
        );
        assert_eq!(outbox.len(), 1);
    }

    #[test]
    fn test_drain_while_offline_blocks() {
        let outbox = offline_outbox(&[QueuedRequest::post("/a")]);

        let output = drain(&outbox, OutputFormat::Json).unwrap();
        assert!(output.contains("\"remaining\": 1"));
        assert!(output.contains("\"blocked_by\": \"offline\""));
    }

    #[test]
    fn test_status_json() {
        let outbox = offline_outbox(&[QueuedRequest::post("/a")]);

        let output = status(&outbox, OutputFormat::Json).unwrap();
        assert!(output.contains("\"pending\": 1"));
        assert!(output.contains("\"online\": false"));
    }
}
