//! Output formatting for vetbox.
//!
//! This module provides formatters for displaying outbox state in either
//! output format.

mod json;
mod pretty;

use crate::cli::args::OutputFormat;
use crate::error::VetboxError;
use crate::features::forms::Submission;
use crate::features::outbox::{DrainReport, DrainState, QueuedRequest};

pub use json::*;
pub use pretty::*;

/// Format the queued requests based on output format
///
/// # Errors
///
/// Returns `VetboxError::Parse` if JSON serialization fails.
pub fn format_queue(
    queue: &[QueuedRequest],
    key: &str,
    format: OutputFormat,
) -> Result<String, VetboxError> {
    match format {
        OutputFormat::Pretty => Ok(format_queue_pretty(queue)),
        OutputFormat::Json => format_queue_json(queue, key),
    }
}

/// Format the outbox status based on output format
///
/// # Errors
///
/// Returns `VetboxError::Parse` if JSON serialization fails.
pub fn format_status(
    pending: usize,
    state: &DrainState,
    online: bool,
    key: &str,
    format: OutputFormat,
) -> Result<String, VetboxError> {
    match format {
        OutputFormat::Pretty => Ok(format_status_pretty(pending, state, online, key)),
        OutputFormat::Json => format_status_json(pending, state, online, key),
    }
}

/// Format a drain report based on output format
///
/// # Errors
///
/// Returns `VetboxError::Parse` if JSON serialization fails.
pub fn format_report(report: &DrainReport, format: OutputFormat) -> Result<String, VetboxError> {
    match format {
        OutputFormat::Pretty => Ok(format_report_pretty(report)),
        OutputFormat::Json => to_json(report),
    }
}

/// Format a finished submission based on output format
///
/// # Errors
///
/// Returns `VetboxError::Parse` if JSON serialization fails.
pub fn format_submission(
    submission: &Submission,
    format: OutputFormat,
) -> Result<String, VetboxError> {
    match format {
        OutputFormat::Pretty => Ok(format_submission_pretty(submission)),
        OutputFormat::Json => to_json(submission),
    }
}
