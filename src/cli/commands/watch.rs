//! Watch command implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::cli::args::OutputFormat;
use crate::config::Config;
use crate::error::VetboxError;
use crate::features::outbox::{Outbox, OutboxWatcher, RetryPolicy};
use crate::output::format_report;

/// Execute watch command
///
/// Runs until interrupted; with `once` it polls a single time and returns
/// the report of the start-up drain, if one ran.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn watch(
    outbox: &Outbox,
    config: &Config,
    interval: Option<u64>,
    once: bool,
    format: OutputFormat,
) -> Result<String, VetboxError> {
    let mut watcher = OutboxWatcher::new(outbox, RetryPolicy::from(&config.retry));

    if once {
        return match watcher.tick(Instant::now()) {
            Some(report) => format_report(&report, format),
            None => Ok(String::new()),
        };
    }

    let secs = interval.unwrap_or(config.outbox.poll_interval_secs).max(1);
    let poll_interval = Duration::from_secs(secs);
    let shutdown = AtomicBool::new(false);
    let mut failed = None;
    watcher.run(poll_interval, &shutdown, |report| {
        match format_report(report, format) {
            Ok(output) => println!("{output}"),
            Err(e) => {
                failed = Some(e);
                shutdown.store(true, Ordering::SeqCst);
            }
        }
    });

    failed.map_or_else(|| Ok(String::new()), Err)
}
