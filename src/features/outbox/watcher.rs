//! Long-running drain loop.
//!
//! Drains when connectivity comes back (including the first poll at start-up)
//! and, while online, re-drains a blocked queue on an exponential backoff.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::debug;

use super::connectivity::{ConnectivityMonitor, Transition};
use super::coordinator::{DrainReport, Outbox};
use super::retry::RetryPolicy;

/// Drives [`Outbox::drain`] from connectivity transitions.
pub struct OutboxWatcher<'a> {
    outbox: &'a Outbox,
    monitor: ConnectivityMonitor<'a>,
    policy: RetryPolicy,
    failures: u32,
    retry_at: Option<Instant>,
}

impl<'a> OutboxWatcher<'a> {
    /// Watch `outbox`, backing off blocked drains per `policy`.
    #[must_use]
    pub fn new(outbox: &'a Outbox, policy: RetryPolicy) -> Self {
        Self {
            outbox,
            monitor: ConnectivityMonitor::new(outbox.connectivity()),
            policy,
            failures: 0,
            retry_at: None,
        }
    }

    /// When the next backoff re-drain is due, if one is scheduled.
    #[must_use]
    pub const fn retry_at(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Poll connectivity once and drain if warranted.
    pub fn tick(&mut self, now: Instant) -> Option<DrainReport> {
        match self.monitor.poll() {
            Some(Transition::Online) => return Some(self.drain(now)),
            Some(Transition::Offline) => {
                self.retry_at = None;
                return None;
            }
            None => {}
        }

        let online = self.monitor.last_status() == Some(true);
        if online && self.retry_at.is_some_and(|at| now >= at) {
            return Some(self.drain(now));
        }
        None
    }

    fn drain(&mut self, now: Instant) -> DrainReport {
        let report = self.outbox.drain();

        if report.is_blocked() {
            self.failures = self.failures.saturating_add(1);
            let delay = self.policy.next_delay(self.failures);
            debug!(failures = self.failures, ?delay, "drain blocked, backing off");
            self.retry_at = Some(now + delay);
        } else {
            self.failures = 0;
            self.retry_at = None;
        }

        report
    }

    /// Tick every `poll_interval` until `shutdown` is set.
    pub fn run(
        &mut self,
        poll_interval: Duration,
        shutdown: &AtomicBool,
        mut on_report: impl FnMut(&DrainReport),
    ) {
        while !shutdown.load(Ordering::SeqCst) {
            if let Some(report) = self.tick(Instant::now()) {
                on_report(&report);
            }
            std::thread::sleep(poll_interval);
        }
    }
}
