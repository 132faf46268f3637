//! Outbox coordinator.
//!
//! Decides between sending now and queueing, drains the queue in FIFO order
//! when connectivity returns, and prunes entries the server permanently
//! rejects.
//!
//! Queue mutations are load-modify-save steps under one lock. Network
//! attempts run outside that lock, so a slow drain never blocks an offline
//! submission; a drained head is only removed if it is still the head.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::connectivity::Connectivity;
use super::dispatch::{resolve_timeout, HttpResponse, Transport, TransportError};
use super::request::QueuedRequest;
use super::store::QueueStore;
use crate::config::DEFAULT_TIMEOUT_MS;
use crate::error::VetboxError;

/// Result of [`Outbox::submit_or_queue`].
///
/// A timeout is not an outcome: it is returned as [`VetboxError::Timeout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A response was received. Its status may still be an error.
    Delivered(HttpResponse),
    /// The request was stored for later replay.
    QueuedOffline,
}

impl DispatchOutcome {
    /// Whether the request went into the queue.
    #[must_use]
    pub const fn is_queued(&self) -> bool {
        matches!(self, Self::QueuedOffline)
    }
}

/// Drain state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "snake_case")]
pub enum DrainState {
    /// No drain running; the last one (if any) emptied the queue.
    Idle,
    /// A drain pass is in flight.
    Draining,
    /// The last pass stopped on a failing head entry.
    Blocked(String),
}

impl std::fmt::Display for DrainState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Draining => write!(f, "draining"),
            Self::Blocked(error) => write!(f, "blocked ({error})"),
        }
    }
}

/// Summary of one drain pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Entries replayed with a 2xx response.
    pub delivered: usize,
    /// Entries dropped as permanently unsendable.
    pub dropped: usize,
    /// Entries still queued after the pass.
    pub remaining: usize,
    /// Why the pass stopped early, if it did.
    pub blocked_by: Option<String>,
    /// Another drain was already running, so this call did nothing.
    pub skipped: bool,
}

impl DrainReport {
    /// Whether the pass was stopped by a failing entry.
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        self.blocked_by.is_some()
    }
}

/// Clears the single-flight flag when a drain pass ends.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

enum Replay {
    Delivered,
    Dropped(String),
    Blocked(String),
}

/// The offline outbox.
pub struct Outbox {
    store: QueueStore,
    transport: Box<dyn Transport>,
    connectivity: Box<dyn Connectivity>,
    default_timeout: Option<Duration>,
    queue_lock: Mutex<()>,
    draining: AtomicBool,
    state: Mutex<DrainState>,
}

impl Outbox {
    /// Create an outbox with the default 10 second timeout.
    #[must_use]
    pub fn new(
        store: QueueStore,
        transport: Box<dyn Transport>,
        connectivity: Box<dyn Connectivity>,
    ) -> Self {
        Self {
            store,
            transport,
            connectivity,
            default_timeout: Some(Duration::from_millis(DEFAULT_TIMEOUT_MS)),
            queue_lock: Mutex::new(()),
            draining: AtomicBool::new(false),
            state: Mutex::new(DrainState::Idle),
        }
    }

    /// Replace the default attempt timeout. `None` waits indefinitely.
    #[must_use]
    pub const fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// The connectivity provider this outbox consults.
    #[must_use]
    pub fn connectivity(&self) -> &dyn Connectivity {
        self.connectivity.as_ref()
    }

    /// The storage key of the queue.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        self.store.key()
    }

    /// Current drain state.
    #[must_use]
    pub fn state(&self) -> DrainState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_state(&self, state: DrainState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn lock_queue(&self) -> MutexGuard<'_, ()> {
        self.queue_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one load-modify-save step on the queue.
    fn update_queue<T>(&self, f: impl FnOnce(&mut Vec<QueuedRequest>) -> T) -> T {
        let _guard = self.lock_queue();
        let mut queue = self.store.load();
        let result = f(&mut queue);
        self.store.save(&queue);
        result
    }

    /// Snapshot of the queued requests, head first.
    #[must_use]
    pub fn pending(&self) -> Vec<QueuedRequest> {
        let _guard = self.lock_queue();
        self.store.load()
    }

    /// Number of queued requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending().len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Send `request` now if online, otherwise queue it.
    ///
    /// `timeout_override` is the per-form timeout setting; see
    /// [`resolve_timeout`].
    ///
    /// # Errors
    ///
    /// - [`VetboxError::Timeout`] if the live attempt timed out. The queue is
    ///   left untouched.
    /// - [`VetboxError::NotQueueable`] if the request has to be queued but
    ///   targets an authentication endpoint.
    /// - [`VetboxError::Http`] if the descriptor is not a valid request.
    pub fn submit_or_queue(
        &self,
        request: QueuedRequest,
        timeout_override: Option<&str>,
    ) -> Result<DispatchOutcome, VetboxError> {
        if self.connectivity.is_online() {
            let timeout = resolve_timeout(timeout_override, self.default_timeout);
            match self.transport.send(&request, timeout) {
                Ok(response) => {
                    debug!(request = %request.label(), status = response.status, "delivered");
                    return Ok(DispatchOutcome::Delivered(response));
                }
                Err(TransportError::Timeout(limit)) => {
                    warn!(request = %request.label(), "submission timed out, not queued");
                    return Err(VetboxError::Timeout {
                        url: request.url,
                        timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    });
                }
                Err(TransportError::Invalid(reason)) => return Err(VetboxError::Http(reason)),
                Err(TransportError::Network(reason)) => {
                    info!(request = %request.label(), %reason, "network failed while online, queueing");
                }
            }
        }

        self.enqueue(request)?;
        Ok(DispatchOutcome::QueuedOffline)
    }

    fn enqueue(&self, request: QueuedRequest) -> Result<(), VetboxError> {
        if request.is_auth_endpoint() {
            return Err(VetboxError::NotQueueable(request.url));
        }

        info!(request = %request.label(), "queued for replay");
        self.update_queue(|queue| queue.push(request));
        Ok(())
    }

    /// Replay queued requests in FIFO order.
    ///
    /// 2xx removes the head, 4xx drops it, anything else stops the pass with
    /// the head still queued. While offline a non-empty queue is left as is
    /// and the pass reports itself blocked. Only one pass runs at a time; a concurrent call
    /// returns a report with `skipped` set.
    pub fn drain(&self) -> DrainReport {
        if self
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("drain already in flight");
            return DrainReport {
                remaining: self.len(),
                skipped: true,
                ..DrainReport::default()
            };
        }
        let _flight = FlightGuard(&self.draining);
        self.set_state(DrainState::Draining);

        let offline = !self.connectivity.is_online();
        let mut report = DrainReport::default();
        loop {
            let Some(head) = self.pending().into_iter().next() else {
                break;
            };
            if offline {
                debug!("offline, nothing replayed");
                report.blocked_by = Some("offline".to_string());
                break;
            }

            match self.replay(&head) {
                Replay::Delivered => {
                    self.remove_head(&head);
                    report.delivered += 1;
                }
                Replay::Dropped(reason) => {
                    warn!(request = %head.label(), %reason, "dropping permanently rejected request");
                    self.remove_head(&head);
                    report.dropped += 1;
                }
                Replay::Blocked(reason) => {
                    info!(request = %head.label(), %reason, "drain stopped, will retry");
                    report.blocked_by = Some(reason);
                    break;
                }
            }
        }

        report.remaining = self.update_queue(|queue| queue.len());
        self.set_state(
            report
                .blocked_by
                .clone()
                .map_or(DrainState::Idle, DrainState::Blocked),
        );

        info!(
            delivered = report.delivered,
            dropped = report.dropped,
            remaining = report.remaining,
            "drain finished"
        );
        report
    }

    fn replay(&self, request: &QueuedRequest) -> Replay {
        match self.transport.send(request, self.default_timeout) {
            Ok(response) if response.is_success() => Replay::Delivered,
            Ok(response) if response.is_client_error() => {
                Replay::Dropped(format!("HTTP {}", response.status))
            }
            Ok(response) => Replay::Blocked(format!("HTTP {}", response.status)),
            Err(TransportError::Invalid(reason)) => Replay::Dropped(reason),
            Err(e) => Replay::Blocked(e.to_string()),
        }
    }

    fn remove_head(&self, sent: &QueuedRequest) {
        self.update_queue(|queue| {
            if queue.first() == Some(sent) {
                queue.remove(0);
            } else {
                debug!(request = %sent.label(), "head changed during replay, leaving queue as is");
            }
        });
    }

    /// Remove the entry at zero-based `position`.
    ///
    /// # Errors
    ///
    /// Returns [`VetboxError::NotFound`] if no entry is at that position.
    pub fn discard(&self, position: usize) -> Result<QueuedRequest, VetboxError> {
        self.update_queue(|queue| {
            if position < queue.len() {
                Ok(queue.remove(position))
            } else {
                Err(VetboxError::NotFound(format!(
                    "queue entry {position} (queue has {} entries)",
                    queue.len()
                )))
            }
        })
    }

    /// Empty the queue, returning how many entries were removed.
    pub fn clear(&self) -> usize {
        self.update_queue(|queue| {
            let removed = queue.len();
            queue.clear();
            removed
        })
    }
}
