//! Durable queue store.
//!
//! Persists the outbox queue as one JSON array under a single namespaced key.
//! Durability is best effort: storage failures are logged and swallowed, and
//! an in-memory mirror of the last saved queue keeps the current process
//! working. After a failed write the mirror is authoritative until a write
//! succeeds again, since the stored value no longer reflects the queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use super::request::QueuedRequest;
use crate::storage::KvStore;

/// Queue persistence over a [`KvStore`].
pub struct QueueStore {
    kv: Box<dyn KvStore>,
    key: String,
    mirror: Mutex<Vec<QueuedRequest>>,
    degraded: AtomicBool,
}

impl QueueStore {
    /// Create a store persisting under `key`.
    pub fn new(kv: Box<dyn KvStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
            mirror: Mutex::new(Vec::new()),
            degraded: AtomicBool::new(false),
        }
    }

    /// The storage key the queue lives under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the queue.
    ///
    /// Absent or unparsable values yield an empty queue. Authentication
    /// requests are filtered out, and when that removes anything the filtered
    /// queue is written back immediately.
    pub fn load(&self) -> Vec<QueuedRequest> {
        if self.degraded.load(Ordering::SeqCst) {
            return self.mirror_snapshot();
        }

        let stored = match self.kv.get(&self.key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<QueuedRequest>>(&raw) {
                Ok(queue) => queue,
                Err(e) => {
                    warn!(key = %self.key, error = %e, "discarding unreadable outbox queue");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "outbox storage unreadable, using in-memory queue");
                self.mirror_snapshot()
            }
        };

        let before = stored.len();
        let queue: Vec<QueuedRequest> = stored
            .into_iter()
            .filter(|request| !request.is_auth_endpoint())
            .collect();

        if queue.len() != before {
            debug!(removed = before - queue.len(), "pruned authentication requests from outbox");
            self.save(&queue);
        }

        queue
    }

    /// Persist the full queue, replacing the previous value.
    pub fn save(&self, queue: &[QueuedRequest]) {
        *self.mirror.lock().unwrap_or_else(PoisonError::into_inner) = queue.to_vec();

        let raw = match serde_json::to_string(queue) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to serialize outbox queue");
                self.degraded.store(true, Ordering::SeqCst);
                return;
            }
        };

        match self.kv.set(&self.key, &raw) {
            Ok(()) => {
                if self.degraded.swap(false, Ordering::SeqCst) {
                    debug!(key = %self.key, "outbox storage writable again");
                }
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to persist outbox queue, keeping it in memory");
                self.degraded.store(true, Ordering::SeqCst);
            }
        }
    }

    fn mirror_snapshot(&self) -> Vec<QueuedRequest> {
        self.mirror
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
