//! Durable key-value capability.
//!
//! The outbox only needs to read and overwrite one string value under a fixed
//! key. [`SqliteKvStore`] is the production backend; [`MemoryKvStore`] is a
//! shareable in-process substitute for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::VetboxError;

/// A string-keyed durable store.
pub trait KvStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, VetboxError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), VetboxError>;
}

/// Key-value store backed by the `kv_store` table.
///
/// The connection is behind a mutex so one store can serve several threads.
pub struct SqliteKvStore {
    db: Mutex<Database>,
}

impl SqliteKvStore {
    /// Wrap an opened database.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KvStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, VetboxError> {
        self.db()
            .connection()
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| VetboxError::Database(format!("Failed to read {key}: {e}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), VetboxError> {
        self.db()
            .connection()
            .execute(
                r"INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                  ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                 updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| VetboxError::Database(format!("Failed to write {key}: {e}")))?;
        Ok(())
    }
}

/// In-memory key-value store.
///
/// Clones share the same map, so a test can keep a handle and "reload" from it
/// after the original owner is dropped.
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    failing: bool,
    read_only: bool,
}

impl MemoryKvStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose every operation fails, simulating a disabled or
    /// full storage backend.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// A handle to the same map that can read but rejects every write,
    /// simulating a full disk or read-only database.
    #[must_use]
    pub fn read_only(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            failing: self.failing,
            read_only: true,
        }
    }

    fn check(&self) -> Result<(), VetboxError> {
        if self.failing {
            Err(VetboxError::Database("storage unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, VetboxError> {
        self.check()?;
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), VetboxError> {
        self.check()?;
        if self.read_only {
            return Err(VetboxError::Database(format!("Failed to write {key}: quota exceeded")));
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_store() -> SqliteKvStore {
        SqliteKvStore::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_sqlite_get_missing() {
        let store = sqlite_store();
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_sqlite_set_overwrites() {
        let store = sqlite_store();
        store.set("queue", "[1]").unwrap();
        store.set("queue", "[1,2]").unwrap();
        assert_eq!(store.get("queue").unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn test_sqlite_survives_reopen() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("kv.db");

        SqliteKvStore::new(Database::open_at(&path).unwrap())
            .set("queue", "[]")
            .unwrap();

        let reopened = SqliteKvStore::new(Database::open_at(&path).unwrap());
        assert_eq!(reopened.get("queue").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_memory_clones_share_entries() {
        let store = MemoryKvStore::new();
        let handle = store.clone();
        store.set("k", "v").unwrap();
        assert_eq!(handle.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_failing_store_errors() {
        let store = MemoryKvStore::failing();
        assert!(store.get("k").is_err());
        assert!(store.set("k", "v").is_err());
    }

    #[test]
    fn test_read_only_handle_reads_but_rejects_writes() {
        let store = MemoryKvStore::new();
        store.set("k", "v").unwrap();

        let read_only = store.read_only();
        assert_eq!(read_only.get("k").unwrap().as_deref(), Some("v"));
        assert!(read_only.set("k", "w").is_err());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
