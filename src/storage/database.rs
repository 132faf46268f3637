//! `SQLite` database connection.
//!
//! The database lives at `~/.vetbox/vetbox.db` and holds the `kv_store`
//! table that backs the durable outbox queue.

use std::path::Path;

use rusqlite::Connection;

use crate::config::Paths;
use crate::error::VetboxError;

use super::migrations;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the default location.
    ///
    /// Creates the database file and runs migrations if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open(paths: &Paths) -> Result<Self, VetboxError> {
        paths.ensure_dirs()?;
        Self::open_at(&paths.database)
    }

    /// Open the database at a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &Path) -> Result<Self, VetboxError> {
        let conn = Connection::open(path).map_err(|e| {
            VetboxError::Database(format!("Failed to open database {}: {e}", path.display()))
        })?;

        // A concurrent `watch` process may hold the write lock briefly.
        conn.busy_timeout(std::time::Duration::from_secs(2))
            .map_err(|e| VetboxError::Database(format!("Failed to set busy timeout: {e}")))?;

        let db = Self { conn };
        db.migrate()?;

        Ok(db)
    }

    /// Open an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self, VetboxError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            VetboxError::Database(format!("Failed to open in-memory database: {e}"))
        })?;

        let db = Self { conn };
        db.migrate()?;

        Ok(db)
    }

    fn migrate(&self) -> Result<(), VetboxError> {
        migrations::run(&self.conn)
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, VetboxError> {
        migrations::get_version(&self.conn)
    }

    /// Get a reference to the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
