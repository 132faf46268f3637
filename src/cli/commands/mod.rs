//! Command implementations for vetbox.
//!
//! This module contains the implementation of all CLI commands.

mod config;
mod outbox;
mod submit;
mod watch;

pub use config::config;
pub use outbox::{clear, discard, drain, list, status};
pub use submit::submit;
pub use watch::watch;

use std::time::Duration;

use crate::config::{Config, Paths};
use crate::error::VetboxError;
use crate::features::outbox::{
    Connectivity, Outbox, ProbeConnectivity, QueueStore, ReqwestTransport, StaticConnectivity,
};
use crate::storage::{Database, SqliteKvStore};

/// Open the outbox described by `config`, backed by the queue database.
///
/// With `offline` set the server is never contacted.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the server URL is
/// invalid.
pub fn open_outbox(paths: &Paths, config: &Config, offline: bool) -> Result<Outbox, VetboxError> {
    let db = Database::open(paths)?;
    let store = QueueStore::new(
        Box::new(SqliteKvStore::new(db)),
        config.outbox.storage_key.clone(),
    );
    let transport = ReqwestTransport::new(&config.server.base_url)?;

    let connectivity: Box<dyn Connectivity> = if offline {
        Box::new(StaticConnectivity::new(false))
    } else {
        Box::new(ProbeConnectivity::from_base_url(
            &config.server.base_url,
            Duration::from_millis(config.server.probe_timeout_ms),
        )?)
    };

    Ok(Outbox::new(store, Box::new(transport), connectivity)
        .with_default_timeout(config.server.default_timeout()))
}
