//! Storage layer for vetbox.
//!
//! SQLite-backed key-value persistence for the offline outbox.

mod database;
mod kv;
mod migrations;

pub use database::Database;
pub use kv::{KvStore, MemoryKvStore, SqliteKvStore};
