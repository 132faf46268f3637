//! vetbox - offline submission outbox for the clinic web app
//!
//! Submissions that cannot reach the clinic server are kept in a durable
//! FIFO queue and replayed, in order, once connectivity returns.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod output;
pub mod storage;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::VetboxError;
pub use features::outbox::{DispatchOutcome, Outbox, QueuedRequest};
