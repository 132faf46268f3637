//! Feature implementations for vetbox.
//!
//! - Offline outbox: durable queue, dispatcher, coordinator and watcher
//! - Form interception on top of the outbox

pub mod forms;
pub mod outbox;
