//! Offline submission outbox.
//!
//! Mutations that cannot reach the clinic server are persisted in a durable
//! FIFO queue and replayed when connectivity returns.
//!
//! - [`request`]: the persisted request descriptor
//! - [`store`]: durable queue under one storage key
//! - [`dispatch`]: one-shot HTTP delivery with timeouts
//! - [`coordinator`]: send-now-or-queue and drain
//! - [`connectivity`]: online status and transitions
//! - [`retry`] / [`watcher`]: backoff and the long-running drain loop

pub mod connectivity;
pub mod coordinator;
pub mod dispatch;
pub mod request;
pub mod retry;
pub mod store;
pub mod watcher;

pub use connectivity::{
    Connectivity, ConnectivityMonitor, ProbeConnectivity, StaticConnectivity, Transition,
};
pub use coordinator::{DispatchOutcome, DrainReport, DrainState, Outbox};
pub use dispatch::{resolve_timeout, HttpResponse, ReqwestTransport, Transport, TransportError};
pub use request::{is_auth_endpoint, QueuedRequest, RequestBody};
pub use retry::RetryPolicy;
pub use store::QueueStore;
pub use watcher::OutboxWatcher;
