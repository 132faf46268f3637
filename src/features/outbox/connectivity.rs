//! Connectivity status and transitions.
//!
//! [`Connectivity`] answers "are we online right now"; [`ConnectivityMonitor`]
//! turns repeated answers into online/offline transition events.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tracing::{debug, info};

use crate::error::VetboxError;

/// Online/offline status provider.
pub trait Connectivity: Send + Sync {
    /// Whether the clinic server is currently believed reachable.
    fn is_online(&self) -> bool;
}

/// A settable status flag.
///
/// Clones share the flag, so tests can flip connectivity while the
/// coordinator owns its own handle.
#[derive(Debug, Clone)]
pub struct StaticConnectivity {
    online: Arc<AtomicBool>,
}

impl StaticConnectivity {
    /// A provider reporting `online`.
    #[must_use]
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    /// Change the reported status.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for StaticConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Probes the server with a plain TCP connect.
#[derive(Debug, Clone)]
pub struct ProbeConnectivity {
    host: String,
    port: u16,
    timeout: Duration,
}

impl ProbeConnectivity {
    /// Probe the host and port of `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or has no host.
    pub fn from_base_url(base_url: &str, timeout: Duration) -> Result<Self, VetboxError> {
        let url = Url::parse(base_url)
            .map_err(|e| VetboxError::Http(format!("Invalid base URL {base_url}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| VetboxError::Http(format!("Base URL {base_url} has no host")))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| VetboxError::Http(format!("Base URL {base_url} has no port")))?;

        Ok(Self {
            host,
            port,
            timeout,
        })
    }

    fn addresses(&self) -> Vec<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map(|addrs| addrs.collect())
            .unwrap_or_default()
    }
}

impl Connectivity for ProbeConnectivity {
    fn is_online(&self) -> bool {
        let online = self
            .addresses()
            .iter()
            .any(|addr| TcpStream::connect_timeout(addr, self.timeout).is_ok());
        debug!(host = %self.host, port = self.port, online, "connectivity probe");
        online
    }
}

/// A change in connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Went from offline (or unknown) to online.
    Online,
    /// Went from online (or unknown) to offline.
    Offline,
}

/// Reports connectivity transitions by polling a provider.
pub struct ConnectivityMonitor<'a> {
    provider: &'a dyn Connectivity,
    last: Option<bool>,
}

impl<'a> ConnectivityMonitor<'a> {
    /// Monitor `provider`. The first poll always reports a transition.
    #[must_use]
    pub fn new(provider: &'a dyn Connectivity) -> Self {
        Self {
            provider,
            last: None,
        }
    }

    /// The last observed status, if any poll happened.
    #[must_use]
    pub const fn last_status(&self) -> Option<bool> {
        self.last
    }

    /// Poll once, returning a transition when the status changed.
    pub fn poll(&mut self) -> Option<Transition> {
        let online = self.provider.is_online();
        if self.last == Some(online) {
            return None;
        }
        self.last = Some(online);

        let transition = if online {
            Transition::Online
        } else {
            Transition::Offline
        };
        info!(?transition, "connectivity changed");
        Some(transition)
    }
}
