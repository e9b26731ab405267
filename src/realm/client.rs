//! Connected Clients

use parking_lot::RwLock;
use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::transport::Connection;

/// Opaque, stable client identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ClientId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A client known to the realm
///
/// Shared behind `Arc`; the liveness timestamp and transport handle are
/// updated in place by the transport layer while the record stays registered.
pub struct Client {
    id: ClientId,
    last_ping: AtomicU64,
    connection: RwLock<Option<Arc<dyn Connection>>>,
}

impl Client {
    /// Create a client seen alive at `now_millis`
    pub fn new(id: ClientId, now_millis: u64) -> Self {
        Self {
            id,
            last_ping: AtomicU64::new(now_millis),
            connection: RwLock::new(None),
        }
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    /// Timestamp of the last inbound signal, in epoch milliseconds
    pub fn last_ping(&self) -> u64 {
        self.last_ping.load(Ordering::Acquire)
    }

    /// Record an inbound signal
    pub fn touch(&self, now_millis: u64) {
        self.last_ping.fetch_max(now_millis, Ordering::AcqRel);
    }

    pub fn connection(&self) -> Option<Arc<dyn Connection>> {
        self.connection.read().clone()
    }

    pub fn set_connection(&self, connection: Option<Arc<dyn Connection>>) {
        *self.connection.write() = connection;
    }

    pub fn is_connected(&self) -> bool {
        self.connection.read().is_some()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("last_ping", &self.last_ping())
            .field("connected", &self.is_connected())
            .finish()
    }
}
