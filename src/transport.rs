//! Transport Handles
//!
//! The socket side of a connected client, as seen by the registry.

use crate::error::TransportError;
use crate::realm::Message;

/// A live connection owned by the transport layer
pub trait Connection: Send + Sync {
    /// Close the underlying socket
    fn close(&self) -> Result<(), TransportError>;

    /// Push a message to the remote end
    fn send(&self, message: &Message) -> Result<(), TransportError>;
}
