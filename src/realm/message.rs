//! Signaling Messages

use bytes::Bytes;
use std::fmt;

use super::ClientId;

/// Kind tag carried by every signaling message
///
/// Only kinds that are queued for an offline destination, plus the expiry
/// notice synthesized when such a queue is purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Offer,
    Answer,
    Candidate,
    /// Synthesized when a queued message could not be delivered in time
    Expire,
}

impl MessageKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Offer => "OFFER",
            MessageKind::Answer => "ANSWER",
            MessageKind::Candidate => "CANDIDATE",
            MessageKind::Expire => "EXPIRE",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable relay message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub src: Option<ClientId>,
    pub dst: Option<ClientId>,
    pub payload: Option<Bytes>,
}

impl Message {
    /// Create a message between two clients
    pub fn new(kind: MessageKind, src: ClientId, dst: ClientId, payload: Option<Bytes>) -> Self {
        Self {
            kind,
            src: Some(src),
            dst: Some(dst),
            payload,
        }
    }

    /// Expiry notice sent back from an unreachable destination to the sender
    pub fn expire(src: ClientId, dst: ClientId) -> Self {
        Self::new(MessageKind::Expire, src, dst, None)
    }
}
