//! Message Dispatch
//!
//! Entry point into the relay's routing path for internally generated traffic.

use std::sync::Arc;

use crate::realm::{Client, Message};

/// Injects a message into normal dispatch
///
/// `origin` is the client the message arrived from, or `None` for
/// messages synthesized by the server itself.
pub trait Notifier: Send + Sync {
    fn dispatch(&self, origin: Option<&Arc<Client>>, message: Message);
}

impl<F> Notifier for F
where
    F: Fn(Option<&Arc<Client>>, Message) + Send + Sync,
{
    fn dispatch(&self, origin: Option<&Arc<Client>>, message: Message) {
        self(origin, message)
    }
}
