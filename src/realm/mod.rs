//! Realm
//!
//! Clients, their inbound message queues, and the registry holding both.

mod client;
mod message;
mod queue;
mod store;

pub use client::{Client, ClientId};
pub use message::{Message, MessageKind};
pub use queue::MessageQueue;
pub use store::{Realm, Registry};

#[cfg(test)]
pub(crate) use store::testing;
