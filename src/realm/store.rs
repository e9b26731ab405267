//! Concurrent Client Registry
//!
//! Sharded maps of clients and their inbound queues using DashMap.

use dashmap::DashMap;
use std::sync::Arc;

use super::{Client, ClientId, Message, MessageQueue};

/// Directory of clients and per-destination message queues
///
/// Implementations synchronize internally: sweepers and the live traffic
/// path call into the same registry concurrently.
pub trait Registry: Send + Sync {
    /// Snapshot of every registered client id
    fn client_ids(&self) -> Vec<ClientId>;

    fn client(&self, id: &ClientId) -> Option<Arc<Client>>;

    /// Snapshot of every destination id that currently has a queue
    fn client_ids_with_queue(&self) -> Vec<ClientId>;

    fn queue(&self, id: &ClientId) -> Option<Arc<MessageQueue>>;

    /// Register or replace a client
    fn set_client(&self, client: Arc<Client>);

    /// Remove a client, returns true if it was registered
    fn remove_client(&self, id: &ClientId) -> bool;

    /// Remove the client only if `client` is still the record registered
    /// under `id`, returns true if it was removed
    fn remove_client_if(&self, id: &ClientId, client: &Arc<Client>) -> bool;

    /// Append a message to the destination's queue, creating it if needed
    fn add_message(&self, dst: &ClientId, message: Message, now_millis: u64);

    /// Drop every queued message for the destination
    fn clear_queue(&self, id: &ClientId);

    /// Detach the destination's queue if `predicate` holds for it
    ///
    /// Atomic with respect to `add_message`: once a queue is taken no
    /// further message lands in it, later messages start a new queue.
    fn take_queue_if(
        &self,
        id: &ClientId,
        predicate: &dyn Fn(&Arc<MessageQueue>) -> bool,
    ) -> Option<Arc<MessageQueue>>;
}

/// In-memory registry
#[derive(Debug, Clone, Default)]
pub struct Realm {
    clients: Arc<DashMap<ClientId, Arc<Client>>>,
    queues: Arc<DashMap<ClientId, Arc<MessageQueue>>>,
}

impl Realm {
    /// Create an empty realm
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with specified shard count for better concurrency
    pub fn with_shard_amount(shard_amount: usize) -> Self {
        Self {
            clients: Arc::new(DashMap::with_shard_amount(shard_amount)),
            queues: Arc::new(DashMap::with_shard_amount(shard_amount)),
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn queue_count(&self) -> usize {
        self.queues.len()
    }
}

impl Registry for Realm {
    fn client_ids(&self) -> Vec<ClientId> {
        self.clients.iter().map(|r| r.key().clone()).collect()
    }

    fn client(&self, id: &ClientId) -> Option<Arc<Client>> {
        self.clients.get(id).map(|r| r.value().clone())
    }

    fn client_ids_with_queue(&self) -> Vec<ClientId> {
        self.queues.iter().map(|r| r.key().clone()).collect()
    }

    fn queue(&self, id: &ClientId) -> Option<Arc<MessageQueue>> {
        self.queues.get(id).map(|r| r.value().clone())
    }

    fn set_client(&self, client: Arc<Client>) {
        self.clients.insert(client.id().clone(), client);
    }

    fn remove_client(&self, id: &ClientId) -> bool {
        self.clients.remove(id).is_some()
    }

    fn remove_client_if(&self, id: &ClientId, client: &Arc<Client>) -> bool {
        self.clients
            .remove_if(id, |_, current| Arc::ptr_eq(current, client))
            .is_some()
    }

    fn add_message(&self, dst: &ClientId, message: Message, now_millis: u64) {
        // Push under the shard lock so a concurrent take cannot orphan it
        let entry = self
            .queues
            .entry(dst.clone())
            .or_insert_with(|| Arc::new(MessageQueue::new(now_millis)));
        entry.value().push(message);
    }

    fn clear_queue(&self, id: &ClientId) {
        self.queues.remove(id);
    }

    fn take_queue_if(
        &self,
        id: &ClientId,
        predicate: &dyn Fn(&Arc<MessageQueue>) -> bool,
    ) -> Option<Arc<MessageQueue>> {
        self.queues
            .remove_if(id, |_, queue| predicate(queue))
            .map(|(_, queue)| queue)
    }
}
