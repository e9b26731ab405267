//! Per-destination Message Queue

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use super::Message;

/// Messages waiting for one destination client
#[derive(Debug)]
pub struct MessageQueue {
    last_read_at: AtomicU64,
    messages: Mutex<VecDeque<Message>>,
}

impl MessageQueue {
    /// Create an empty queue, considered read at `now_millis`
    pub fn new(now_millis: u64) -> Self {
        Self {
            last_read_at: AtomicU64::new(now_millis),
            messages: Mutex::new(VecDeque::new()),
        }
    }

    /// Timestamp of the last read by the destination, in epoch milliseconds
    pub fn last_read_at(&self) -> u64 {
        self.last_read_at.load(Ordering::Acquire)
    }

    /// Append a message at the back
    pub fn push(&self, message: Message) {
        self.messages.lock().push_back(message);
    }

    /// Pop the oldest message on behalf of the destination
    pub fn read_message(&self, now_millis: u64) -> Option<Message> {
        let message = self.messages.lock().pop_front();
        if message.is_some() {
            self.last_read_at.fetch_max(now_millis, Ordering::AcqRel);
        }
        message
    }

    /// Snapshot of queued messages in insertion order
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}
