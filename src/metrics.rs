//! Sweep Metrics
//!
//! Counters for maintenance activity.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector shared by the sweepers
#[derive(Debug, Default)]
pub struct SweepMetrics {
    /// Completed liveness sweeps
    liveness_sweeps: AtomicU64,

    /// Clients removed for a stale connection
    clients_evicted: AtomicU64,

    /// Socket closes that failed and were discarded
    close_failures: AtomicU64,

    /// Completed expiration sweeps
    expiration_sweeps: AtomicU64,

    /// Queues purged for being unread too long
    queues_expired: AtomicU64,

    /// EXPIRE notifications dispatched
    notifications_sent: AtomicU64,
}

impl SweepMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one liveness pass
    pub fn record_liveness_sweep(&self, evicted: u64, close_failures: u64) {
        self.liveness_sweeps.fetch_add(1, Ordering::Relaxed);
        self.clients_evicted.fetch_add(evicted, Ordering::Relaxed);
        self.close_failures.fetch_add(close_failures, Ordering::Relaxed);
    }

    /// Record one expiration pass
    pub fn record_expiration_sweep(&self, expired_queues: u64, notifications: u64) {
        self.expiration_sweeps.fetch_add(1, Ordering::Relaxed);
        self.queues_expired.fetch_add(expired_queues, Ordering::Relaxed);
        self.notifications_sent
            .fetch_add(notifications, Ordering::Relaxed);
    }

    pub fn liveness_sweeps(&self) -> u64 {
        self.liveness_sweeps.load(Ordering::Relaxed)
    }

    pub fn clients_evicted(&self) -> u64 {
        self.clients_evicted.load(Ordering::Relaxed)
    }

    pub fn close_failures(&self) -> u64 {
        self.close_failures.load(Ordering::Relaxed)
    }

    pub fn expiration_sweeps(&self) -> u64 {
        self.expiration_sweeps.load(Ordering::Relaxed)
    }

    pub fn queues_expired(&self) -> u64 {
        self.queues_expired.load(Ordering::Relaxed)
    }

    pub fn notifications_sent(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }

    /// Get a summary of metrics
    pub fn summary(&self) -> String {
        format!(
            "Liveness sweeps: {} (evicted={}, close_failures={}) | Expiration sweeps: {} (queues={}, notifications={})",
            self.liveness_sweeps(),
            self.clients_evicted(),
            self.close_failures(),
            self.expiration_sweeps(),
            self.queues_expired(),
            self.notifications_sent()
        )
    }
}
