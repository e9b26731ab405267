//! Liveness Sweeper
//!
//! Evicts clients whose connection has stopped signalling.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::PeriodicTask;
use crate::clock::{elapsed_since, Clock};
use crate::config::Config;
use crate::metrics::SweepMetrics;
use crate::realm::{Client, ClientId, Registry};

/// Callback invoked with each evicted client, after it left the registry
pub type EvictionObserver = Arc<dyn Fn(&Arc<Client>) + Send + Sync>;

/// Outcome of one liveness pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub evicted: Vec<ClientId>,
    pub close_failures: usize,
}

#[derive(Clone)]
struct ConnectionCheck {
    registry: Arc<dyn Registry>,
    clock: Arc<dyn Clock>,
    alive_timeout: Duration,
    on_close: Option<EvictionObserver>,
    metrics: Arc<SweepMetrics>,
}

impl ConnectionCheck {
    fn run(&self) -> EvictionReport {
        let now = self.clock.now_millis();
        let mut report = EvictionReport::default();

        for id in self.registry.client_ids() {
            // Removed concurrently since the snapshot
            let Some(client) = self.registry.client(&id) else {
                continue;
            };

            if elapsed_since(now, client.last_ping()) < self.alive_timeout {
                continue;
            }

            if let Some(connection) = client.connection() {
                if let Err(e) = connection.close() {
                    report.close_failures += 1;
                    warn!(client = %id, error = %e, "Failed to close stale connection");
                }
            }

            // Reconnected since the fetch: the fresh record and its queue stay
            if !self.registry.remove_client_if(&id, &client) {
                debug!(client = %id, "Client re-registered during sweep");
                continue;
            }
            self.registry.clear_queue(&id);
            client.set_connection(None);

            debug!(client = %id, last_ping = client.last_ping(), "Evicted stale client");

            if let Some(on_close) = &self.on_close {
                on_close(&client);
            }

            report.evicted.push(id);
        }

        self.metrics
            .record_liveness_sweep(report.evicted.len() as u64, report.close_failures as u64);
        report
    }
}

/// Periodically evicts clients idle for longer than `alive_timeout`
pub struct LivenessSweeper {
    check: ConnectionCheck,
    task: PeriodicTask,
}

impl LivenessSweeper {
    /// Create a sweeper using `alive_timeout` and `check_interval` from `config`
    pub fn new(registry: Arc<dyn Registry>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self {
            check: ConnectionCheck {
                registry,
                clock,
                alive_timeout: config.alive_timeout,
                on_close: None,
                metrics: Arc::new(SweepMetrics::new()),
            },
            task: PeriodicTask::new("liveness", config.check_interval),
        }
    }

    /// Invoke `observer` once per evicted client
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Arc<Client>) + Send + Sync + 'static,
    {
        self.check.on_close = Some(Arc::new(observer));
        self
    }

    /// Report into a shared metrics collector
    pub fn with_metrics(mut self, metrics: Arc<SweepMetrics>) -> Self {
        self.check.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<SweepMetrics> {
        &self.check.metrics
    }

    pub fn check_interval(&self) -> Duration {
        self.task.interval()
    }

    pub fn alive_timeout(&self) -> Duration {
        self.check.alive_timeout
    }

    /// Arm the sweep loop, resetting the cadence if already running
    pub fn start(&self) {
        let check = self.check.clone();
        self.task.start(move || {
            check.run();
        });
    }

    pub fn stop(&self) {
        self.task.stop();
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    /// Run one pass immediately
    pub fn check_connections(&self) -> EvictionReport {
        self.check.run()
    }
}
