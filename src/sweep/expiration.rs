//! Message Expiration Sweeper
//!
//! Purges queues nobody has read for too long and tells each original
//! sender that its messages will not be delivered.

use hashbrown::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::PeriodicTask;
use crate::clock::{elapsed_since, Clock};
use crate::config::Config;
use crate::dispatch::Notifier;
use crate::metrics::SweepMetrics;
use crate::realm::{ClientId, Message, MessageQueue, Registry};

/// Outcome of one expiration pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpirationReport {
    pub expired_queues: Vec<ClientId>,
    pub notifications: usize,
}

#[derive(Clone)]
struct OutstandingPrune {
    registry: Arc<dyn Registry>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    expire_timeout: Duration,
    metrics: Arc<SweepMetrics>,
}

impl OutstandingPrune {
    fn is_expired(&self, now: u64, queue: &MessageQueue) -> bool {
        elapsed_since(now, queue.last_read_at()) >= self.expire_timeout
    }

    fn run(&self) -> ExpirationReport {
        let now = self.clock.now_millis();
        let mut report = ExpirationReport::default();

        for dst in self.registry.client_ids_with_queue() {
            let Some(queue) = self.registry.queue(&dst) else {
                continue;
            };

            if !self.is_expired(now, &queue) {
                continue;
            }

            // Detach first so messages arriving from now on start a new queue;
            // a read or a replacement since the fetch keeps the queue
            let still_expired = |current: &Arc<MessageQueue>| {
                Arc::ptr_eq(current, &queue) && self.is_expired(now, current)
            };
            let Some(queue) = self.registry.take_queue_if(&dst, &still_expired) else {
                continue;
            };

            // Senders are notified once per stale destination
            let mut seen: HashSet<ClientId> = HashSet::new();

            for message in queue.messages() {
                let Some(src) = message.src else {
                    continue;
                };
                if !seen.insert(src.clone()) {
                    continue;
                }

                let from = message.dst.unwrap_or_else(|| dst.clone());
                self.notifier.dispatch(None, Message::expire(from, src));
                report.notifications += 1;
            }

            debug!(
                destination = %dst,
                senders = seen.len(),
                "Expired unread message queue"
            );
            report.expired_queues.push(dst);
        }

        self.metrics.record_expiration_sweep(
            report.expired_queues.len() as u64,
            report.notifications as u64,
        );
        report
    }
}

/// Periodically expires queues unread for longer than `expire_timeout`
pub struct ExpirationSweeper {
    prune: OutstandingPrune,
    task: PeriodicTask,
}

impl ExpirationSweeper {
    /// Create a sweeper using `expire_timeout` and `cleanup_out_msgs` from `config`
    pub fn new(
        registry: Arc<dyn Registry>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> Self {
        Self {
            prune: OutstandingPrune {
                registry,
                clock,
                notifier,
                expire_timeout: config.expire_timeout,
                metrics: Arc::new(SweepMetrics::new()),
            },
            task: PeriodicTask::new("messages-expiration", config.cleanup_out_msgs),
        }
    }

    /// Report into a shared metrics collector
    pub fn with_metrics(mut self, metrics: Arc<SweepMetrics>) -> Self {
        self.prune.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<SweepMetrics> {
        &self.prune.metrics
    }

    pub fn cleanup_interval(&self) -> Duration {
        self.task.interval()
    }

    pub fn expire_timeout(&self) -> Duration {
        self.prune.expire_timeout
    }

    /// Arm the expiration loop, resetting the cadence if already running
    pub fn start_messages_expiration(&self) {
        let prune = self.prune.clone();
        self.task.start(move || {
            prune.run();
        });
    }

    pub fn stop_messages_expiration(&self) {
        self.task.stop();
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    /// Run one pass immediately
    pub fn prune_outstanding(&self) -> ExpirationReport {
        self.prune.run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::dispatch::testing::RecordingNotifier;
    use crate::realm::testing::HookedRegistry;
    use crate::realm::{Client, MessageKind, Realm};
    use bytes::Bytes;
    use std::sync::atomic::{AtomicBool, Ordering};

    const NOW: u64 = 100_000;

    struct Fixture {
        realm: Realm,
        clock: Arc<ManualClock>,
        notifier: Arc<RecordingNotifier>,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                realm: Realm::new(),
                clock: Arc::new(ManualClock::new(NOW)),
                notifier: Arc::new(RecordingNotifier::default()),
                config: Config::default()
                    .with_expire_timeout(Duration::from_millis(5_000))
                    .with_cleanup_interval(Duration::from_millis(1_000)),
            }
        }

        /// Queue `src -> dst` with the queue created (and last read) at `created`
        fn send(&self, src: &str, dst: &str, created: u64) {
            let msg = Message::new(
                MessageKind::Offer,
                src.into(),
                dst.into(),
                Some(Bytes::from_static(b"sdp")),
            );
            self.realm.add_message(&ClientId::from(dst), msg, created);
        }

        fn sweeper(&self) -> ExpirationSweeper {
            ExpirationSweeper::new(
                Arc::new(self.realm.clone()),
                self.clock.clone(),
                self.notifier.clone(),
                &self.config,
            )
        }
    }

    fn expire(src: &str, dst: &str) -> Message {
        Message::expire(ClientId::from(src), ClientId::from(dst))
    }

    #[test]
    fn test_expired_queue_notifies_each_sender_once() {
        let fx = Fixture::new();
        fx.send("x", "d", NOW - 6_000);
        fx.send("x", "d", NOW - 6_000);
        fx.send("y", "d", NOW - 6_000);

        let report = fx.sweeper().prune_outstanding();

        assert_eq!(report.expired_queues, vec![ClientId::from("d")]);
        assert_eq!(report.notifications, 2);
        assert_eq!(fx.notifier.messages(), vec![expire("d", "x"), expire("d", "y")]);
        assert!(fx.realm.queue(&ClientId::from("d")).is_none());

        // Synthesized with no origin
        assert!(fx.notifier.dispatched.lock().iter().all(|(origin, _)| !origin));
    }

    #[test]
    fn test_fresh_queue_untouched() {
        let fx = Fixture::new();
        fx.send("x", "d", NOW - 4_999);

        let report = fx.sweeper().prune_outstanding();

        assert!(report.expired_queues.is_empty());
        assert!(fx.notifier.messages().is_empty());
        assert_eq!(fx.realm.queue(&ClientId::from("d")).map(|q| q.len()), Some(1));
    }

    #[test]
    fn test_sender_notified_per_destination() {
        let fx = Fixture::new();
        fx.send("x", "d1", 0);
        fx.send("x", "d2", 0);

        let report = fx.sweeper().prune_outstanding();

        assert_eq!(report.notifications, 2);
        let mut notified: Vec<_> = fx
            .notifier
            .messages()
            .into_iter()
            .map(|m| (m.src.unwrap(), m.dst.unwrap()))
            .collect();
        notified.sort();
        assert_eq!(
            notified,
            vec![
                (ClientId::from("d1"), ClientId::from("x")),
                (ClientId::from("d2"), ClientId::from("x")),
            ]
        );
    }

    #[test]
    fn test_empty_stale_queue_cleared_silently() {
        let fx = Fixture::new();
        fx.send("x", "d", 0);
        let queue = fx.realm.queue(&ClientId::from("d")).unwrap();
        queue.read_message(1_000).unwrap();
        assert!(queue.is_empty());

        let report = fx.sweeper().prune_outstanding();

        assert_eq!(report.expired_queues, vec![ClientId::from("d")]);
        assert_eq!(report.notifications, 0);
        assert!(fx.realm.queue(&ClientId::from("d")).is_none());
    }

    #[test]
    fn test_recent_read_keeps_queue_alive() {
        let fx = Fixture::new();
        fx.send("x", "d", 0);
        fx.send("y", "d", 0);
        fx.realm
            .queue(&ClientId::from("d"))
            .unwrap()
            .read_message(NOW - 100);

        let report = fx.sweeper().prune_outstanding();
        assert!(report.expired_queues.is_empty());
        assert!(fx.notifier.messages().is_empty());
    }

    /// Notifier that enqueues one more message for the destination while
    /// the first notice is being dispatched
    struct EnqueueOnDispatch {
        realm: Realm,
        late: Message,
        fired: AtomicBool,
        recorded: RecordingNotifier,
    }

    impl Notifier for EnqueueOnDispatch {
        fn dispatch(&self, origin: Option<&Arc<Client>>, message: Message) {
            if !self.fired.swap(true, Ordering::SeqCst) {
                let dst = self.late.dst.clone().unwrap();
                self.realm.add_message(&dst, self.late.clone(), NOW);
            }
            self.recorded.dispatch(origin, message);
        }
    }

    #[test]
    fn test_message_enqueued_during_sweep_survives() {
        let fx = Fixture::new();
        fx.send("x", "d", NOW - 6_000);

        let notifier = Arc::new(EnqueueOnDispatch {
            realm: fx.realm.clone(),
            late: Message::new(MessageKind::Offer, "z".into(), "d".into(), None),
            fired: AtomicBool::new(false),
            recorded: RecordingNotifier::default(),
        });
        let sweeper = ExpirationSweeper::new(
            Arc::new(fx.realm.clone()),
            fx.clock.clone(),
            notifier.clone(),
            &fx.config,
        );

        let report = sweeper.prune_outstanding();
        assert_eq!(report.notifications, 1);
        assert_eq!(notifier.recorded.messages(), vec![expire("d", "x")]);

        // z's message sits in a fresh queue, not yet stale
        let queue = fx.realm.queue(&ClientId::from("d")).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.messages()[0].src, Some(ClientId::from("z")));
        assert!(sweeper.prune_outstanding().expired_queues.is_empty());

        // Once that queue goes stale too, z is told
        fx.clock.advance(Duration::from_millis(5_000));
        sweeper.prune_outstanding();
        assert_eq!(
            notifier.recorded.messages(),
            vec![expire("d", "x"), expire("d", "z")]
        );
        assert!(fx.realm.queue(&ClientId::from("d")).is_none());
    }

    #[test]
    fn test_vanished_queue_skipped() {
        let fx = Fixture::new();
        fx.send("x", "d", NOW - 6_000);

        let registry = HookedRegistry {
            realm: fx.realm.clone(),
            phantom_ids: vec![ClientId::from("ghost")],
            ..HookedRegistry::default()
        };
        let sweeper = ExpirationSweeper::new(
            Arc::new(registry),
            fx.clock.clone(),
            fx.notifier.clone(),
            &fx.config,
        );

        let report = sweeper.prune_outstanding();

        assert_eq!(report.expired_queues, vec![ClientId::from("d")]);
        assert_eq!(fx.notifier.messages(), vec![expire("d", "x")]);
        assert!(fx.realm.queue(&ClientId::from("d")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_expiration() {
        let fx = Fixture::new();
        fx.send("x", "d", NOW - 6_000);

        let sweeper = fx.sweeper();
        sweeper.start_messages_expiration();
        sweeper.start_messages_expiration();

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(sweeper.metrics().expiration_sweeps(), 1);
        assert_eq!(fx.notifier.messages(), vec![expire("d", "x")]);

        // A new message starts a fresh queue that is not yet stale
        fx.send("y", "d", NOW);
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(sweeper.metrics().expiration_sweeps(), 2);
        assert_eq!(fx.notifier.messages().len(), 1);

        sweeper.stop_messages_expiration();
        fx.clock.advance(Duration::from_millis(10_000));
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(sweeper.metrics().expiration_sweeps(), 2);
        assert_eq!(fx.realm.queue(&ClientId::from("d")).map(|q| q.len()), Some(1));
    }
}
