//! SIGRELAY - Signaling Relay Maintenance
//!
//! Background upkeep for a real-time signaling server: evicts clients whose
//! connection went silent and expires message queues nobody reads.

pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod realm;
pub mod sweep;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use dispatch::Notifier;
pub use error::{ConfigError, TransportError};
pub use metrics::SweepMetrics;
pub use realm::{Client, ClientId, Message, MessageKind, MessageQueue, Realm, Registry};
pub use sweep::{ExpirationSweeper, LivenessSweeper, PeriodicTask};
pub use transport::Connection;
