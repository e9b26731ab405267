//! Maintenance Sweepers
//!
//! Background passes that evict dead connections and expire unread queues.

mod expiration;
mod liveness;
mod periodic;

pub use expiration::{ExpirationReport, ExpirationSweeper};
pub use liveness::{EvictionObserver, EvictionReport, LivenessSweeper};
pub use periodic::PeriodicTask;
