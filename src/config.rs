//! Maintenance Configuration

use std::time::Duration;

use crate::error::ConfigError;

/// Default delay between two liveness sweeps
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(300);

/// Sweep timing configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Idle time after which a client connection is considered broken
    pub alive_timeout: Duration,

    /// Unread time after which a message queue is considered expired
    pub expire_timeout: Duration,

    /// Delay between two message expiration sweeps
    pub cleanup_out_msgs: Duration,

    /// Delay between two liveness sweeps
    pub check_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alive_timeout: Duration::from_millis(60_000),
            expire_timeout: Duration::from_millis(5_000),
            cleanup_out_msgs: Duration::from_millis(1_000),
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}

impl Config {
    /// Set the liveness staleness cutoff
    pub fn with_alive_timeout(mut self, timeout: Duration) -> Self {
        self.alive_timeout = timeout;
        self
    }

    /// Set the queue staleness cutoff
    pub fn with_expire_timeout(mut self, timeout: Duration) -> Self {
        self.expire_timeout = timeout;
        self
    }

    /// Set the expiration sweep interval
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_out_msgs = interval;
        self
    }

    /// Set the liveness sweep interval
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Reject configurations the sweepers cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("alive_timeout", self.alive_timeout),
            ("expire_timeout", self.expire_timeout),
            ("cleanup_out_msgs", self.cleanup_out_msgs),
            ("check_interval", self.check_interval),
        ];

        for (name, value) in fields {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { name });
            }
        }

        Ok(())
    }
}
