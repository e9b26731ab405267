//! Error Types
//!
//! Failures surfaced by transport handles and configuration loading.

use std::io;

/// Errors raised by a client's transport handle
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The underlying socket was already closed
    #[error("connection already closed")]
    Closed,

    /// I/O failure while closing or writing
    #[error("transport i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised when validating a [`Config`](crate::Config)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A timeout or interval was configured as zero
    #[error("{name} must be greater than zero")]
    ZeroDuration { name: &'static str },
}
