//! Error types for gateway channel operations.
//!
//! This module defines error types for the serial channel to the SCSGate
//! device, covering the initialization handshake, I/O failures, and use of
//! a channel after it has been closed.

use std::time::Duration;

/// Result type alias for channel operations.
pub type Result<T> = std::result::Result<T, ChannelError>;

/// Errors that can occur while talking to an SCSGate gateway.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// A session setup command was not acknowledged by the gateway.
    #[error("Error while {step}: gateway replied {reply:#04X}")]
    Handshake { step: String, reply: u8 },

    /// The gateway did not answer within the configured window.
    #[error("Gateway did not answer within {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The channel has been closed and can no longer be used.
    #[error("Channel is closed")]
    Closed,

    /// Serial port enumeration or open failure.
    #[error("Serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// Low-level I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChannelError {
    /// Create a new handshake error.
    pub fn handshake(step: impl Into<String>, reply: u8) -> Self {
        Self::Handshake {
            step: step.into(),
            reply,
        }
    }

    /// Create a new timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout {
            duration_ms: duration.as_millis() as u64,
        }
    }
}
