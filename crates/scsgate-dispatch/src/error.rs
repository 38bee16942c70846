//! Error types for task execution.
//!
//! This module defines the errors a task can produce while running against
//! the gateway channel. Execution errors are always recovered at the
//! dispatcher loop boundary: they are logged and the loop continues, so a
//! single failed command never takes the worker down.

use std::time::Duration;

use scsgate_transport::ChannelError;

/// Result type alias for task execution.
pub type Result<T> = std::result::Result<T, ExecutionError>;

/// Errors that can occur while executing a task against the gateway.
///
/// Every variant carries the literal command that was on the wire when the
/// failure happened, so a log line is enough to reconstruct the exchange.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// The gateway answered something other than the `k` acknowledgment.
    #[error("Command {command} rejected: expected ack 'k', got {reply:#04X}")]
    UnexpectedReply { command: String, reply: u8 },

    /// The gateway did not acknowledge within the configured window.
    #[error("No acknowledgment for {command} within {duration_ms}ms")]
    AckTimeout { command: String, duration_ms: u64 },

    /// The length prefix of a monitor reply was not a hex digit.
    ///
    /// After this the byte stream is out of step with the gateway and the
    /// caller should back off before polling again.
    #[error("Monitor reply length {byte:#04X} is not a hex digit")]
    InvalidLength { byte: u8 },

    /// The channel failed underneath the task.
    #[error("Command {command} failed: {source}")]
    Channel {
        command: String,
        #[source]
        source: ChannelError,
    },
}

impl ExecutionError {
    /// Create a new unexpected-reply error.
    pub fn unexpected_reply(command: impl Into<String>, reply: u8) -> Self {
        Self::UnexpectedReply {
            command: command.into(),
            reply,
        }
    }

    /// Create a new acknowledgment-timeout error.
    pub fn ack_timeout(command: impl Into<String>, duration: Duration) -> Self {
        Self::AckTimeout {
            command: command.into(),
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Create a new invalid-length error.
    pub fn invalid_length(byte: u8) -> Self {
        Self::InvalidLength { byte }
    }

    /// Create a new channel error.
    pub fn channel(command: impl Into<String>, source: ChannelError) -> Self {
        Self::Channel {
            command: command.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_reply_error() {
        let error = ExecutionError::unexpected_reply("@w012", b'x');
        assert!(matches!(error, ExecutionError::UnexpectedReply { .. }));
        assert_eq!(
            error.to_string(),
            "Command @w012 rejected: expected ack 'k', got 0x78"
        );
    }

    #[test]
    fn test_ack_timeout_error() {
        let error = ExecutionError::ack_timeout("@w812", Duration::from_millis(250));
        assert_eq!(
            error.to_string(),
            "No acknowledgment for @w812 within 250ms"
        );
    }

    #[test]
    fn test_invalid_length_error() {
        let error = ExecutionError::invalid_length(b'z');
        assert_eq!(
            error.to_string(),
            "Monitor reply length 0x7A is not a hex digit"
        );
    }

    #[test]
    fn test_channel_error_keeps_source() {
        let error = ExecutionError::channel("@r", ChannelError::Closed);
        assert_eq!(error.to_string(), "Command @r failed: Channel is closed");
        assert!(std::error::Error::source(&error).is_some());
    }
}
