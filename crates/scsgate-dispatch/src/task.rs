//! Command tasks executed against the gateway.
//!
//! A task is an ephemeral value describing one command a caller wants on
//! the SCS bus. Executing it writes the host command to the channel and
//! requires the gateway's synchronous `k` acknowledgment; there is no
//! other result. Tasks are stateless, so they can be built and inspected
//! freely before being enqueued.

use std::fmt;
use std::time::Duration;

use tokio::time;
use tracing::debug;

use scsgate_core::DeviceId;
use scsgate_core::constants::{
    ACTION_HALT, ACTION_LOWER, ACTION_OFF, ACTION_ON, ACTION_RAISE, COMMAND_ACK, NULL_GROUP,
    REQUEST_STATUS_CODE, SET_STATUS_PREFIX, TRANSMIT_PREFIX,
};
use scsgate_protocol::Telegram;
use scsgate_transport::BusChannel;

use crate::error::{ExecutionError, Result};

/// One command against a device on the SCS bus.
///
/// Every variant maps to a single host command; see [`command`](Task::command)
/// for the exact wire form.
///
/// ```
/// use scsgate_core::DeviceId;
/// use scsgate_dispatch::Task;
///
/// let task = Task::GetStatus {
///     target: DeviceId::new(0x12),
/// };
/// assert_eq!(task.command(), "@W7A81200150007A3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Ask a device to report its current status on the bus.
    ///
    /// The device answers with a state notification picked up by the
    /// monitor poll, not by this task.
    GetStatus { target: DeviceId },

    /// Switch a light or switch on (`toggled == true`) or off.
    ToggleStatus { target: DeviceId, toggled: bool },

    /// Start raising a roller shutter.
    RaiseShutter { target: DeviceId },

    /// Start lowering a roller shutter.
    LowerShutter { target: DeviceId },

    /// Halt a moving roller shutter.
    HaltShutter { target: DeviceId },
}

impl Task {
    /// Literal host command this task puts on the wire.
    ///
    /// Status queries are framed telegrams transmitted raw with `@W`;
    /// everything else is a single-device `@w` action.
    pub fn command(&self) -> String {
        match self {
            Self::GetStatus { target } => {
                let telegram = Telegram::new([
                    target.as_u8(),
                    NULL_GROUP,
                    REQUEST_STATUS_CODE,
                    NULL_GROUP,
                ]);
                format!("{}{}{}", TRANSMIT_PREFIX, telegram.group_count(), telegram)
            }
            Self::ToggleStatus { target, toggled } => {
                let action = if *toggled { ACTION_ON } else { ACTION_OFF };
                format!("{}{}{}", SET_STATUS_PREFIX, action, target)
            }
            Self::RaiseShutter { target } => {
                format!("{}{}{}", SET_STATUS_PREFIX, ACTION_RAISE, target)
            }
            Self::LowerShutter { target } => {
                format!("{}{}{}", SET_STATUS_PREFIX, ACTION_LOWER, target)
            }
            Self::HaltShutter { target } => {
                format!("{}{}{}", SET_STATUS_PREFIX, ACTION_HALT, target)
            }
        }
    }

    /// Execute the command against the channel.
    ///
    /// Writes the host command and reads the single acknowledgment byte.
    /// With `ack_timeout` set, the acknowledgment read is bounded; without
    /// it the read blocks for as long as the gateway stays silent.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The gateway replies with anything other than `k`
    /// - The acknowledgment does not arrive within `ack_timeout`
    /// - The channel fails underneath the exchange
    pub async fn execute<C: BusChannel>(
        &self,
        channel: &mut C,
        ack_timeout: Option<Duration>,
    ) -> Result<()> {
        let command = self.command();
        debug!("Executing {}", self);

        channel
            .write(command.as_bytes())
            .await
            .map_err(|e| ExecutionError::channel(command.as_str(), e))?;

        let reply = match ack_timeout {
            Some(window) => time::timeout(window, channel.read_byte())
                .await
                .map_err(|_| ExecutionError::ack_timeout(command.as_str(), window))?
                .map_err(|e| ExecutionError::channel(command.as_str(), e))?,
            None => channel
                .read_byte()
                .await
                .map_err(|e| ExecutionError::channel(command.as_str(), e))?,
        };

        if reply != COMMAND_ACK {
            return Err(ExecutionError::unexpected_reply(command, reply));
        }
        Ok(())
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetStatus { target } => write!(f, "GetStatus[target={}]", target),
            Self::ToggleStatus { target, toggled } => {
                write!(f, "ToggleStatus[target={}, toggled={}]", target, toggled)
            }
            Self::RaiseShutter { target } => write!(f, "RaiseShutter[target={}]", target),
            Self::LowerShutter { target } => write!(f, "LowerShutter[target={}]", target),
            Self::HaltShutter { target } => write!(f, "HaltShutter[target={}]", target),
        }
    }
}
