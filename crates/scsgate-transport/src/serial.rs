//! Serial channel to a physical SCSGate device.
//!
//! This module opens the serial link to the gateway and drives the session
//! setup sequence the device requires before it accepts bus traffic. After
//! setup the channel is a thin sequenced byte pipe; framing and datagram
//! interpretation live in `scsgate-protocol`.
//!
//! # Session setup
//!
//! The gateway powers up in a mode unusable for monitoring, so `open`
//! issues four host commands, each of which must be acknowledged with the
//! single byte `k`:
//!
//! 1. `@b` clears the gateway buffers,
//! 2. `@c` cancels whatever operation a previous session left standing,
//! 3. `@MA` switches the gateway to ASCII mode,
//! 4. `@F2` enables the on-device ack filter.
//!
//! A missing or wrong acknowledgment fails `open` with
//! [`ChannelError::Handshake`] naming the step and the reply byte.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, trace, warn};

use scsgate_core::constants::{
    ASCII_MODE, BAUD_RATE, CANCEL_PENDING, CLEAR_BUFFERS, COMMAND_ACK, ENABLE_ACK_FILTER,
};

use crate::channel::BusChannel;
use crate::error::{ChannelError, Result};

/// Configuration for the serial link.
///
/// # Example
///
/// ```
/// use scsgate_transport::SerialConfig;
/// use std::time::Duration;
///
/// let config = SerialConfig {
///     timeout: Duration::from_secs(2),
///     ..SerialConfig::default()
/// };
/// assert_eq!(config.baud_rate, 115_200);
/// ```
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate of the serial link. The gateway firmware is fixed at
    /// 115200, so there is rarely a reason to change this.
    pub baud_rate: u32,

    /// Window granted to the gateway for setup and teardown replies.
    /// Regular reads are unbounded; the bus is allowed to stay silent for
    /// as long as it likes.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: BAUD_RATE,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Channel to an SCSGate device over a serial port.
///
/// Opening the channel performs the full session setup; see the module
/// documentation for the sequence. Dropping the channel releases the port,
/// but only [`close`](BusChannel::close) tells the gateway to cancel a
/// standing monitor request, so prefer an explicit close on shutdown.
///
/// # Example
///
/// ```no_run
/// use scsgate_transport::{BusChannel, SerialChannel};
///
/// # async fn example() -> scsgate_transport::error::Result<()> {
/// let mut channel = SerialChannel::open("/dev/ttyUSB0").await?;
///
/// // ... exchange commands ...
///
/// channel.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct SerialChannel {
    /// Device path, kept for log lines.
    device: String,

    /// The underlying async serial stream.
    port: SerialStream,

    /// Reply window for setup and teardown commands.
    timeout: Duration,

    /// Set once `close` has run; all further use is rejected.
    closed: bool,
}

impl SerialChannel {
    /// Open the gateway on `device` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be opened or any session setup
    /// step is not acknowledged.
    pub async fn open(device: &str) -> Result<Self> {
        Self::open_with_config(device, SerialConfig::default()).await
    }

    /// Open the gateway on `device` with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be opened or any session setup
    /// step is not acknowledged.
    pub async fn open_with_config(device: &str, config: SerialConfig) -> Result<Self> {
        info!("Opening SCSGate gateway on {}", device);

        let port = tokio_serial::new(device, config.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .timeout(config.timeout)
            .open_native_async()?;

        let mut channel = Self {
            device: device.to_string(),
            port,
            timeout: config.timeout,
            closed: false,
        };
        channel.setup().await?;

        info!("Gateway on {} ready", channel.device);
        Ok(channel)
    }

    /// Device path this channel was opened on.
    pub fn device(&self) -> &str {
        &self.device
    }

    async fn setup(&mut self) -> Result<()> {
        self.setup_command("clearing buffers", CLEAR_BUFFERS).await?;
        self.setup_command("cancelling pending operations", CANCEL_PENDING)
            .await?;
        self.setup_command("enabling ASCII mode", ASCII_MODE).await?;
        self.setup_command("setting the ack filter", ENABLE_ACK_FILTER)
            .await?;
        Ok(())
    }

    /// Issue one setup command and require the `k` acknowledgment.
    ///
    /// The gateway answers setup commands immediately, so the reply read is
    /// bounded by the configured timeout; a silent device fails the open
    /// instead of hanging it.
    async fn setup_command(&mut self, step: &str, command: &[u8]) -> Result<()> {
        debug!("Gateway setup: {}", step);

        self.port.write_all(command).await?;
        self.port.flush().await?;

        let mut reply = [0u8; 1];
        time::timeout(self.timeout, self.port.read_exact(&mut reply))
            .await
            .map_err(|_| ChannelError::timeout(self.timeout))??;

        if reply[0] != COMMAND_ACK {
            return Err(ChannelError::handshake(step, reply[0]));
        }
        Ok(())
    }
}

impl BusChannel for SerialChannel {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(ChannelError::Closed);
        }

        trace!("TX {}", String::from_utf8_lossy(data));
        self.port.write_all(data).await?;
        self.port.flush().await?;
        Ok(())
    }

    async fn read_byte(&mut self) -> Result<u8> {
        if self.closed {
            return Err(ChannelError::Closed);
        }

        let mut buf = [0u8; 1];
        self.port.read_exact(&mut buf).await?;
        trace!("RX {:#04X}", buf[0]);
        Ok(buf[0])
    }

    async fn read_exact(&mut self, len: usize) -> Result<Vec<u8>> {
        if self.closed {
            return Err(ChannelError::Closed);
        }

        let mut buf = vec![0u8; len];
        self.port.read_exact(&mut buf).await?;
        trace!("RX {}", String::from_utf8_lossy(&buf));
        Ok(buf)
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        info!("Closing gateway on {}", self.device);
        self.port.write_all(CANCEL_PENDING).await?;
        self.port.flush().await?;

        // The gateway acks the cancel; drain it, but never let a dead
        // device hang the teardown.
        let mut reply = [0u8; 1];
        match time::timeout(self.timeout, self.port.read_exact(&mut reply)).await {
            Ok(Ok(_)) => debug!("Gateway acknowledged cancel"),
            Ok(Err(e)) => warn!("Error draining cancel ack during close: {}", e),
            Err(_) => warn!(
                "Gateway did not acknowledge cancel within {}ms",
                self.timeout.as_millis()
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_config_default() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
