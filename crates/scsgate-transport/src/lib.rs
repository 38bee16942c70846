//! Transport layer for the SCSGate serial gateway.
//!
//! This crate owns the byte pipe between the host and the gateway: the
//! [`BusChannel`] trait is the contract task execution is written against,
//! [`SerialChannel`] implements it over a real serial port (including the
//! session setup sequence the device requires), and [`MockChannel`] is a
//! scripted implementation for tests.
//!
//! # The channel contract
//!
//! The gateway protocol is request/reply: the host writes a command and
//! then reads exactly the bytes that command calls for. [`BusChannel`]
//! therefore exposes sequenced reads (`read_byte`, `read_exact`) instead
//! of a framed stream, plus `write` and `close`. All methods are native
//! `async fn` (Edition 2024 RPITIT), so consumers take a generic
//! `C: BusChannel` parameter rather than a trait object.
//!
//! # Example
//!
//! ```no_run
//! use scsgate_transport::{BusChannel, SerialChannel};
//!
//! # async fn example() -> scsgate_transport::error::Result<()> {
//! let mut channel = SerialChannel::open("/dev/ttyUSB0").await?;
//!
//! // Ask the gateway for one buffered bus datagram.
//! channel.write(b"@r").await?;
//! let length = channel.read_byte().await?;
//!
//! channel.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Testing
//!
//! [`MockChannel::new`] returns the channel together with a
//! [`MockChannelHandle`] that scripts reply bytes and observes writes,
//! letting dispatcher tests drive a full conversation without hardware.

pub mod channel;
pub mod error;
pub mod mock;
pub mod serial;

// Re-export commonly used types for convenience
pub use channel::BusChannel;
pub use error::{ChannelError, Result};
pub use mock::{MockChannel, MockChannelHandle};
pub use serial::{SerialChannel, SerialConfig};
