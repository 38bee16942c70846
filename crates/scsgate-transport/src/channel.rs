//! Channel trait definition for SCSGate transports.
//!
//! This module defines the byte-level contract between the task executor
//! and the SCSGate device. The trait establishes the seam that lets the
//! dispatcher run unchanged against the real serial link or against the
//! scripted mock used in tests.
//!
//! All methods are declared in return-position `impl Future + Send` form
//! (Rust 1.90 + Edition 2024 RPITIT), eliminating the need for the
//! `async_trait` macro while keeping the futures spawnable; implementations
//! still write plain `async fn`.

use std::future::Future;

use crate::error::Result;

/// Byte-level channel to an SCSGate gateway.
///
/// The gateway protocol is strictly request/reply from the host's point of
/// view: the host writes a command, then reads exactly the bytes the
/// command calls for (a single acknowledgment byte, a length digit, or a
/// length-prefixed datagram). There is no unsolicited traffic once the ack
/// filter is enabled, so the channel exposes sequenced reads instead of a
/// framed stream.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods
/// return `impl Future`, an opaque type that cannot be used in trait
/// objects (Edition 2024 RPITIT). You cannot use `Box<dyn BusChannel>`.
/// Consumers take a generic type parameter instead:
///
/// ```no_run
/// use scsgate_transport::BusChannel;
/// use scsgate_transport::error::Result;
///
/// async fn send_and_ack<C: BusChannel>(channel: &mut C, command: &[u8]) -> Result<u8> {
///     channel.write(command).await?;
///     channel.read_byte().await
/// }
/// ```
pub trait BusChannel: Send {
    /// Write raw bytes to the gateway.
    ///
    /// The write is flushed before this method returns, so the gateway has
    /// seen the full command once the future resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The channel has been closed
    /// - A serial I/O error occurs
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Read a single byte from the gateway.
    ///
    /// Used for command acknowledgments and the length digit of a monitor
    /// reply. Blocks asynchronously until the gateway produces the byte.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The channel has been closed
    /// - A serial I/O error occurs
    fn read_byte(&mut self) -> impl Future<Output = Result<u8>> + Send;

    /// Read exactly `len` bytes from the gateway.
    ///
    /// Used for the ASCII payload of a monitor reply once its length is
    /// known. Blocks asynchronously until all bytes have arrived.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The channel has been closed
    /// - A serial I/O error occurs before `len` bytes arrive
    fn read_exact(&mut self, len: usize) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Terminate the gateway session.
    ///
    /// Cancels whatever standing operation the gateway was left with and
    /// releases the underlying transport. Closing an already-closed channel
    /// is a no-op; every other method fails with
    /// [`ChannelError::Closed`](crate::ChannelError::Closed) afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the cancel command cannot be written.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}
