//! Mock channel implementation for testing and development.
//!
//! This module provides a scripted stand-in for the serial gateway so task
//! execution and dispatching can be tested without a physical SCSGate. The
//! handle plays the part of the gateway: it scripts the bytes reads will
//! return and observes every write in order.

use tokio::sync::mpsc;

use scsgate_core::constants::CANCEL_PENDING;

use crate::channel::BusChannel;
use crate::error::{ChannelError, Result};

/// Mock gateway channel for testing and development.
///
/// Reads are served from bytes the [`MockChannelHandle`] has scripted and
/// block until a byte is available, mirroring the blocking reads of the
/// serial link. Writes are forwarded to the handle verbatim.
///
/// # Examples
///
/// ```
/// use scsgate_transport::{BusChannel, MockChannel};
///
/// #[tokio::main]
/// async fn main() -> scsgate_transport::error::Result<()> {
///     let (mut channel, mut handle) = MockChannel::new();
///
///     // Script the gateway acknowledgment, then exchange a command.
///     handle.push_reply(b'k').await?;
///     channel.write(b"@b").await?;
///     assert_eq!(channel.read_byte().await?, b'k');
///
///     // Every write is observable in order.
///     assert_eq!(handle.next_write().await, Some(b"@b".to_vec()));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockChannel {
    /// Scripted reply bytes, served one per read.
    reply_rx: mpsc::Receiver<u8>,

    /// Observed writes, forwarded to the handle.
    write_tx: mpsc::Sender<Vec<u8>>,

    /// Set once `close` has run; all further use is rejected.
    closed: bool,
}

impl MockChannel {
    /// Create a new mock channel.
    ///
    /// Returns a tuple of (MockChannel, MockChannelHandle) where the handle
    /// scripts replies and observes writes.
    pub fn new() -> (Self, MockChannelHandle) {
        let (reply_tx, reply_rx) = mpsc::channel(256);
        let (write_tx, write_rx) = mpsc::channel(256);

        let channel = Self {
            reply_rx,
            write_tx,
            closed: false,
        };

        let handle = MockChannelHandle { reply_tx, write_rx };

        (channel, handle)
    }
}

impl BusChannel for MockChannel {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(ChannelError::Closed);
        }

        self.write_tx
            .send(data.to_vec())
            .await
            .map_err(|_| ChannelError::Closed)
    }

    async fn read_byte(&mut self) -> Result<u8> {
        if self.closed {
            return Err(ChannelError::Closed);
        }

        self.reply_rx.recv().await.ok_or(ChannelError::Closed)
    }

    async fn read_exact(&mut self, len: usize) -> Result<Vec<u8>> {
        if self.closed {
            return Err(ChannelError::Closed);
        }

        let mut data = Vec::with_capacity(len);
        for _ in 0..len {
            data.push(self.reply_rx.recv().await.ok_or(ChannelError::Closed)?);
        }
        Ok(data)
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // Surface the session teardown to the handle the way the real
        // gateway sees it: as a cancel command on the wire.
        let _ = self.write_tx.send(CANCEL_PENDING.to_vec()).await;
        Ok(())
    }
}

/// Handle for scripting a [`MockChannel`].
///
/// The handle is the gateway side of the conversation: `push_reply` queues
/// the bytes future reads will return, `next_write` yields the commands the
/// channel user wrote, in order.
#[derive(Debug)]
pub struct MockChannelHandle {
    /// Sender feeding the channel's scripted reads.
    reply_tx: mpsc::Sender<u8>,

    /// Receiver of the channel's observed writes.
    write_rx: mpsc::Receiver<Vec<u8>>,
}

impl MockChannelHandle {
    /// Script a single reply byte.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel has been dropped.
    pub async fn push_reply(&self, byte: u8) -> Result<()> {
        self.reply_tx
            .send(byte)
            .await
            .map_err(|_| ChannelError::Closed)
    }

    /// Script a sequence of reply bytes, served in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel has been dropped.
    pub async fn push_replies(&self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.push_reply(byte).await?;
        }
        Ok(())
    }

    /// Next write the channel performed, in order.
    ///
    /// Blocks until a write happens; returns `None` once the channel has
    /// been dropped and all observed writes have been drained.
    pub async fn next_write(&mut self) -> Option<Vec<u8>> {
        self.write_rx.recv().await
    }

    /// Non-blocking variant of [`next_write`](Self::next_write).
    ///
    /// Returns `None` when no write is pending right now.
    pub fn try_next_write(&mut self) -> Option<Vec<u8>> {
        self.write_rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_channel_scripted_replies() {
        let (mut channel, handle) = MockChannel::new();

        handle.push_replies(b"5AB").await.unwrap();

        assert_eq!(channel.read_byte().await.unwrap(), b'5');
        assert_eq!(channel.read_exact(2).await.unwrap(), b"AB".to_vec());
    }

    #[tokio::test]
    async fn test_mock_channel_observes_writes_in_order() {
        let (mut channel, mut handle) = MockChannel::new();

        channel.write(b"@r").await.unwrap();
        channel.write(b"A81200150007A3").await.unwrap();

        assert_eq!(handle.next_write().await, Some(b"@r".to_vec()));
        assert_eq!(handle.next_write().await, Some(b"A81200150007A3".to_vec()));
        assert_eq!(handle.try_next_write(), None);
    }

    #[tokio::test]
    async fn test_mock_channel_close_records_cancel() {
        let (mut channel, mut handle) = MockChannel::new();

        channel.close().await.unwrap();
        assert_eq!(handle.next_write().await, Some(b"@c".to_vec()));

        // Closing again is a no-op and records nothing new.
        channel.close().await.unwrap();
        assert_eq!(handle.try_next_write(), None);
    }

    #[tokio::test]
    async fn test_mock_channel_rejects_use_after_close() {
        let (mut channel, handle) = MockChannel::new();
        handle.push_reply(b'k').await.unwrap();

        channel.close().await.unwrap();

        assert!(matches!(
            channel.write(b"@r").await,
            Err(ChannelError::Closed)
        ));
        assert!(matches!(
            channel.read_byte().await,
            Err(ChannelError::Closed)
        ));
        assert!(matches!(
            channel.read_exact(2).await,
            Err(ChannelError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_mock_channel_handle_dropped() {
        let (mut channel, handle) = MockChannel::new();
        drop(handle);

        assert!(matches!(
            channel.read_byte().await,
            Err(ChannelError::Closed)
        ));
        assert!(matches!(
            channel.write(b"@r").await,
            Err(ChannelError::Closed)
        ));
    }
}
