//! Standing bus monitor with duplicate suppression.
//!
//! The monitor drains the gateway's datagram buffer one poll at a time and
//! forwards every decoded message to a caller-supplied sink. It also works
//! around the gateway's unreliable on-device ack filter: repeated state
//! notifications with identical raw bytes are dropped in software, so a
//! chatty device cannot flood the sink with copies of the same event.

use tracing::trace;

use scsgate_core::constants::{GROUP_LENGTH, MONITOR_REQUEST};
use scsgate_protocol::Message;
use scsgate_transport::BusChannel;

use crate::error::{ExecutionError, Result};

/// Caller-supplied notification callback.
///
/// Invoked on the dispatcher's execution context for every forwarded
/// message, including `Ack` and `Unknown`; callers must not block it.
pub type MessageSink = Box<dyn FnMut(Message) + Send>;

/// Polls the gateway buffer and forwards decoded messages.
///
/// The duplicate-suppression state lives here, private to one dispatcher,
/// and covers only state notifications: a new `State` whose raw bytes
/// equal the previous raw `State` bytes is dropped; every other message
/// is always forwarded. Messages that are not state notifications leave
/// the suppression state untouched.
pub struct Monitor {
    /// Notification callback for forwarded messages.
    sink: MessageSink,

    /// Raw bytes of the last forwarded state notification.
    last_state: Option<Vec<u8>>,
}

impl Monitor {
    /// Create a monitor forwarding to `sink`.
    pub fn new(sink: impl FnMut(Message) + Send + 'static) -> Self {
        Self {
            sink: Box::new(sink),
            last_state: None,
        }
    }

    /// Drain one datagram from the gateway buffer, if any.
    ///
    /// Writes the monitor request and reads the length-prefixed reply: one
    /// ASCII hex digit with the byte-group count, then two characters per
    /// group. A count of zero means the buffer was empty and is not an
    /// error. The decoded message goes to the sink unless it is a
    /// duplicate state notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel fails or the length prefix is not a
    /// hex digit. Datagrams that fail to decode are not errors; they are
    /// forwarded as `Unknown`.
    pub async fn poll<C: BusChannel>(&mut self, channel: &mut C) -> Result<()> {
        let command = String::from_utf8_lossy(MONITOR_REQUEST);

        channel
            .write(MONITOR_REQUEST)
            .await
            .map_err(|e| ExecutionError::channel(command.as_ref(), e))?;

        let digit = channel
            .read_byte()
            .await
            .map_err(|e| ExecutionError::channel(command.as_ref(), e))?;
        let length = (digit as char)
            .to_digit(16)
            .ok_or_else(|| ExecutionError::invalid_length(digit))? as usize;
        if length == 0 {
            return Ok(());
        }

        let data = channel
            .read_exact(length * GROUP_LENGTH)
            .await
            .map_err(|e| ExecutionError::channel(command.as_ref(), e))?;

        let message = Message::decode(&data);
        if let Message::State { .. } = message {
            if self.last_state.as_deref() == Some(data.as_slice()) {
                trace!("Suppressing duplicate state notification {}", message);
                return Ok(());
            }
            self.last_state = Some(data);
        }

        (self.sink)(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use scsgate_core::{DeviceId, Status};
    use scsgate_transport::MockChannel;

    // State notification from device 0x33, status on.
    const STATE_ON_33: &[u8] = b"A8B833120099A3";

    // State notification from device 0x21, status on.
    const STATE_ON_21: &[u8] = b"A8B82112008BA3";

    fn collecting_monitor() -> (Monitor, Arc<Mutex<Vec<Message>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let monitor = Monitor::new(move |message| {
            sink_seen.lock().unwrap().push(message);
        });
        (monitor, seen)
    }

    async fn script_poll(handle: &scsgate_transport::MockChannelHandle, datagram: &[u8]) {
        let digit = char::from_digit((datagram.len() / 2) as u32, 16)
            .unwrap()
            .to_ascii_uppercase();
        handle.push_reply(digit as u8).await.unwrap();
        handle.push_replies(datagram).await.unwrap();
    }

    #[tokio::test]
    async fn test_poll_empty_buffer() {
        let (mut channel, mut handle) = MockChannel::new();
        let (mut monitor, seen) = collecting_monitor();

        handle.push_reply(b'0').await.unwrap();
        monitor.poll(&mut channel).await.unwrap();

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(handle.next_write().await, Some(b"@r".to_vec()));
    }

    #[tokio::test]
    async fn test_poll_forwards_state() {
        let (mut channel, handle) = MockChannel::new();
        let (mut monitor, seen) = collecting_monitor();

        script_poll(&handle, STATE_ON_33).await;
        monitor.poll(&mut channel).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Message::State {
                source: DeviceId::new(0x33),
                status: Status::On,
            }]
        );
    }

    #[tokio::test]
    async fn test_poll_suppresses_duplicate_state() {
        let (mut channel, handle) = MockChannel::new();
        let (mut monitor, seen) = collecting_monitor();

        script_poll(&handle, STATE_ON_33).await;
        script_poll(&handle, STATE_ON_33).await;
        script_poll(&handle, STATE_ON_21).await;

        monitor.poll(&mut channel).await.unwrap();
        monitor.poll(&mut channel).await.unwrap();
        monitor.poll(&mut channel).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].entity(), Some(DeviceId::new(0x33)));
        assert_eq!(seen[1].entity(), Some(DeviceId::new(0x21)));
    }

    #[tokio::test]
    async fn test_poll_non_state_keeps_suppression() {
        let (mut channel, handle) = MockChannel::new();
        let (mut monitor, seen) = collecting_monitor();

        script_poll(&handle, STATE_ON_33).await;
        script_poll(&handle, b"A83300120021A3").await;
        script_poll(&handle, STATE_ON_33).await;

        for _ in 0..3 {
            monitor.poll(&mut channel).await.unwrap();
        }

        // The interleaved command is forwarded but does not reset the
        // suppression state, so the repeated state stays dropped.
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0], Message::State { .. }));
        assert!(matches!(seen[1], Message::Command { .. }));
    }

    #[tokio::test]
    async fn test_poll_forwards_ack() {
        let (mut channel, handle) = MockChannel::new();
        let (mut monitor, seen) = collecting_monitor();

        script_poll(&handle, b"A5").await;
        monitor.poll(&mut channel).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Message::Ack]);
    }

    #[tokio::test]
    async fn test_poll_invalid_length_digit() {
        let (mut channel, handle) = MockChannel::new();
        let (mut monitor, seen) = collecting_monitor();

        handle.push_reply(b'z').await.unwrap();
        let err = monitor.poll(&mut channel).await.unwrap_err();

        assert!(matches!(err, ExecutionError::InvalidLength { byte: b'z' }));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_poll_channel_gone() {
        let (mut channel, handle) = MockChannel::new();
        let (mut monitor, _seen) = collecting_monitor();
        drop(handle);

        let err = monitor.poll(&mut channel).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Channel { .. }));
    }
}
