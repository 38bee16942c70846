//! Task execution and bus monitoring for SCSGate gateways.
//!
//! The gateway is half-duplex: a command exchange and a monitor poll must
//! never interleave on the wire. This crate serializes all bus access
//! behind a single worker task. Callers enqueue [`Task`]s through a
//! [`DispatcherHandle`]; whenever the queue is empty the worker polls the
//! gateway for traffic and forwards decoded [`Message`]s to a caller
//! supplied sink, with consecutive duplicate state reports suppressed.
//!
//! ```text
//!                 ┌──────────────┐
//!  enqueue(Task)  │  Dispatcher  │   write / read
//! ───────────────►│    worker    │◄───────────────► BusChannel
//!                 │              │
//!  sink(Message)  │   Monitor    │
//! ◄───────────────│              │
//!                 └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use scsgate_core::DeviceId;
//! use scsgate_dispatch::Dispatcher;
//! use scsgate_transport::SerialChannel;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let channel = SerialChannel::open("/dev/ttyUSB0").await?;
//! let handle = Dispatcher::new(channel, |message| {
//!     println!("bus: {}", message);
//! })
//! .start();
//!
//! handle.toggle_device(DeviceId::new(0x12), true);
//!
//! handle.stop();
//! handle.join().await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`Message`]: scsgate_protocol::Message

pub mod dispatcher;
pub mod error;
pub mod monitor;
pub mod task;

pub use dispatcher::{Dispatcher, DispatcherConfig, DispatcherHandle, DispatcherState};
pub use error::{ExecutionError, Result};
pub use monitor::{MessageSink, Monitor};
pub use task::Task;
