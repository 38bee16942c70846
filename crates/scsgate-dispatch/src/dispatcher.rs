//! Single-worker task dispatcher for the gateway.
//!
//! The dispatcher owns exclusive access to the channel: exactly one worker
//! task ever reads or writes it, so command writes and monitor polls can
//! never interleave on the wire. Callers interact through a handle that
//! appends tasks to a queue; the worker drains the queue in FIFO order and
//! falls back to a standing monitor poll whenever the queue is empty, so
//! the bus is serviced even with no pending commands.
//!
//! ```text
//! callers ──enqueue(Task)──► queue ──► worker ──► BusChannel
//!                                        │
//!                                        └──► Monitor ──sink──► caller
//! ```
//!
//! A failed task is logged and dropped; the loop always continues. Stop
//! requests are observed at the top of each iteration, after which the
//! worker closes the channel and terminates.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, warn};

use scsgate_core::DeviceId;
use scsgate_protocol::Message;
use scsgate_transport::BusChannel;

use crate::monitor::Monitor;
use crate::task::Task;

/// Lifecycle state of the dispatcher worker.
///
/// `Running` from `start` until a stop request; `Stopping` once a stop has
/// been requested and until the worker has closed the channel; `Stopped`
/// is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Worker is servicing the queue and the bus.
    Running,

    /// Stop requested; the worker finishes its current exchange and shuts
    /// the channel down.
    Stopping,

    /// Worker has terminated and the channel is closed.
    Stopped,
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Stopping => write!(f, "Stopping"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Configuration for the dispatcher worker.
///
/// # Example
///
/// ```
/// use scsgate_dispatch::DispatcherConfig;
/// use std::time::Duration;
///
/// let config = DispatcherConfig {
///     ack_timeout: Some(Duration::from_millis(500)),
///     ..DispatcherConfig::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Bound on the acknowledgment read of command tasks. `None`
    /// reproduces the gateway's native behavior of blocking until the
    /// device answers.
    pub ack_timeout: Option<Duration>,

    /// Pause after a failed monitor poll before the next one, so a dead
    /// channel does not spin the worker hot.
    pub poll_backoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            ack_timeout: None,
            poll_backoff: Duration::from_millis(100),
        }
    }
}

/// Single-worker dispatcher over a gateway channel.
///
/// # Lifecycle
///
/// 1. Create with [`new`](Dispatcher::new) or
///    [`with_config`](Dispatcher::with_config), handing over the channel
///    and the notification sink
/// 2. Call [`start`](Dispatcher::start) to spawn the worker and get a
///    [`DispatcherHandle`]
/// 3. Enqueue tasks through the handle; forwarded bus messages arrive at
///    the sink
/// 4. Call [`stop`](DispatcherHandle::stop) and
///    [`join`](DispatcherHandle::join) to shut down
///
/// # Example
///
/// ```no_run
/// use scsgate_core::DeviceId;
/// use scsgate_dispatch::Dispatcher;
/// use scsgate_transport::SerialChannel;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let channel = SerialChannel::open("/dev/ttyUSB0").await?;
/// let dispatcher = Dispatcher::new(channel, |message| {
///     println!("bus: {}", message);
/// });
///
/// let handle = dispatcher.start();
/// handle.toggle_device(DeviceId::new(0x12), true);
///
/// handle.stop();
/// handle.join().await?;
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher<C: BusChannel> {
    /// Channel the worker will own exclusively.
    channel: C,

    /// Standing monitor, including the duplicate-suppression state.
    monitor: Monitor,

    /// Worker configuration.
    config: DispatcherConfig,
}

impl<C: BusChannel + 'static> Dispatcher<C> {
    /// Create a dispatcher with the default configuration.
    ///
    /// `sink` receives every forwarded bus message; it is invoked on the
    /// worker task and must not block.
    pub fn new(channel: C, sink: impl FnMut(Message) + Send + 'static) -> Self {
        Self::with_config(channel, sink, DispatcherConfig::default())
    }

    /// Create a dispatcher with a custom configuration.
    pub fn with_config(
        channel: C,
        sink: impl FnMut(Message) + Send + 'static,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            channel,
            monitor: Monitor::new(sink),
            config,
        }
    }

    /// Spawn the worker task and return the handle controlling it.
    pub fn start(self) -> DispatcherHandle {
        let Self {
            channel,
            monitor,
            config,
        } = self;

        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(DispatcherState::Running);

        let worker = tokio::spawn(Self::run(
            channel, monitor, config, task_rx, stop_rx, state_tx,
        ));

        DispatcherHandle {
            task_tx,
            stop_tx,
            state_rx,
            worker,
        }
    }

    async fn run(
        mut channel: C,
        mut monitor: Monitor,
        config: DispatcherConfig,
        mut task_rx: mpsc::UnboundedReceiver<Task>,
        stop_rx: watch::Receiver<bool>,
        state_tx: watch::Sender<DispatcherState>,
    ) {
        info!("Dispatcher running");

        loop {
            if *stop_rx.borrow() {
                break;
            }

            match task_rx.try_recv() {
                Ok(task) => {
                    debug!("Dispatcher: got task {}", task);
                    if let Err(e) = task.execute(&mut channel, config.ack_timeout).await {
                        error!("{}", e);
                    }
                }
                Err(TryRecvError::Empty) => {
                    if let Err(e) = monitor.poll(&mut channel).await {
                        error!("{}", e);
                        time::sleep(config.poll_backoff).await;
                    }
                }
                Err(TryRecvError::Disconnected) => {
                    // Every handle is gone; nothing can enqueue or stop us
                    // any more, so treat the drop as a stop request.
                    debug!("Dispatcher handle dropped");
                    break;
                }
            }
        }

        let _ = state_tx.send(DispatcherState::Stopping);
        info!("Dispatcher exiting");
        if let Err(e) = channel.close().await {
            warn!("Error closing channel: {}", e);
        }
        let _ = state_tx.send(DispatcherState::Stopped);
    }
}

/// Handle for a running dispatcher.
///
/// Enqueueing is fire-and-forget: tasks execute in FIFO order on the
/// worker and failures surface in the log, never back to the caller. The
/// handle cannot be cloned; share it behind an `Arc` if several call
/// sites need to issue commands.
pub struct DispatcherHandle {
    /// Pending-task queue feeding the worker.
    task_tx: mpsc::UnboundedSender<Task>,

    /// Stop flag observed at the top of each worker iteration.
    stop_tx: watch::Sender<bool>,

    /// Lifecycle state published by the worker.
    state_rx: watch::Receiver<DispatcherState>,

    /// The worker task itself.
    worker: JoinHandle<()>,
}

impl DispatcherHandle {
    /// Append a task to the pending queue.
    ///
    /// Returns immediately; the task executes once the worker reaches it.
    /// A task enqueued after the dispatcher has stopped is dropped.
    pub fn enqueue(&self, task: Task) {
        let _ = self.task_tx.send(task);
    }

    /// Ask `target` to report its current status on the bus.
    pub fn request_status(&self, target: DeviceId) {
        self.enqueue(Task::GetStatus { target });
    }

    /// Switch `target` on (`toggled == true`) or off.
    pub fn toggle_device(&self, target: DeviceId, toggled: bool) {
        self.enqueue(Task::ToggleStatus { target, toggled });
    }

    /// Start raising the roller shutter `target`.
    pub fn raise_roller_shutter(&self, target: DeviceId) {
        self.enqueue(Task::RaiseShutter { target });
    }

    /// Start lowering the roller shutter `target`.
    pub fn lower_roller_shutter(&self, target: DeviceId) {
        self.enqueue(Task::LowerShutter { target });
    }

    /// Halt the roller shutter `target`.
    pub fn halt_roller_shutter(&self, target: DeviceId) {
        self.enqueue(Task::HaltShutter { target });
    }

    /// Request termination.
    ///
    /// Idempotent. The worker observes the request at the top of its next
    /// iteration; an exchange already in flight runs to completion first.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Current lifecycle state of the worker.
    pub fn state(&self) -> DispatcherState {
        let state = *self.state_rx.borrow();
        if state == DispatcherState::Running && *self.stop_tx.borrow() {
            // Stop requested but not yet observed by the worker.
            return DispatcherState::Stopping;
        }
        state
    }

    /// Wait for the worker to terminate.
    ///
    /// Call [`stop`](Self::stop) first; joining a running dispatcher waits
    /// for as long as the worker keeps servicing the bus. A worker panic
    /// surfaces as an error.
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.worker.await
    }
}
