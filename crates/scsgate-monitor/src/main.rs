//! The `scs-monitor` command line tool.
//!
//! Watches an SCS bus through an SCSGate gateway, logs decoded traffic,
//! and can interactively build a Home Assistant configuration section for
//! the devices it sees.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tokio::task;
use tokio::time;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scsgate_dispatch::Dispatcher;
use scsgate_protocol::Message;
use scsgate_transport::SerialChannel;

mod registry;

use registry::DeviceRegistry;

/// Grace period for the dispatcher to finish its last exchange on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Watch an SCS bus through an SCSGate gateway.
#[derive(Debug, Parser)]
#[command(name = "scs-monitor", version)]
struct Args {
    /// Create a configuration section for Home Assistant at this path on exit
    #[arg(long, value_name = "PATH")]
    homeassistant_config: Option<PathBuf>,

    /// Ignore events related to the devices listed in this file
    #[arg(short, long, value_name = "PATH")]
    filter: Option<PathBuf>,

    /// Append output to this file instead of standard error
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Serial device the gateway is attached to
    device: String,
}

fn init_logging(args: &Args) -> anyhow::Result<()> {
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match &args.output {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Wait for Ctrl-C or SIGTERM.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let ctrl_c = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = ctrl_c => {}
                _ = term.recv() => {}
            }
        }
        Err(_) => {
            let _ = ctrl_c.await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Read one line from the operator.
async fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}");
    std::io::stdout().flush()?;

    let line = task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await??;

    Ok(line.trim().to_string())
}

/// Log one decoded message and, in discovery mode, name its device.
async fn handle_message(
    message: Message,
    registry: &mut DeviceRegistry,
    discovery: bool,
    filtering: bool,
) -> anyhow::Result<()> {
    let entity = message.entity();
    let known = entity.is_some_and(|id| registry.contains(id));

    if !(filtering && known) {
        info!("{}", message);
    }

    if !discovery || known {
        return Ok(());
    }
    let Some(entity) = entity else {
        return Ok(());
    };

    println!("New device found");
    let ha_id = prompt("Enter home assistant unique ID: ").await?;
    let name = prompt("Enter name: ").await?;
    registry.add(entity, ha_id, name);

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let mut registry = DeviceRegistry::new();
    if let Some(path) = &args.filter {
        registry.load_filter(path)?;
    }

    let channel = SerialChannel::open(&args.device)
        .await
        .with_context(|| format!("opening gateway device {}", args.device))?;

    let (message_tx, mut message_rx) = mpsc::unbounded_channel();
    let handle = Dispatcher::new(channel, move |message| {
        let _ = message_tx.send(message);
    })
    .start();

    println!("Entering monitoring mode, press CTRL-C to quit");

    let discovery = args.homeassistant_config.is_some();
    let filtering = args.filter.is_some();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            message = message_rx.recv() => {
                match message {
                    Some(message) => {
                        handle_message(message, &mut registry, discovery, filtering).await?;
                    }
                    // Worker gone; nothing more will arrive.
                    None => break,
                }
            }
        }
    }

    handle.stop();
    match time::timeout(SHUTDOWN_GRACE, handle.join()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Dispatcher worker failed: {}", e),
        Err(_) => warn!(
            "Dispatcher did not stop within {:?}, exiting anyway",
            SHUTDOWN_GRACE
        ),
    }

    if let Some(path) = &args.homeassistant_config {
        registry.dump_home_assistant(path)?;
        println!("Dumped home assistant configuration at {}", path.display());
    }

    Ok(())
}
