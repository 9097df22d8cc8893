//! The command bridge: owns the hub session lifecycle and serializes
//! command execution against it.
//!
//! Producers call [`CommandBridge::submit`] and never block; a dedicated
//! worker task drains the queue one command at a time and reports every
//! milestone on a decoupled status stream the owner polls.

mod state;
mod status;
mod worker;

pub use status::StatusEvent;

use crate::command::Command;
use crate::transport::HubConnector;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Tunables for one bridge instance.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Advertised name of the hub to control.
    pub hub_name: String,
    /// Bound on one discovery scan.
    pub scan_timeout: Duration,
    /// Bound on session establishment.
    pub connect_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            hub_name: "SP-7".into(),
            scan_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Serializes command execution against a single hub.
///
/// Owned by its creator, never a process-global. The hub session itself
/// lives exclusively inside the worker task; the owner only ever touches
/// the two queues.
pub struct CommandBridge {
    config: BridgeConfig,
    connector: Arc<dyn HubConnector>,
    command_tx: mpsc::UnboundedSender<Command>,
    /// Parked until a worker takes it; `None` while a worker owns it.
    command_rx: Option<mpsc::UnboundedReceiver<Command>>,
    status_tx: mpsc::UnboundedSender<StatusEvent>,
    status_rx: mpsc::UnboundedReceiver<StatusEvent>,
    shutdown: Option<watch::Sender<bool>>,
    worker: Option<JoinHandle<()>>,
}

impl CommandBridge {
    pub fn new(config: BridgeConfig, connector: Arc<dyn HubConnector>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        Self {
            config,
            connector,
            command_tx,
            command_rx: Some(command_rx),
            status_tx,
            status_rx,
            shutdown: None,
            worker: None,
        }
    }

    /// Spawn the worker task.
    ///
    /// Idempotent: a live worker, judged by task liveness rather than by
    /// inspecting internal state, makes this a no-op. A finished worker
    /// may be started again; commands submitted in between were stranded
    /// by the old worker, so the new one begins with an empty queue.
    pub fn start(&mut self) {
        if let Some(handle) = &self.worker {
            if !handle.is_finished() {
                debug!("bridge already running");
                return;
            }
        }
        let command_rx = match self.command_rx.take() {
            Some(rx) => rx,
            // The previous worker consumed the queue; restart on a fresh one.
            None => {
                let (tx, rx) = mpsc::unbounded_channel();
                self.command_tx = tx;
                rx
            }
        };
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shutdown = Some(shutdown_tx);
        self.worker = Some(tokio::spawn(worker::run(
            self.config.clone(),
            self.connector.clone(),
            command_rx,
            self.status_tx.clone(),
            shutdown_rx,
        )));
    }

    /// Request worker shutdown and wait for it to exit.
    ///
    /// Safe when the bridge was never started or the worker already
    /// finished. If a session was open, the worker closes it on the way
    /// out and emits exactly one disconnect event.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        if let Some(handle) = self.worker.take() {
            if let Err(e) = handle.await {
                warn!("bridge worker panicked: {e}");
            }
        }
    }

    /// Enqueue a command. Never blocks the caller.
    ///
    /// If no worker is left to drain the queue, the command is surfaced
    /// as stranded on the status stream instead of being dropped.
    pub fn submit(&self, command: Command) {
        if self.command_tx.send(command).is_err() {
            warn!("no worker to execute {command}, stranding it");
            let _ = self.status_tx.send(StatusEvent::Stranded(command));
        }
    }

    /// Next status event, awaiting until one arrives.
    pub async fn next_status(&mut self) -> Option<StatusEvent> {
        self.status_rx.recv().await
    }

    /// Non-blocking status poll for timer-driven consumers.
    pub fn try_next_status(&mut self) -> Option<StatusEvent> {
        self.status_rx.try_recv().ok()
    }
}
