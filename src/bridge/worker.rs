//! The bridge's dedicated execution context.
//!
//! The worker is the only holder of a hub session and the only consumer
//! of the command queue, which is what serializes command execution: one
//! command runs to completion before the next is dequeued. Every
//! suspension point races the shutdown signal so `stop()` interrupts
//! promptly.

use super::state::{LinkState, LinkTracker};
use super::status::StatusEvent;
use super::BridgeConfig;
use crate::command::{program, Command};
use crate::error::BridgeError;
use crate::transport::{HubConnector, HubSession};
use anyhow::anyhow;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub(super) async fn run(
    config: BridgeConfig,
    connector: Arc<dyn HubConnector>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    status: mpsc::UnboundedSender<StatusEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut link = LinkTracker::new();

    link.advance(LinkState::Discovering);
    let _ = status.send(StatusEvent::Searching {
        hub: config.hub_name.clone(),
    });

    let discovered = tokio::select! {
        _ = shutdown.changed() => {
            strand_queue(&mut commands, &status);
            return;
        }
        found = timeout(config.scan_timeout, connector.discover(&config.hub_name)) => {
            match found {
                Ok(Ok(found)) => found,
                Ok(Err(e)) => {
                    warn!("hub scan failed: {e:#}");
                    None
                }
                Err(_) => {
                    debug!("scan gave up after {:?}", config.scan_timeout);
                    None
                }
            }
        }
    };

    let Some(mut session) = discovered else {
        warn!(
            "{}",
            BridgeError::DiscoveryFailed {
                hub: config.hub_name.clone(),
            }
        );
        let _ = status.send(StatusEvent::SearchFailed {
            hub: config.hub_name.clone(),
        });
        link.advance(LinkState::Failed);
        strand_queue(&mut commands, &status);
        return;
    };

    link.advance(LinkState::Connecting);
    let connected = tokio::select! {
        _ = shutdown.changed() => {
            close_session(&mut session).await;
            strand_queue(&mut commands, &status);
            return;
        }
        result = timeout(config.connect_timeout, session.connect()) => {
            result.unwrap_or_else(|_| {
                Err(anyhow!("timed out after {:?}", config.connect_timeout))
            })
        }
    };

    if let Err(e) = connected {
        let err = BridgeError::ConnectionFailed {
            hub: config.hub_name.clone(),
            source: e,
        };
        warn!("{err}");
        let _ = status.send(StatusEvent::ConnectFailed {
            hub: config.hub_name.clone(),
            detail: err.to_string(),
        });
        link.advance(LinkState::Failed);
        close_session(&mut session).await;
        strand_queue(&mut commands, &status);
        return;
    }

    link.advance(LinkState::Connected);
    info!("connected to hub {}", config.hub_name);
    let _ = status.send(StatusEvent::Connected {
        hub: config.hub_name.clone(),
    });

    loop {
        let command = tokio::select! {
            _ = shutdown.changed() => break,
            received = commands.recv() => match received {
                Some(command) => command,
                // Every producer is gone, nothing left to serve.
                None => break,
            },
        };

        let _ = status.send(StatusEvent::Sending(command));
        let text = program::generate(command);
        debug!("running {command} ({} bytes of program)", text.len());

        let outcome = tokio::select! {
            _ = shutdown.changed() => {
                // The interrupted command still gets its one terminal status.
                let _ = status.send(StatusEvent::CommandFailed {
                    command,
                    detail: "interrumpido por cierre".into(),
                });
                break;
            }
            result = session.run(&text) => result,
        };

        match outcome {
            Ok(()) => {
                let _ = status.send(StatusEvent::Completed(command));
            }
            Err(e) => {
                // One command's failure never takes the loop down.
                let err = BridgeError::ExecutionFailed { command, source: e };
                warn!("{err}");
                let _ = status.send(StatusEvent::CommandFailed {
                    command,
                    detail: err.to_string(),
                });
            }
        }
    }

    link.advance(LinkState::Disconnected);
    close_session(&mut session).await;
    let _ = status.send(StatusEvent::Disconnected);
    strand_queue(&mut commands, &status);
    debug!("worker exiting in state {:?}", link.state());
}

/// Close the session on the way out. A discovered session never outlives
/// the worker, even when it failed to establish; the close is a
/// guaranteed attempt, not a guaranteed success. `Disconnected` is still
/// only emitted for sessions that actually connected.
async fn close_session(session: &mut Box<dyn HubSession>) {
    if let Err(e) = session.disconnect().await {
        warn!("hub disconnect failed: {e:#}");
    }
}

/// Close the queue and surface everything still in it. Submitted commands
/// are never silently dropped; closing first also makes later `submit`
/// calls fail over to their own stranded event immediately.
fn strand_queue(
    commands: &mut mpsc::UnboundedReceiver<Command>,
    status: &mpsc::UnboundedSender<StatusEvent>,
) {
    commands.close();
    while let Ok(command) = commands.try_recv() {
        warn!("stranding {command}: no session will ever execute it");
        let _ = status.send(StatusEvent::Stranded(command));
    }
}
