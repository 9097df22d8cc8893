//! Typed failure taxonomy for the command bridge.

use crate::command::Command;
use thiserror::Error;

/// Everything that can go wrong between an operator command and the hub.
///
/// Discovery and connection failures are terminal for the current session
/// lifecycle; execution failures are contained to the one command they name.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The named hub never showed up in a scan.
    #[error("hub '{hub}' not found")]
    DiscoveryFailed { hub: String },

    /// The hub was found but a session could not be established.
    #[error("failed to connect to hub '{hub}': {source:#}")]
    ConnectionFailed {
        hub: String,
        #[source]
        source: anyhow::Error,
    },

    /// One command's program did not run to completion.
    #[error("command '{command}' failed on the hub: {source:#}")]
    ExecutionFailed {
        command: Command,
        #[source]
        source: anyhow::Error,
    },

    /// Operator input that maps to no known command.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}
