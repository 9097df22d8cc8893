//! Status events the bridge emits toward the operator.

use crate::command::Command;
use std::fmt;

/// One milestone in the session lifecycle or in a command's execution.
///
/// The variants stay inspectable so a consumer never has to parse strings
/// to tell an error apart; `Display` renders the operator-facing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// A scan for the named hub started.
    Searching { hub: String },
    /// The session is established; the queue is being drained.
    Connected { hub: String },
    /// A command's program is on its way to the hub.
    Sending(Command),
    /// The command's program ran to completion.
    Completed(Command),
    /// The hub never appeared in the scan.
    SearchFailed { hub: String },
    /// The hub appeared but the session could not be established.
    ConnectFailed { hub: String, detail: String },
    /// One command's program failed; later commands are unaffected.
    CommandFailed { command: Command, detail: String },
    /// A submitted command that will provably never execute.
    Stranded(Command),
    /// The session was closed.
    Disconnected,
}

impl StatusEvent {
    /// Whether this event reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            StatusEvent::SearchFailed { .. }
                | StatusEvent::ConnectFailed { .. }
                | StatusEvent::CommandFailed { .. }
                | StatusEvent::Stranded(_)
        )
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusEvent::Searching { hub } => write!(f, "🔍 Buscando hub {hub}..."),
            StatusEvent::Connected { hub } => write!(f, "🔗 Conectado al hub {hub}"),
            StatusEvent::Sending(_) => write!(f, "📤 Enviando comando al hub..."),
            StatusEvent::Completed(command) => write!(f, "✅ {}", command.label()),
            StatusEvent::SearchFailed { hub } => write!(f, "❌ No se encontró el hub {hub}."),
            StatusEvent::ConnectFailed { detail, .. } => write!(f, "❌ Error BLE: {detail}"),
            StatusEvent::CommandFailed { command, detail } => {
                write!(f, "❌ Error ({command}): {detail}")
            }
            StatusEvent::Stranded(command) => {
                write!(f, "⚠️ Comando descartado (sin conexión): {command}")
            }
            StatusEvent::Disconnected => write!(f, "🔌 Hub desconectado"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds_are_marked_as_errors() {
        assert!(StatusEvent::SearchFailed { hub: "SP-7".into() }.is_error());
        assert!(StatusEvent::Stranded(Command::Home).is_error());
        assert!(!StatusEvent::Connected { hub: "SP-7".into() }.is_error());
        assert!(!StatusEvent::Completed(Command::Home).is_error());
        assert!(!StatusEvent::Disconnected.is_error());
    }

    #[test]
    fn test_completion_text_carries_the_command_label() {
        let text = StatusEvent::Completed(Command::SelectGreen).to_string();
        assert_eq!(text, "✅ Clasificado → Verde");
    }
}
