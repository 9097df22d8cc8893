//! Operator commands: the closed command set, its display labels, and the
//! program generator.

pub mod motion;
pub mod program;

use crate::error::BridgeError;
use std::fmt;
use std::str::FromStr;

/// Fallback label for input that maps to no known command. Labels are
/// cosmetic, so unknown input falls back instead of failing; programs are
/// not cosmetic, so parsing the same input fails.
pub const FALLBACK_LABEL: &str = "Comando ejecutado";

/// One discrete operator-requested action on the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Return the sort arm to its rest angle.
    Home,
    /// Continuous sensor-driven sorting until a white read.
    AutoSort,
    SelectGreen,
    SelectBlue,
    SelectRed,
    SelectYellow,
    /// Open the gripper.
    OpenGripper,
    /// Push the current block off the arm.
    PushBlock,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::Home,
        Command::AutoSort,
        Command::SelectGreen,
        Command::SelectBlue,
        Command::SelectRed,
        Command::SelectYellow,
        Command::OpenGripper,
        Command::PushBlock,
    ];

    /// The operator vocabulary token this command parses from.
    pub fn token(&self) -> &'static str {
        match self {
            Command::Home => "inicio",
            Command::AutoSort => "clasificar",
            Command::SelectGreen => "verde",
            Command::SelectBlue => "azul",
            Command::SelectRed => "rojo",
            Command::SelectYellow => "amarillo",
            Command::OpenGripper => "tirar",
            Command::PushBlock => "empujar",
        }
    }

    /// The label shown to the operator when this command completes.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Home => "Posición Inicial",
            Command::AutoSort => "Clasificación automática continua",
            Command::SelectGreen => "Clasificado → Verde",
            Command::SelectBlue => "Clasificado → Azul",
            Command::SelectRed => "Clasificado → Rojo",
            Command::SelectYellow => "Clasificado → Amarillo",
            Command::OpenGripper => "Abrir garra",
            Command::PushBlock => "Empujar bloque",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Command {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inicio" => Ok(Command::Home),
            "clasificar" => Ok(Command::AutoSort),
            "verde" => Ok(Command::SelectGreen),
            "azul" => Ok(Command::SelectBlue),
            "rojo" => Ok(Command::SelectRed),
            "amarillo" => Ok(Command::SelectYellow),
            "tirar" => Ok(Command::OpenGripper),
            "empujar" => Ok(Command::PushBlock),
            _ => Err(BridgeError::UnknownCommand(s.to_string())),
        }
    }
}

/// Label for raw operator input, falling back for anything unknown.
pub fn label_for(raw: &str) -> &'static str {
    raw.parse::<Command>()
        .map(|cmd| cmd.label())
        .unwrap_or(FALLBACK_LABEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_round_trip_through_parsing() {
        for cmd in Command::ALL {
            assert_eq!(cmd.token().parse::<Command>().ok(), Some(cmd));
        }
    }

    #[test]
    fn test_parsing_ignores_case_and_whitespace() {
        assert_eq!("  Verde ".parse::<Command>().ok(), Some(Command::SelectGreen));
        assert_eq!("CLASIFICAR".parse::<Command>().ok(), Some(Command::AutoSort));
    }

    #[test]
    fn test_unknown_input_fails_to_parse() {
        let err = "bailar".parse::<Command>().unwrap_err();
        assert!(matches!(err, BridgeError::UnknownCommand(raw) if raw == "bailar"));
    }

    #[test]
    fn test_labels_match_operator_vocabulary() {
        assert_eq!(Command::Home.label(), "Posición Inicial");
        assert_eq!(Command::SelectGreen.label(), "Clasificado → Verde");
        assert_eq!(Command::SelectBlue.label(), "Clasificado → Azul");
        assert_eq!(Command::SelectRed.label(), "Clasificado → Rojo");
        assert_eq!(Command::SelectYellow.label(), "Clasificado → Amarillo");
        assert_eq!(Command::AutoSort.label(), "Clasificación automática continua");
        assert_eq!(Command::OpenGripper.label(), "Abrir garra");
        assert_eq!(Command::PushBlock.label(), "Empujar bloque");
    }

    #[test]
    fn test_unknown_input_still_gets_a_label() {
        // The asymmetry with parsing: labels fall back, programs cannot.
        assert_eq!(label_for("bailar"), FALLBACK_LABEL);
        assert!("bailar".parse::<Command>().is_err());
    }

    #[test]
    fn test_known_input_gets_its_own_label() {
        assert_eq!(label_for("tirar"), "Abrir garra");
    }
}
