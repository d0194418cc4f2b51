//! Control Commands
//!
//! Line commands accepted on stdin while `rotator run` is active.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// Ask one chain's worker to fall back to stable
    Fallback(String),
    Help,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlParseError {
    #[error("Empty command")]
    Empty,
    #[error("Usage: fallback <chain>")]
    MissingChain,
    #[error("Unknown command '{0}' (try 'help')")]
    Unknown(String),
}

impl FromStr for ControlCommand {
    type Err = ControlParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(ControlParseError::Empty)?;

        match verb.to_lowercase().as_str() {
            "fallback" => match (words.next(), words.next()) {
                (Some(chain), None) => Ok(ControlCommand::Fallback(chain.to_string())),
                _ => Err(ControlParseError::MissingChain),
            },
            "help" | "?" => Ok(ControlCommand::Help),
            _ => Err(ControlParseError::Unknown(verb.to_string())),
        }
    }
}
