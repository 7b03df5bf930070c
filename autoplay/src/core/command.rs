//! Routing of interactive input tokens.
//!
//! Reserved words are intercepted before a token is treated as a tile.

use thiserror::Error;

use crate::core::config::Strategy;

pub const AUTO_PREFIX: &str = "auto-";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown automation command {0:?} (try auto-help)")]
    UnknownAuto(String),
    #[error("empty input")]
    Empty,
}

/// Automation control commands (`auto-*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoCommand {
    Help,
    Enable,
    Disable,
    Toggle,
    Show,
    Reset,
    SetStrategy(Strategy),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Help,
    Quit,
    Auto(AutoCommand),
    /// Anything not reserved; interpreted by the caller as a tile token.
    Tile(String),
}

pub fn parse_command(input: &str) -> Result<SessionCommand, CommandError> {
    let token = input.trim();
    match token {
        "" => Err(CommandError::Empty),
        "help" => Ok(SessionCommand::Help),
        "quit" | "exit" => Ok(SessionCommand::Quit),
        _ => match token.strip_prefix(AUTO_PREFIX) {
            Some(rest) => parse_auto(rest)
                .map(SessionCommand::Auto)
                .ok_or_else(|| CommandError::UnknownAuto(token.to_string())),
            None => Ok(SessionCommand::Tile(token.to_string())),
        },
    }
}

fn parse_auto(rest: &str) -> Option<AutoCommand> {
    let command = match rest {
        "help" => AutoCommand::Help,
        "on" | "enable" => AutoCommand::Enable,
        "off" | "disable" => AutoCommand::Disable,
        "toggle" => AutoCommand::Toggle,
        "show" | "status" => AutoCommand::Show,
        "reset" => AutoCommand::Reset,
        other => {
            let name = other.strip_prefix("strategy-").unwrap_or(other);
            AutoCommand::SetStrategy(name.parse().ok()?)
        }
    };
    Some(command)
}

pub const HELP_TEXT: &str = "\
commands:
  help         show this help
  auto-help    show automation commands
  quit, exit   leave the session
  <tile>       draw or discard a tile, e.g. 1m 0p 7z";

pub const AUTO_HELP_TEXT: &str = "\
automation commands:
  auto-enable, auto-on      turn automation on
  auto-disable, auto-off    turn automation off
  auto-toggle               flip automation on/off
  auto-show                 print the active configuration
  auto-reset                restore and persist the default configuration
  auto-aggressive | auto-balanced | auto-defensive
                            switch discard strategy";
