//! Wire protocol shared by the territory server and client
//!
//! Every message is a single newline-terminated text line. Commands flow
//! client to server, replies flow server to client.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 1234;
pub const MIN_GRID_SIZE: usize = 4;
/// Largest accepted grid side length.
///
/// Every cell carries its own lock, so the cell count is allocated up front
/// and has to stay within memory.
pub const MAX_GRID_SIZE: usize = 1024;
/// Upper bound on a single protocol line, terminator excluded.
pub const MAX_LINE_LENGTH: usize = 256;

/// Number of admitted players required before the game starts.
///
/// Derived from the grid's side length, not its cell count.
pub fn quorum_for(grid_size: usize) -> usize {
    grid_size / 2
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty line")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("{command} expects {expected} argument(s)")]
    MissingArgument {
        command: &'static str,
        expected: usize,
    },
    #[error("invalid coordinate '{0}'")]
    InvalidCoordinate(String),
    #[error("unexpected reply '{0}'")]
    UnexpectedReply(String),
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Hello,
    Take { x: usize, y: usize, name: String },
    Status { x: usize, y: usize },
}

/// Splits the next whitespace-delimited token off the front of `rest`
fn next_token<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let trimmed = rest.trim_start();
    if trimmed.is_empty() {
        *rest = trimmed;
        return None;
    }
    let (token, remainder) = match trimmed.split_once(char::is_whitespace) {
        Some((token, remainder)) => (token, remainder),
        None => (trimmed, ""),
    };
    *rest = remainder;
    Some(token)
}

fn parse_coordinate(
    token: Option<&str>,
    command: &'static str,
    expected: usize,
) -> Result<usize, ProtocolError> {
    let token = token.ok_or(ProtocolError::MissingArgument { command, expected })?;
    token
        .parse()
        .map_err(|_| ProtocolError::InvalidCoordinate(token.to_string()))
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim_start()),
            None => (line, ""),
        };

        match keyword {
            "HELLO" => Ok(Command::Hello),
            "TAKE" => {
                // x and y are single tokens, the name is whatever follows
                let mut rest = rest;
                let x = parse_coordinate(next_token(&mut rest), "TAKE", 3)?;
                let y = parse_coordinate(next_token(&mut rest), "TAKE", 3)?;
                let name = rest.trim();
                if name.is_empty() {
                    return Err(ProtocolError::MissingArgument {
                        command: "TAKE",
                        expected: 3,
                    });
                }
                Ok(Command::Take {
                    x,
                    y,
                    name: name.to_string(),
                })
            }
            "STATUS" => {
                let mut parts = rest.split_whitespace();
                let x = parse_coordinate(parts.next(), "STATUS", 2)?;
                let y = parse_coordinate(parts.next(), "STATUS", 2)?;
                Ok(Command::Status { x, y })
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Hello => write!(f, "HELLO"),
            Command::Take { x, y, name } => write!(f, "TAKE {} {} {}", x, y, name),
            Command::Status { x, y } => write!(f, "STATUS {} {}", x, y),
        }
    }
}

/// Messages sent from server to client
///
/// `Owner` carries the raw answer to a STATUS query and has no keyword, so
/// parsing a reply is only meaningful when the caller knows which kind it
/// expects. See [`Reply::parse_status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Size(usize),
    Nack,
    Start,
    Taken,
    InUse,
    Owner(String),
    End(String),
    Error(String),
}

impl Reply {
    /// Interprets a line received in answer to STATUS.
    ///
    /// END and ERR still win over the raw owner name.
    pub fn parse_status(line: &str) -> Reply {
        match line.parse::<Reply>() {
            Ok(reply @ (Reply::End(_) | Reply::Error(_))) => reply,
            _ => Reply::Owner(line.trim().to_string()),
        }
    }
}

impl FromStr for Reply {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (keyword, rest) = match line.split_once(' ') {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };

        match keyword {
            "SIZE" => rest
                .parse()
                .map(Reply::Size)
                .map_err(|_| ProtocolError::InvalidCoordinate(rest.to_string())),
            "NACK" => Ok(Reply::Nack),
            "START" => Ok(Reply::Start),
            "TAKEN" => Ok(Reply::Taken),
            "INUSE" => Ok(Reply::InUse),
            "END" => Ok(Reply::End(rest.to_string())),
            "ERR" => Ok(Reply::Error(rest.to_string())),
            _ => Err(ProtocolError::UnexpectedReply(line.to_string())),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Size(n) => write!(f, "SIZE {}", n),
            Reply::Nack => write!(f, "NACK"),
            Reply::Start => write!(f, "START"),
            Reply::Taken => write!(f, "TAKEN"),
            Reply::InUse => write!(f, "INUSE"),
            Reply::Owner(name) => write!(f, "{}", name),
            Reply::End(name) => write!(f, "END {}", name),
            Reply::Error(reason) => write!(f, "ERR {}", reason),
        }
    }
}
