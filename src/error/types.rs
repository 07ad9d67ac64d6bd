//! Error types
//!
//! Defines domain-specific error types for each layer of the game server.

use std::io;

use thiserror::Error;

use crate::game::{Cell, Mark};
use crate::session::Seat;

/// Board module errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("Cell {cell} is already marked {mark}")]
    Occupied { cell: Cell, mark: Mark },
}

/// Errors raised while decoding a client line.
///
/// All of these are recoverable: the line is dropped and the handler keeps
/// reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Empty move")]
    Empty,
    #[error("Not a cell index: {0}")]
    NotANumber(String),
    #[error("Cell index {0} is off the board")]
    OutOfRange(i64),
    #[error("Line too long ({0} bytes)")]
    TooLong(usize),
    #[error("Line is not valid UTF-8")]
    InvalidUtf8,
}

/// Turn gate errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Game is over")]
    GameOver,
    #[error("Not {0}'s turn")]
    NotYourTurn(Seat),
}

/// Errors that stop the server itself.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
