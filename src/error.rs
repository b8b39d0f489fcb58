//! Error types
//!
//! Illegal moves from a person are not errors: `Board::is_valid_move` says
//! `false` and nothing changes. These cover the engine process, the
//! configuration file, and game-flow misuse.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{PieceColor, PieceType};

/// Errors talking to the external search engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine executable could not be started
    #[error("failed to start engine {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("engine I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The expected reply did not arrive in time
    #[error("engine did not answer `{waiting_for}` within {timeout:?}")]
    Timeout {
        waiting_for: String,
        timeout: Duration,
    },

    /// The engine closed its output
    #[error("engine exited")]
    Closed,

    /// A `bestmove` line whose move could not be read
    #[error("malformed engine output: {line}")]
    Protocol { line: String },

    /// `bestmove (none)`: the position has no legal move
    #[error("engine reported no move")]
    NoMove,
}

/// Errors loading the configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Game-flow errors raised by `GameModel`
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    /// A move was attempted while a promotion choice is outstanding
    #[error("a promotion choice is pending")]
    PromotionPending,

    #[error("no promotion is pending")]
    NoPromotionPending,

    #[error("cannot promote to {0:?}")]
    InvalidPromotion(PieceType),

    #[error("it is not {0}'s turn")]
    NotYourTurn(PieceColor),

    #[error("the game is over")]
    GameOver,

    /// The engine suggested a move that is not legal here
    #[error("engine move {uci} is illegal in this position")]
    IllegalEngineMove { uci: String },
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type alias for game operations
pub type GameResult<T> = Result<T, GameError>;
