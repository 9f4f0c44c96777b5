//! Gambit - Error Module
//!
//! Errors surfaced to callers of the board and engine: malformed positions,
//! unparsable squares or moves, and moves that are not legal right now.

use thiserror::Error;

/// Errors that can occur while loading positions or applying moves.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    /// FEN string could not be parsed
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    /// Square name outside a1..h8
    #[error("invalid square: {0}")]
    InvalidSquare(String),

    /// Move string not in coordinate notation
    #[error("invalid move string: {0}")]
    InvalidMoveString(String),

    /// Well-formed move that is not legal in the current position
    #[error("illegal move: {0}")]
    IllegalMove(String),
}

/// Result type alias for board and engine operations
pub type Result<T> = std::result::Result<T, ChessError>;
