//! Error types for position loading, move text and history handling

use thiserror::Error;

use crate::types::Square;

/// Errors surfaced by the engine core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    /// More than seven rank separators in the board field
    #[error("Invalid FEN: too many ranks")]
    TooManyRanks,

    /// A digit run or piece pushed past the eighth file
    #[error("Invalid FEN: rank {rank} overflows eight files")]
    RankOverflow { rank: u8 },

    /// Letter that names no piece
    #[error("Invalid FEN: unknown piece '{0}'")]
    UnknownPiece(char),

    /// Board field does not describe exactly 8x8 squares
    #[error("Invalid FEN: incomplete board ({ranks} ranks, {files} files on the last rank)")]
    IncompleteBoard { ranks: u8, files: u8 },

    /// No board field at all
    #[error("Invalid FEN: empty position text")]
    EmptyPosition,

    /// Castling field contains something other than `KQkq` or `-`
    #[error("Invalid FEN: unknown castling flag '{0}'")]
    InvalidCastling(char),

    /// Square text outside `a1..h8`
    #[error("Square out of range: {0:?}")]
    SquareOutOfRange(String),

    /// Move text that is not file-rank-file-rank
    #[error("Malformed move text: {0:?}")]
    MalformedMove(String),

    /// Move text whose source square is empty
    #[error("No piece at source square {0}")]
    NoPieceAtSource(Square),

    /// Move rejected by the legality filter
    #[error("Illegal move: {0}")]
    IllegalMove(String),

    /// Undo requested with nothing to undo
    #[error("Cannot undo: move history is empty")]
    EmptyHistory,
}

/// Result type alias for engine operations
pub type ChessResult<T> = Result<T, ChessError>;
