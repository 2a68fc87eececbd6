//! OpalChess - Mailbox Chess Engine
//!
//! A chess engine written in Rust with support for:
//! - Standard piece movement and castling (no en passant, queen-only promotion)
//! - FEN loading and emission
//! - Negamax search with alpha-beta pruning and quiescence
//! - Late Move Reductions
//! - A UCI-style text front end

pub mod types;
pub mod error;
pub mod bitboard;
pub mod board;
pub mod move_generator;
pub mod evaluation;
pub mod search;
pub mod uci;

pub use board::{Move, Position, UndoRecord, STARTING_FEN};
pub use error::{ChessError, ChessResult};
pub use evaluation::{evaluate, evaluate_with, EvalConfig};
pub use move_generator::{CastlingRule, MoveGenerator};
pub use search::{SearchConfig, SearchEngine, SearchResult};
pub use types::{CastlingRights, Piece, PieceKind, Side, Square};
