//! OpalChess - Position Evaluation Module
//!
//! Static evaluation of chess positions:
//! - Material balance
//! - Piece positioning (piece-square tables)
//! - Optional king safety (pawn shield)
//!
//! Scores are in pawns and always from white's point of view.

use crate::board::{Move, Position};
use crate::types::*;

// ============================================================================
// PIECE VALUES
// ============================================================================

pub const PIECE_VALUES: [f32; 7] = [
    0.0,  // NONE
    1.00, // PAWN
    2.93, // KNIGHT
    3.00, // BISHOP
    4.56, // ROOK
    9.05, // QUEEN
    0.0,  // KING
];

/// King material when king safety is enabled
pub const KING_SAFETY_VALUE: f32 = 200.0;

/// Bonus per same-side pawn adjacent to the king
pub const PAWN_SHIELD_BONUS: f32 = 0.10;

/// Default divisor applied to table entries
pub const TABLE_DIVISOR: f32 = 10.0;

// ============================================================================
// PIECE-SQUARE TABLES
// ============================================================================
//
// Written as seen from white's side of the board: first row is rank 8, last
// row is rank 1, files a..h left to right.

const PAWN_PST: [i32; 64] = [
     0,   0,   0,   0,   0,   0,   0,   0,
    10,  10,  10,  10,  10,  10,  10,  10,
     5,   5,  10,  25,  25,  10,   5,   5,
     0,   0,   0,  20,  20,   0,   0,   0,
     5,  -5, -10,   0,   0, -10,  -5,   5,
     5,  10,  10, -20, -20,  10,  10,   5,
    10,  10,  20, -20, -20,  20,  10,  10,
     0,   0,   0,   0,   0,   0,   0,   0,
];

const KNIGHT_PST: [i32; 64] = [
   -50, -40, -30, -30, -30, -30, -40, -50,
   -40, -20,   0,   5,   5,   0, -20, -40,
   -30,   5,  10,  15,  15,  10,   5, -30,
   -30,   0,  15,  20,  20,  15,   0, -30,
   -30,   5,  15,  20,  20,  15,   5, -30,
   -30,   0,  10,  15,  15,  10,   0, -30,
   -40, -20,   0,   0,   0,   0, -20, -40,
   -50, -40, -30, -30, -30, -30, -40, -50,
];

const BISHOP_PST: [i32; 64] = [
   -20, -10, -10, -10, -10, -10, -10, -20,
   -10,   5,   0,   0,   0,   0,   5, -10,
   -10,  10,  10,  10,  10,  10,  10, -10,
   -10,   0,  10,  10,  10,  10,   0, -10,
   -10,   5,   5,  10,  10,   5,   5, -10,
   -10,   0,   5,  10,  10,   5,   0, -10,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -20, -10, -10, -10, -10, -10, -10, -20,
];

const ROOK_PST: [i32; 64] = [
     0,   0,   0,   5,   5,   0,   0,   0,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
     5,  10,  10,  10,  10,  10,  10,   5,
     0,   0,   0,   0,   0,   0,   0,   0,
];

const QUEEN_PST: [i32; 64] = [
   -20, -10, -10,  -5,  -5, -10, -10, -20,
   -10,   0,   5,   0,   0,   0,   0, -10,
   -10,   5,   5,   5,   5,   5,   0, -10,
     0,   0,   5,   5,   5,   5,   0,  -5,
    -5,   0,   5,   5,   5,   5,   0,  -5,
   -10,   0,   5,   5,   5,   5,   0, -10,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -20, -10, -10,  -5,  -5, -10, -10, -20,
];

const KING_PST: [i32; 64] = [
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -20, -30, -30, -40, -40, -30, -30, -20,
   -10, -20, -20, -20, -20, -20, -20, -10,
    20,  20,   0,   0,   0,   0,  20,  20,
    20,  30,  10,   0,   0,  10,  30,  20,
];

/// Evaluation switches
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvalConfig {
    /// Count kings as material and reward pawns next to them
    pub king_safety: bool,
    /// Table entries are divided by this before being added
    pub table_divisor: f32,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            king_safety: false,
            table_divisor: TABLE_DIVISOR,
        }
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Table bonus for a piece, mirrored vertically for black
fn get_pst_value(kind: PieceKind, sq: Square, side: Side) -> i32 {
    let pst = match kind {
        PieceKind::Pawn => &PAWN_PST,
        PieceKind::Knight => &KNIGHT_PST,
        PieceKind::Bishop => &BISHOP_PST,
        PieceKind::Rook => &ROOK_PST,
        PieceKind::Queen => &QUEEN_PST,
        PieceKind::King => &KING_PST,
        PieceKind::None => return 0,
    };

    // Row 0 of every table is rank 8 from white's side
    let index = match side {
        Side::Black => sq.index(),
        _ => sq.flip_rank().index(),
    };
    pst[index]
}

/// Count same-side pawns on the squares around a king
fn pawn_shield(position: &Position, king_sq: Square, side: Side) -> u32 {
    let pawn = Piece::new(PieceKind::Pawn, side);
    let mut count = 0;
    for df in -1..=1 {
        for dr in -1..=1 {
            if df == 0 && dr == 0 {
                continue;
            }
            if let Some(sq) = king_sq.offset(df, dr) {
                if position.piece_at(sq) == pawn {
                    count += 1;
                }
            }
        }
    }
    count
}

/// Value of one piece on one square, before the side sign is applied
fn piece_score(position: &Position, sq: Square, piece: Piece, config: &EvalConfig) -> f32 {
    let mut value = PIECE_VALUES[piece.kind.index()];
    value += get_pst_value(piece.kind, sq, piece.side) as f32 / config.table_divisor;

    if config.king_safety && piece.kind == PieceKind::King {
        value += KING_SAFETY_VALUE;
        value += pawn_shield(position, sq, piece.side) as f32 * PAWN_SHIELD_BONUS;
    }
    value
}

// ============================================================================
// MAIN EVALUATION FUNCTION
// ============================================================================

/// Evaluate the position from white's perspective (positive = white is better)
pub fn evaluate(position: &Position) -> f32 {
    evaluate_with(position, &EvalConfig::default())
}

/// Evaluate with explicit switches, from white's perspective
pub fn evaluate_with(position: &Position, config: &EvalConfig) -> f32 {
    let mut white = 0.0f32;
    let mut black = 0.0f32;

    for (sq, piece) in position.pieces() {
        let value = piece_score(position, sq, piece, config);
        match piece.side {
            Side::White => white += value,
            Side::Black => black += value,
            Side::None => {}
        }
    }

    white - black
}

/// Evaluate a move for move ordering (captures, promotions).
///
/// Captures rank above quiet moves, most valuable victim first and cheapest
/// attacker breaking ties. Promotions get the queen's value on top.
pub fn evaluate_move(position: &Position, mv: &Move) -> f32 {
    let mut score = 0.0;

    let victim = position.piece_at(mv.to);
    if !victim.is_empty() {
        let victim_value = PIECE_VALUES[victim.kind.index()];
        let attacker_value = PIECE_VALUES[mv.piece.kind.index()];
        score += 100.0 + 10.0 * victim_value - attacker_value;
    }

    if mv.is_promotion() {
        score += 10.0 * PIECE_VALUES[PieceKind::Queen.index()];
    }

    score
}
