//! OpalChess - Type definitions and constants
//!
//! This module provides the core value types for representing sides, pieces,
//! squares and castling rights.

use std::fmt;
use std::str::FromStr;

use crate::error::ChessError;

/// File and rank names for move text
pub const FILE_NAMES: &[u8; 8] = b"abcdefgh";
pub const RANK_NAMES: &[u8; 8] = b"12345678";

// ============================================================================
// SIDE
// ============================================================================

/// Side owning a piece. `None` only ever pairs with an empty square.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Side {
    #[default]
    None,
    White,
    Black,
}

impl Side {
    /// The opposing side. `None` has no opponent and maps to itself.
    #[inline]
    pub const fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
            Side::None => Side::None,
        }
    }

    /// +1 for white, -1 for black, 0 for none.
    #[inline]
    pub const fn sign(self) -> f32 {
        match self {
            Side::White => 1.0,
            Side::Black => -1.0,
            Side::None => 0.0,
        }
    }

    /// Rank the side's pieces start on.
    #[inline]
    pub const fn back_rank(self) -> u8 {
        match self {
            Side::Black => 7,
            _ => 0,
        }
    }

    /// Rank a pawn of this side promotes on.
    #[inline]
    pub const fn promotion_rank(self) -> u8 {
        match self {
            Side::Black => 0,
            _ => 7,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
            Side::None => write!(f, "none"),
        }
    }
}

// ============================================================================
// PIECE
// ============================================================================

/// Piece kinds. Discriminants index `PIECE_VALUES` in the evaluator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PieceKind {
    #[default]
    None = 0,
    Pawn = 1,
    Knight = 2,
    Bishop = 3,
    Rook = 4,
    Queen = 5,
    King = 6,
}

impl PieceKind {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase letter used in FEN and move text.
    pub const fn letter(self) -> Option<char> {
        match self {
            PieceKind::Pawn => Some('p'),
            PieceKind::Knight => Some('n'),
            PieceKind::Bishop => Some('b'),
            PieceKind::Rook => Some('r'),
            PieceKind::Queen => Some('q'),
            PieceKind::King => Some('k'),
            PieceKind::None => None,
        }
    }
}

/// A (kind, side) pair. The empty square is `Piece::EMPTY`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
}

impl Piece {
    pub const EMPTY: Piece = Piece {
        kind: PieceKind::None,
        side: Side::None,
    };

    /// Build a piece. A `None` kind always yields `Piece::EMPTY`.
    #[inline]
    pub const fn new(kind: PieceKind, side: Side) -> Self {
        match kind {
            PieceKind::None => Piece::EMPTY,
            _ => Piece { kind, side },
        }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        matches!(self.kind, PieceKind::None)
    }

    /// True if this square holds a piece belonging to the opponent of `side`.
    #[inline]
    pub fn is_enemy_of(self, side: Side) -> bool {
        !self.is_empty() && self.side != side
    }

    /// FEN piece character to piece value
    pub fn from_fen_char(c: char) -> Option<Piece> {
        let side = if c.is_ascii_uppercase() {
            Side::White
        } else {
            Side::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        Some(Piece::new(kind, side))
    }

    /// Piece value to FEN character
    pub fn to_fen_char(self) -> Option<char> {
        let c = self.kind.letter()?;
        match self.side {
            Side::White => Some(c.to_ascii_uppercase()),
            _ => Some(c),
        }
    }
}

// ============================================================================
// SQUARE
// ============================================================================

/// A board square packed as `rank * 8 + file` (0 = a1, 63 = h8).
///
/// Only values in `0..64` can be constructed, so the packed index and the
/// `(file, rank)` pair are always interchangeable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    /// Square from (file, rank), both in `0..8`.
    #[inline]
    pub const fn new(file: u8, rank: u8) -> Option<Square> {
        if file < 8 && rank < 8 {
            Some(Square(rank * 8 + file))
        } else {
            None
        }
    }

    /// Square from (file, rank) taken modulo 8.
    #[inline]
    pub const fn at(file: u8, rank: u8) -> Square {
        Square((rank & 7) * 8 + (file & 7))
    }

    /// Square from signed coordinates; off-board yields `None`.
    #[inline]
    pub const fn from_coords(file: i8, rank: i8) -> Option<Square> {
        if file >= 0 && file < 8 && rank >= 0 && rank < 8 {
            Some(Square((rank * 8 + file) as u8))
        } else {
            None
        }
    }

    #[inline]
    pub const fn from_index(index: usize) -> Option<Square> {
        if index < 64 {
            Some(Square(index as u8))
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn file(self) -> u8 {
        self.0 % 8
    }

    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 / 8
    }

    /// Step by a (file, rank) delta, `None` when it leaves the board.
    #[inline]
    pub const fn offset(self, df: i8, dr: i8) -> Option<Square> {
        Square::from_coords(self.file() as i8 + df, self.rank() as i8 + dr)
    }

    /// Same file, rank mirrored.
    #[inline]
    pub const fn flip_rank(self) -> Square {
        Square((7 - self.rank()) * 8 + self.file())
    }

    /// All 64 squares from a1 to h8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0u8..64).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            FILE_NAMES[self.file() as usize] as char,
            RANK_NAMES[self.rank() as usize] as char
        )
    }
}

impl FromStr for Square {
    type Err = ChessError;

    /// Parse algebraic notation such as `e4`.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let bytes = name.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::SquareOutOfRange(name.to_string()));
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::new(file, rank).ok_or_else(|| ChessError::SquareOutOfRange(name.to_string()))
    }
}

// ============================================================================
// CASTLING RIGHTS
// ============================================================================

/// Which rook a castling move uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Wing {
    Kingside,
    Queenside,
}

impl Wing {
    pub const BOTH: [Wing; 2] = [Wing::Kingside, Wing::Queenside];

    /// File of the rook's home corner.
    #[inline]
    pub const fn rook_file(self) -> u8 {
        match self {
            Wing::Kingside => 7,
            Wing::Queenside => 0,
        }
    }

    /// File the rook lands on after castling.
    #[inline]
    pub const fn rook_target_file(self) -> u8 {
        match self {
            Wing::Kingside => 5,
            Wing::Queenside => 3,
        }
    }

    /// File the king lands on after castling.
    #[inline]
    pub const fn king_target_file(self) -> u8 {
        match self {
            Wing::Kingside => 6,
            Wing::Queenside => 2,
        }
    }
}

/// Home file of both kings.
pub const KING_HOME_FILE: u8 = 4;

/// Castling rights bitmasks
const CASTLE_WK: u8 = 1;
const CASTLE_WQ: u8 = 2;
const CASTLE_BK: u8 = 4;
const CASTLE_BQ: u8 = 8;

/// Four independent castling flags grouped per side and wing.
///
/// Within play rights only narrow: `revoke` and `revoke_side` clear flags and
/// nothing but `Position::undo_move` ever restores them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(CASTLE_WK | CASTLE_WQ | CASTLE_BK | CASTLE_BQ);

    #[inline]
    const fn mask(side: Side, wing: Wing) -> u8 {
        match (side, wing) {
            (Side::White, Wing::Kingside) => CASTLE_WK,
            (Side::White, Wing::Queenside) => CASTLE_WQ,
            (Side::Black, Wing::Kingside) => CASTLE_BK,
            (Side::Black, Wing::Queenside) => CASTLE_BQ,
            (Side::None, _) => 0,
        }
    }

    #[inline]
    pub const fn has(self, side: Side, wing: Wing) -> bool {
        let m = Self::mask(side, wing);
        m != 0 && self.0 & m != 0
    }

    #[inline]
    pub fn grant(&mut self, side: Side, wing: Wing) {
        self.0 |= Self::mask(side, wing);
    }

    #[inline]
    pub fn revoke(&mut self, side: Side, wing: Wing) {
        self.0 &= !Self::mask(side, wing);
    }

    #[inline]
    pub fn revoke_side(&mut self, side: Side) {
        self.revoke(side, Wing::Kingside);
        self.revoke(side, Wing::Queenside);
    }

    /// Flags present in both sets.
    #[inline]
    pub const fn intersect(self, other: CastlingRights) -> CastlingRights {
        CastlingRights(self.0 & other.0)
    }

    /// True if every flag in `self` is also set in `other`.
    #[inline]
    pub const fn is_subset_of(self, other: CastlingRights) -> bool {
        self.0 & !other.0 == 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        CastlingRights::NONE
    }
}

impl fmt::Display for CastlingRights {
    /// FEN castling field, `-` when empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        for (side, wing, c) in [
            (Side::White, Wing::Kingside, 'K'),
            (Side::White, Wing::Queenside, 'Q'),
            (Side::Black, Wing::Kingside, 'k'),
            (Side::Black, Wing::Queenside, 'q'),
        ] {
            if self.has(side, wing) {
                write!(f, "{}", c)?;
            }
        }
        Ok(())
    }
}
