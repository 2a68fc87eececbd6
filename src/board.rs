//! OpalChess - Board Representation Module
//!
//! This module provides the position, move and undo-record types. It includes
//! FEN parsing and generation, move application with castling and promotion,
//! and the undo history stack.

use std::fmt;

use crate::error::{ChessError, ChessResult};
use crate::types::*;

/// Starting position FEN
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w";

/// A move: source, destination and the piece being moved.
///
/// Captures are implicit in whatever occupies the destination when the move
/// is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
}

impl Move {
    pub const fn new(from: Square, to: Square, piece: Piece) -> Self {
        Move { from, to, piece }
    }

    /// A king stepping two files along its home rank.
    pub fn castling_wing(&self) -> Option<Wing> {
        if self.piece.kind != PieceKind::King
            || self.from.file() != KING_HOME_FILE
            || self.from.rank() != self.to.rank()
        {
            return None;
        }
        match self.to.file() {
            f if f == Wing::Kingside.king_target_file() => Some(Wing::Kingside),
            f if f == Wing::Queenside.king_target_file() => Some(Wing::Queenside),
            _ => None,
        }
    }

    /// A pawn landing on its side's farthest rank.
    pub fn is_promotion(&self) -> bool {
        self.piece.kind == PieceKind::Pawn && self.to.rank() == self.piece.side.promotion_rank()
    }
}

/// Four-character move text, e.g. "e2e4"
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}

/// Rook relocation performed by a castling move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RookShift {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
}

/// Information needed to undo a move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UndoRecord {
    pub from: Square,
    pub to: Square,
    pub moved: Piece,
    pub captured: Piece,
    pub rook: Option<RookShift>,
    pub castling_rights: CastlingRights,
}

/// Chess position: mailbox board, side to move, castling rights and history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    squares: [Piece; 64],
    side_to_move: Side,
    castling: CastlingRights,
    history: Vec<UndoRecord>,
}

impl Position {
    /// Create a position with the standard starting layout
    pub fn new() -> Self {
        let mut position = Position::empty(Side::White);
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (file, kind) in back.into_iter().enumerate() {
            let file = file as u8;
            position.place(file, 0, Piece::new(kind, Side::White));
            position.place(file, 1, Piece::new(PieceKind::Pawn, Side::White));
            position.place(file, 6, Piece::new(PieceKind::Pawn, Side::Black));
            position.place(file, 7, Piece::new(kind, Side::Black));
        }
        position.castling = position.placement_rights();
        position
    }

    /// Create a position with no pieces and no castling rights
    pub fn empty(side_to_move: Side) -> Self {
        Position {
            squares: [Piece::EMPTY; 64],
            side_to_move,
            castling: CastlingRights::NONE,
            history: Vec::new(),
        }
    }

    fn place(&mut self, file: u8, rank: u8, piece: Piece) {
        if let Some(sq) = Square::new(file, rank) {
            self.squares[sq.index()] = piece;
        }
    }

    /// Create a position from FEN text.
    ///
    /// Accepts the board field, a side token (`w` is white; anything else,
    /// including a missing token, is black) and an optional castling field.
    /// Further fields are ignored.
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        let mut parts = fen.split_whitespace();
        let board_part = parts.next().ok_or(ChessError::EmptyPosition)?;

        let side = match parts.next() {
            Some("w") => Side::White,
            _ => Side::Black,
        };
        let mut position = Position::empty(side);

        // Parse piece placement, rank 8 first
        let mut rank: u8 = 7;
        let mut file: u8 = 0;
        for c in board_part.chars() {
            if c == '/' {
                if file != 8 {
                    return Err(ChessError::IncompleteBoard { ranks: 8 - rank, files: file });
                }
                if rank == 0 {
                    return Err(ChessError::TooManyRanks);
                }
                rank -= 1;
                file = 0;
            } else if let Some(run) = c.to_digit(10) {
                let run = run as u8;
                if file + run > 8 {
                    return Err(ChessError::RankOverflow { rank: rank + 1 });
                }
                file += run;
            } else {
                let piece = Piece::from_fen_char(c).ok_or(ChessError::UnknownPiece(c))?;
                if file >= 8 {
                    return Err(ChessError::RankOverflow { rank: rank + 1 });
                }
                position.place(file, rank, piece);
                file += 1;
            }
        }
        if rank != 0 || file != 8 {
            return Err(ChessError::IncompleteBoard { ranks: 8 - rank, files: file });
        }

        let allowed = position.placement_rights();
        position.castling = match parts.next() {
            None => allowed,
            Some(field) => parse_castling_field(field)?.intersect(allowed),
        };

        Ok(position)
    }

    /// Replace this position with one parsed from FEN text.
    ///
    /// On error the position is left untouched.
    pub fn load_fen(&mut self, fen: &str) -> ChessResult<()> {
        *self = Position::from_fen(fen)?;
        Ok(())
    }

    /// Generate FEN text: board, side to move and castling field
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();

        for rank in (0..8u8).rev() {
            let mut empty_count = 0;
            for file in 0..8u8 {
                let piece = self.piece_at_coords(file, rank);
                match piece.to_fen_char() {
                    None => empty_count += 1,
                    Some(c) => {
                        if empty_count > 0 {
                            fen.push_str(&empty_count.to_string());
                            empty_count = 0;
                        }
                        fen.push(c);
                    }
                }
            }
            if empty_count > 0 {
                fen.push_str(&empty_count.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.side_to_move == Side::White { 'w' } else { 'b' });
        fen.push(' ');
        fen.push_str(&self.castling.to_string());
        fen
    }

    /// Castling rights the current placement could support: king on its home
    /// square and the rook in the relevant corner.
    fn placement_rights(&self) -> CastlingRights {
        let mut rights = CastlingRights::NONE;
        for side in [Side::White, Side::Black] {
            let rank = side.back_rank();
            if self.piece_at_coords(KING_HOME_FILE, rank) != Piece::new(PieceKind::King, side) {
                continue;
            }
            for wing in Wing::BOTH {
                if self.piece_at_coords(wing.rook_file(), rank) == Piece::new(PieceKind::Rook, side) {
                    rights.grant(side, wing);
                }
            }
        }
        rights
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Piece {
        self.squares[sq.index()]
    }

    #[inline]
    fn piece_at_coords(&self, file: u8, rank: u8) -> Piece {
        Square::new(file, rank).map_or(Piece::EMPTY, |sq| self.piece_at(sq))
    }

    #[inline]
    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    /// Number of moves that can currently be undone
    #[inline]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Most recently applied move's undo record
    pub fn last_record(&self) -> Option<&UndoRecord> {
        self.history.last()
    }

    /// Occupied squares with their pieces, a1 first
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all()
            .map(move |sq| (sq, self.piece_at(sq)))
            .filter(|(_, p)| !p.is_empty())
    }

    /// Find the king's square for the specified side
    pub fn find_king(&self, side: Side) -> Option<Square> {
        let king = Piece::new(PieceKind::King, side);
        Square::all().find(|&sq| self.piece_at(sq) == king)
    }

    /// Parse four-character move text such as "e2e4" against this position.
    ///
    /// A fifth character is accepted only as `q`, since promotion is always
    /// to a queen. The result is not checked for legality.
    pub fn parse_move(&self, text: &str) -> ChessResult<Move> {
        let text = text.trim();
        if !text.is_ascii() || !(text.len() == 4 || text.len() == 5) {
            return Err(ChessError::MalformedMove(text.to_string()));
        }
        if text.len() == 5 && !text[4..].eq_ignore_ascii_case("q") {
            return Err(ChessError::MalformedMove(text.to_string()));
        }
        let from: Square = text[0..2].parse()?;
        let to: Square = text[2..4].parse()?;
        let piece = self.piece_at(from);
        if piece.is_empty() {
            return Err(ChessError::NoPieceAtSource(from));
        }
        Ok(Move::new(from, to, piece))
    }

    /// Apply a move, pushing an `UndoRecord` onto the history.
    ///
    /// Handles castling (rook relocation), queen promotion and castling-rights
    /// narrowing, then switches the side to move.
    pub fn apply_move(&mut self, mv: &Move) {
        let captured = self.piece_at(mv.to);
        let mut record = UndoRecord {
            from: mv.from,
            to: mv.to,
            moved: mv.piece,
            captured,
            rook: None,
            castling_rights: self.castling,
        };

        // Move the piece
        self.squares[mv.from.index()] = Piece::EMPTY;
        self.squares[mv.to.index()] = if mv.is_promotion() {
            Piece::new(PieceKind::Queen, mv.piece.side)
        } else {
            mv.piece
        };

        // Handle castling
        if let Some(wing) = mv.castling_wing() {
            let rank = mv.from.rank();
            let rook_from = Square::at(wing.rook_file(), rank);
            let rook_to = Square::at(wing.rook_target_file(), rank);
            let rook = self.piece_at(rook_from);
            self.squares[rook_to.index()] = rook;
            self.squares[rook_from.index()] = Piece::EMPTY;
            record.rook = Some(RookShift { from: rook_from, to: rook_to, piece: rook });
        }

        // Update castling rights
        if mv.piece.kind == PieceKind::King {
            self.castling.revoke_side(mv.piece.side);
        }
        for side in [Side::White, Side::Black] {
            for wing in Wing::BOTH {
                let corner = Square::at(wing.rook_file(), side.back_rank());
                if mv.from == corner || mv.to == corner {
                    self.castling.revoke(side, wing);
                }
            }
        }

        self.history.push(record);
        self.side_to_move = mv.piece.side.opponent();
    }

    /// Undo the most recent move.
    ///
    /// # Panics
    ///
    /// Panics if the history is empty. Every undo must pair with an earlier
    /// `apply_move`; use [`Position::try_undo_move`] when that is not known.
    pub fn undo_move(&mut self) {
        if let Err(err) = self.try_undo_move() {
            panic!("undo_move contract violated: {}", err);
        }
    }

    /// Undo the most recent move, or report `EmptyHistory`.
    pub fn try_undo_move(&mut self) -> ChessResult<UndoRecord> {
        let record = self.history.pop().ok_or(ChessError::EmptyHistory)?;

        self.squares[record.from.index()] = record.moved;
        self.squares[record.to.index()] = record.captured;

        // Move rook back
        if let Some(shift) = record.rook {
            self.squares[shift.from.index()] = shift.piece;
            self.squares[shift.to.index()] = Piece::EMPTY;
        }

        self.castling = record.castling_rights;
        self.side_to_move = record.moved.side;
        Ok(record)
    }

    /// Display the board as a string, rank 8 at the top
    pub fn display(&self) -> String {
        let mut lines = Vec::new();
        lines.push("  +---+---+---+---+---+---+---+---+".to_string());

        for rank in (0..8u8).rev() {
            let mut row = format!("{} |", rank + 1);
            for file in 0..8u8 {
                match self.piece_at_coords(file, rank).to_fen_char() {
                    Some(c) => row.push_str(&format!(" {} |", c)),
                    None => row.push_str("   |"),
                }
            }
            lines.push(row);
            lines.push("  +---+---+---+---+---+---+---+---+".to_string());
        }
        lines.push("    a   b   c   d   e   f   g   h".to_string());

        lines.join("\n")
    }
}

fn parse_castling_field(field: &str) -> ChessResult<CastlingRights> {
    let mut rights = CastlingRights::NONE;
    if field == "-" {
        return Ok(rights);
    }
    for c in field.chars() {
        match c {
            'K' => rights.grant(Side::White, Wing::Kingside),
            'Q' => rights.grant(Side::White, Wing::Queenside),
            'k' => rights.grant(Side::Black, Wing::Kingside),
            'q' => rights.grant(Side::Black, Wing::Queenside),
            _ => return Err(ChessError::InvalidCastling(c)),
        }
    }
    Ok(rights)
}

impl Default for Position {
    fn default() -> Self {
        Position::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
