//! OpalChess - Move Generator Module
//!
//! Pseudo-legal move generation per piece kind, attack maps, and the legality
//! filter built on apply / check / undo.
//!
//! Pseudo-legal moves ignore whether the mover's own king ends up attacked.
//! Legality is established by applying the move, asking whether the mover is
//! now in check, and undoing it again.

use crate::bitboard::SquareSet;
use crate::board::{Move, Position};
use crate::types::*;

/// Direction offsets as (file, rank) steps
const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];
const QUEEN_DIRECTIONS: [(i8, i8); 8] = [
    (1, 0), (-1, 0), (0, 1), (0, -1),
    (1, 1), (-1, 1), (1, -1), (-1, -1),
];
const KING_DIRECTIONS: [(i8, i8); 8] = QUEEN_DIRECTIONS;
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1), (1, 2), (-1, 2), (-2, 1),
    (-2, -1), (-1, -2), (1, -2), (2, -1),
];

/// How castling is gated beyond the rights flags and an empty path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CastlingRule {
    /// Only the squares between king and rook must be empty. Castling into
    /// check is still rejected by the legality filter, but castling out of or
    /// through an attacked square is allowed.
    #[default]
    PathOnly,
    /// The king's origin, transit and landing squares must also be unattacked.
    Strict,
}

/// Move generator for chess positions
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveGenerator {
    pub castling_rule: CastlingRule,
}

impl MoveGenerator {
    /// Create a move generator with the default castling rule
    pub fn new() -> Self {
        MoveGenerator::default()
    }

    pub fn with_castling_rule(castling_rule: CastlingRule) -> Self {
        MoveGenerator { castling_rule }
    }

    // ------------------------------------------------------------------------
    // Pseudo-legal generation
    // ------------------------------------------------------------------------

    /// Generate the pseudo-legal moves of `piece` standing on `sq`
    pub fn piece_moves(&self, position: &Position, sq: Square, piece: Piece, moves: &mut Vec<Move>) {
        match piece.kind {
            PieceKind::Pawn => self.generate_pawn_moves(position, sq, piece, moves),
            PieceKind::Knight => self.generate_step_moves(position, sq, piece, &KNIGHT_OFFSETS, moves),
            PieceKind::Bishop => self.generate_sliding_moves(position, sq, piece, &BISHOP_DIRECTIONS, moves),
            PieceKind::Rook => self.generate_sliding_moves(position, sq, piece, &ROOK_DIRECTIONS, moves),
            PieceKind::Queen => self.generate_sliding_moves(position, sq, piece, &QUEEN_DIRECTIONS, moves),
            PieceKind::King => self.generate_king_moves(position, sq, piece, moves),
            PieceKind::None => {}
        }
    }

    /// Pseudo-legal moves of every occupied square, both sides
    pub fn all_pseudo_legal_moves(&self, position: &Position) -> Vec<Move> {
        let mut moves = Vec::with_capacity(96);
        for (sq, piece) in position.pieces() {
            self.piece_moves(position, sq, piece, &mut moves);
        }
        moves
    }

    /// Pseudo-legal moves of one side's pieces
    pub fn pseudo_legal_moves(&self, position: &Position, side: Side) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        for (sq, piece) in position.pieces().filter(|(_, p)| p.side == side) {
            self.piece_moves(position, sq, piece, &mut moves);
        }
        moves
    }

    fn generate_pawn_moves(&self, position: &Position, sq: Square, piece: Piece, moves: &mut Vec<Move>) {
        let (direction, start_rank) = match piece.side {
            Side::White => (1i8, 1u8),
            Side::Black => (-1i8, 6u8),
            Side::None => return,
        };

        // Single push, then double push from the starting rank
        if let Some(one) = sq.offset(0, direction) {
            if position.piece_at(one).is_empty() {
                moves.push(Move::new(sq, one, piece));
                if sq.rank() == start_rank {
                    if let Some(two) = sq.offset(0, 2 * direction) {
                        if position.piece_at(two).is_empty() {
                            moves.push(Move::new(sq, two, piece));
                        }
                    }
                }
            }
        }

        // Captures
        for df in [-1, 1] {
            if let Some(target) = sq.offset(df, direction) {
                if position.piece_at(target).is_enemy_of(piece.side) {
                    moves.push(Move::new(sq, target, piece));
                }
            }
        }
    }

    /// Knight jumps and plain king steps
    fn generate_step_moves(
        &self,
        position: &Position,
        sq: Square,
        piece: Piece,
        offsets: &[(i8, i8)],
        moves: &mut Vec<Move>,
    ) {
        for &(df, dr) in offsets {
            if let Some(target) = sq.offset(df, dr) {
                if position.piece_at(target).side != piece.side {
                    moves.push(Move::new(sq, target, piece));
                }
            }
        }
    }

    /// Generate moves for sliding pieces (bishop, rook, queen)
    fn generate_sliding_moves(
        &self,
        position: &Position,
        sq: Square,
        piece: Piece,
        directions: &[(i8, i8)],
        moves: &mut Vec<Move>,
    ) {
        for &(df, dr) in directions {
            let mut current = sq;
            while let Some(next) = current.offset(df, dr) {
                let target = position.piece_at(next);
                if target.is_empty() {
                    moves.push(Move::new(sq, next, piece));
                } else {
                    if target.side != piece.side {
                        moves.push(Move::new(sq, next, piece));
                    }
                    break;
                }
                current = next;
            }
        }
    }

    /// Generate king moves from the given square, including castling
    fn generate_king_moves(&self, position: &Position, sq: Square, piece: Piece, moves: &mut Vec<Move>) {
        self.generate_step_moves(position, sq, piece, &KING_DIRECTIONS, moves);

        let rank = piece.side.back_rank();
        if sq != Square::at(KING_HOME_FILE, rank) {
            return;
        }
        let rights = position.castling_rights();
        let enemy = piece.side.opponent();

        for wing in Wing::BOTH {
            if !rights.has(piece.side, wing) {
                continue;
            }
            let rook_sq = Square::at(wing.rook_file(), rank);
            if position.piece_at(rook_sq) != Piece::new(PieceKind::Rook, piece.side) {
                continue;
            }

            let (lo, hi) = if wing.rook_file() < KING_HOME_FILE {
                (wing.rook_file() + 1, KING_HOME_FILE)
            } else {
                (KING_HOME_FILE + 1, wing.rook_file())
            };
            let path_clear = (lo..hi).all(|file| position.piece_at(Square::at(file, rank)).is_empty());
            if !path_clear {
                continue;
            }

            let landing = Square::at(wing.king_target_file(), rank);
            if self.castling_rule == CastlingRule::Strict {
                let transit = Square::at(wing.rook_target_file(), rank);
                if [sq, transit, landing]
                    .into_iter()
                    .any(|s| self.is_square_attacked(position, s, enemy))
                {
                    continue;
                }
            }

            moves.push(Move::new(sq, landing, piece));
        }
    }

    // ------------------------------------------------------------------------
    // Attack maps
    // ------------------------------------------------------------------------

    /// Squares `piece` on `sq` could capture on.
    ///
    /// For any square holding an enemy piece this agrees exactly with the
    /// destinations of `piece_moves`; it differs only on empty or friendly
    /// squares (pawn pushes and castling are not attacks, defended friends
    /// are).
    pub fn attacks_from(&self, position: &Position, sq: Square, piece: Piece) -> SquareSet {
        let mut set = SquareSet::EMPTY;
        match piece.kind {
            PieceKind::Pawn => {
                let direction = if piece.side == Side::White { 1 } else { -1 };
                for df in [-1, 1] {
                    if let Some(target) = sq.offset(df, direction) {
                        set.insert(target);
                    }
                }
            }
            PieceKind::Knight => add_steps(&mut set, sq, &KNIGHT_OFFSETS),
            PieceKind::King => add_steps(&mut set, sq, &KING_DIRECTIONS),
            PieceKind::Bishop => add_rays(&mut set, position, sq, &BISHOP_DIRECTIONS),
            PieceKind::Rook => add_rays(&mut set, position, sq, &ROOK_DIRECTIONS),
            PieceKind::Queen => add_rays(&mut set, position, sq, &QUEEN_DIRECTIONS),
            PieceKind::None => {}
        }
        set
    }

    /// Every square attacked by `side`
    pub fn attacked_squares(&self, position: &Position, side: Side) -> SquareSet {
        position
            .pieces()
            .filter(|(_, p)| p.side == side)
            .fold(SquareSet::EMPTY, |acc, (sq, p)| acc | self.attacks_from(position, sq, p))
    }

    /// Check if a square is attacked by the specified side
    pub fn is_square_attacked(&self, position: &Position, sq: Square, by: Side) -> bool {
        position
            .pieces()
            .filter(|(_, p)| p.side == by)
            .any(|(from, p)| self.attacks_from(position, from, p).contains(sq))
    }

    /// Check if `side`'s king is attacked. A side without a king is never in check.
    pub fn is_in_check(&self, position: &Position, side: Side) -> bool {
        match position.find_king(side) {
            Some(king_sq) => self.is_square_attacked(position, king_sq, side.opponent()),
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Legality filter
    // ------------------------------------------------------------------------

    /// Apply, test the mover's king, undo.
    pub fn leaves_king_in_check(&self, position: &mut Position, mv: &Move) -> bool {
        position.apply_move(mv);
        let in_check = self.is_in_check(position, mv.piece.side);
        position.undo_move();
        in_check
    }

    /// Check if a move is legal for the side to move.
    ///
    /// Rejects an empty source square, a piece of the wrong side, and moves
    /// absent from the piece's pseudo-legal set before the apply / check /
    /// undo round-trip.
    pub fn is_valid_move(&self, position: &mut Position, mv: &Move) -> bool {
        let piece = position.piece_at(mv.from);
        if piece.is_empty() || piece.side != position.side_to_move() {
            return false;
        }

        let mut candidates = Vec::with_capacity(28);
        self.piece_moves(position, mv.from, piece, &mut candidates);
        let Some(found) = candidates.into_iter().find(|m| m.to == mv.to) else {
            return false;
        };

        !self.leaves_king_in_check(position, &found)
    }

    /// Generate all legal moves for the side to move
    pub fn legal_moves(&self, position: &mut Position) -> Vec<Move> {
        let side = position.side_to_move();
        self.pseudo_legal_moves(position, side)
            .into_iter()
            .filter(|mv| !self.leaves_king_in_check(position, mv))
            .collect()
    }

    /// True as soon as one legal move for the side to move is found
    pub fn has_legal_move(&self, position: &mut Position) -> bool {
        let side = position.side_to_move();
        self.pseudo_legal_moves(position, side)
            .iter()
            .any(|mv| !self.leaves_king_in_check(position, mv))
    }

    /// Side to move is in check and has no legal move
    pub fn is_checkmate(&self, position: &mut Position) -> bool {
        self.is_in_check(position, position.side_to_move()) && !self.has_legal_move(position)
    }

    /// Side to move is not in check and has no legal move
    pub fn is_stalemate(&self, position: &mut Position) -> bool {
        !self.is_in_check(position, position.side_to_move()) && !self.has_legal_move(position)
    }

    /// Count leaf nodes of the legal move tree to `depth`
    pub fn perft(&self, position: &mut Position, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }

        let moves = self.legal_moves(position);
        if depth == 1 {
            return moves.len() as u64;
        }

        let mut nodes = 0u64;
        for mv in moves {
            position.apply_move(&mv);
            nodes += self.perft(position, depth - 1);
            position.undo_move();
        }
        nodes
    }
}

fn add_steps(set: &mut SquareSet, sq: Square, offsets: &[(i8, i8)]) {
    for &(df, dr) in offsets {
        if let Some(target) = sq.offset(df, dr) {
            set.insert(target);
        }
    }
}

fn add_rays(set: &mut SquareSet, position: &Position, sq: Square, directions: &[(i8, i8)]) {
    for &(df, dr) in directions {
        let mut current = sq;
        while let Some(next) = current.offset(df, dr) {
            set.insert(next);
            if !position.piece_at(next).is_empty() {
                break;
            }
            current = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn destinations(position: &Position, from: &str) -> Vec<String> {
        let gen = MoveGenerator::new();
        let from = sq(from);
        let mut moves = Vec::new();
        gen.piece_moves(position, from, position.piece_at(from), &mut moves);
        let mut names: Vec<String> = moves.iter().map(|m| m.to.to_string()).collect();
        names.sort();
        names
    }

    #[test]
    fn pawn_pushes_and_captures() {
        let position = Position::from_fen("4k3/8/8/8/8/3p1n2/4P3/4K3 w").unwrap();
        assert_eq!(destinations(&position, "e2"), ["d3", "e3", "e4", "f3"]);

        let blocked = Position::from_fen("4k3/8/8/8/8/4n3/4P3/4K3 w").unwrap();
        assert!(destinations(&blocked, "e2").is_empty());

        let black = Position::from_fen("4k3/3p4/4N3/8/8/8/8/4K3 b").unwrap();
        assert_eq!(destinations(&black, "d7"), ["d5", "d6", "e6"]);
    }

    #[test]
    fn knight_skips_friendly_squares() {
        let position = Position::from_fen("4k3/8/8/8/8/8/3P4/1N2K3 w").unwrap();
        assert_eq!(destinations(&position, "b1"), ["a3", "c3"]);
    }

    #[test]
    fn sliders_stop_at_first_piece() {
        let position = Position::from_fen("4k3/8/8/1p6/8/8/4P3/R3K3 w").unwrap();
        assert_eq!(
            destinations(&position, "a1"),
            ["a2", "a3", "a4", "a5", "a6", "a7", "a8", "b1", "c1", "d1"]
        );
        let bishop = Position::from_fen("4k3/8/8/1p6/8/3B4/4P3/4K3 w").unwrap();
        assert_eq!(
            destinations(&bishop, "d3"),
            ["b1", "b5", "c2", "c4", "e4", "f5", "g6", "h7"]
        );
    }

    #[test]
    fn start_position_has_twenty_moves() {
        let mut position = Position::new();
        let gen = MoveGenerator::new();
        assert_eq!(gen.legal_moves(&mut position).len(), 20);
        let white_pseudo = gen
            .all_pseudo_legal_moves(&position)
            .into_iter()
            .filter(|m| m.piece.side == Side::White)
            .count();
        assert_eq!(white_pseudo, 20);
        assert_eq!(gen.all_pseudo_legal_moves(&position).len(), 40);
    }

    #[test]
    fn attack_map_matches_check_test() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/r3K3 w").unwrap();
        let gen = MoveGenerator::new();
        assert!(gen.is_in_check(&position, Side::White));
        assert!(!gen.is_in_check(&position, Side::Black));
        let attacked = gen.attacked_squares(&position, Side::Black);
        assert!(attacked.contains(sq("e1")));
        assert!(attacked.contains(sq("a8")));
        assert!(!attacked.contains(sq("f1")));
        assert!(attacked.contains(sq("d7")));
    }

    #[test]
    fn pinned_piece_cannot_move() {
        let mut position = Position::from_fen("4r1k1/8/8/8/8/8/4N3/4K3 w").unwrap();
        let gen = MoveGenerator::new();
        let knight_move = position.parse_move("e2c3").unwrap();
        assert!(!gen.is_valid_move(&mut position, &knight_move));
        let king_move = position.parse_move("e1d1").unwrap();
        assert!(gen.is_valid_move(&mut position, &king_move));
    }

    #[test]
    fn valid_move_rejects_wrong_side_and_off_pattern() {
        let mut position = Position::new();
        let gen = MoveGenerator::new();
        let black = position.parse_move("e7e5").unwrap();
        assert!(!gen.is_valid_move(&mut position, &black));
        let jump = position.parse_move("e2e5").unwrap();
        assert!(!gen.is_valid_move(&mut position, &jump));
        let push = position.parse_move("e2e4").unwrap();
        assert!(gen.is_valid_move(&mut position, &push));
        assert_eq!(position, Position::new());
    }

    #[test]
    fn castling_requires_rights_and_empty_path() {
        let position = Position::from_fen("4k3/8/8/8/8/8/8/R3K2R w").unwrap();
        let king = destinations(&position, "e1");
        assert!(king.contains(&"g1".to_string()));
        assert!(king.contains(&"c1".to_string()));

        let blocked = Position::from_fen("4k3/8/8/8/8/8/8/RN2K1NR w").unwrap();
        let king = destinations(&blocked, "e1");
        assert!(!king.contains(&"g1".to_string()));
        assert!(!king.contains(&"c1".to_string()));

        let no_rights = Position::from_fen("4k3/8/8/8/8/8/8/R3K2R w -").unwrap();
        let king = destinations(&no_rights, "e1");
        assert!(!king.contains(&"g1".to_string()));
    }

    #[test]
    fn perft_shallow_start() {
        let mut position = Position::new();
        let gen = MoveGenerator::new();
        assert_eq!(gen.perft(&mut position, 1), 20);
        assert_eq!(gen.perft(&mut position, 2), 400);
        assert_eq!(position, Position::new());
    }
}
