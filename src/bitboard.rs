//! OpalChess - Bitboard Module
//!
//! A bitboard is a 64-bit integer where each bit represents a square on the
//! board. The engine keeps its pieces in a mailbox; bitboards are only used
//! for square sets such as "every square attacked by black".

use std::ops::{BitOr, BitOrAssign};

use crate::types::Square;

pub const FILE_A: u64 = 0x0101010101010101;
pub const RANK_1: u64 = 0x00000000000000FF;

/// Bitboard for a single square
#[inline]
pub const fn square_bb(sq: Square) -> u64 {
    1u64 << sq.index()
}

/// Bitboard of an entire file
#[inline]
pub const fn file_bb(file: u8) -> u64 {
    FILE_A << file
}

/// Bitboard of an entire rank
#[inline]
pub const fn rank_bb(rank: u8) -> u64 {
    RANK_1 << (rank * 8)
}

/// Pop the least significant bit and return its square index
#[inline]
pub fn pop_lsb(bb: &mut u64) -> usize {
    let sq = bb.trailing_zeros() as usize;
    *bb &= *bb - 1;
    sq
}

/// A set of squares backed by one bitboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SquareSet(u64);

impl SquareSet {
    pub const EMPTY: SquareSet = SquareSet(0);

    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn insert(&mut self, sq: Square) {
        self.0 |= square_bb(sq);
    }

    #[inline]
    pub const fn contains(self, sq: Square) -> bool {
        self.0 & square_bb(sq) != 0
    }

    #[inline]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Squares in ascending index order
    pub fn iter(self) -> SquareIter {
        SquareIter(self.0)
    }
}

impl BitOr for SquareSet {
    type Output = SquareSet;

    #[inline]
    fn bitor(self, rhs: SquareSet) -> SquareSet {
        SquareSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for SquareSet {
    #[inline]
    fn bitor_assign(&mut self, rhs: SquareSet) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<Square> for SquareSet {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        let mut set = SquareSet::EMPTY;
        for sq in iter {
            set.insert(sq);
        }
        set
    }
}

/// Iterator over the squares of a `SquareSet`
pub struct SquareIter(u64);

impl Iterator for SquareIter {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }
        Square::from_index(pop_lsb(&mut self.0))
    }
}

/// Render a set as an 8x8 grid, rank 8 at the top
pub fn format_square_set(set: SquareSet) -> String {
    let mut lines = Vec::with_capacity(8);
    for rank in (0..8u8).rev() {
        let row: String = (0..8u8)
            .map(|file| {
                let hit = set.bits() & file_bb(file) & rank_bb(rank) != 0;
                if hit { 'x' } else { '.' }
            })
            .collect();
        lines.push(format!("{} {}", rank + 1, row));
    }
    lines.push("  abcdefgh".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_iterate_in_order() {
        let squares: Vec<Square> = ["h8", "a1", "e4"].iter().map(|s| s.parse().unwrap()).collect();
        let set: SquareSet = squares.iter().copied().collect();
        assert_eq!(set.len(), 3);
        let names: Vec<String> = set.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, ["a1", "e4", "h8"]);
    }

    #[test]
    fn file_and_rank_masks() {
        assert_eq!(file_bb(7).count_ones(), 8);
        assert_eq!(rank_bb(7), 0xFF00000000000000);
        assert_eq!(file_bb(0) & rank_bb(0), 1);
    }

    #[test]
    fn formatted_grid_marks_members() {
        let set: SquareSet = ["a1".parse().unwrap()].into_iter().collect();
        let text = format_square_set(set);
        assert!(text.contains("1 x......."));
        assert!(text.starts_with("8 ........"));
    }
}
