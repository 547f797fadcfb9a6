//! Square indices and legal-target square sets
//!
//! Squares follow the oracle's bitboard convention: index `rank * 8 + file`,
//! rank 0 being the first rank of the placement string (rank "8" in
//! algebraic notation), so `a8` is 0 and `h1` is 63.

use serde::{Deserialize, Serialize};
use std::fmt;

const FILE_NAMES: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

/// Board cell identifier in `0..64`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Square(u8);

impl Square {
    pub const COUNT: usize = 64;

    /// `None` when `index` is not in `0..64`
    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < Self::COUNT).then_some(Self(index))
    }

    /// Square at `file` (0 = a) and `rank` row (0 = top row of the placement)
    pub fn from_coords(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then(|| Self(rank * 8 + file))
    }

    /// Parse `e4`-style notation
    pub fn from_algebraic(text: &str) -> Option<Self> {
        let mut chars = text.chars();
        let file_char = chars.next()?;
        let rank_char = chars.next()?;
        if chars.next().is_some() {
            return None;
        }

        let file = FILE_NAMES
            .iter()
            .position(|&name| name == file_char.to_ascii_lowercase())?;
        let rank_digit = rank_char.to_digit(10)?;
        if !(1..=8).contains(&rank_digit) {
            return None;
        }

        Self::from_coords(file as u8, (8 - rank_digit) as u8)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn file(self) -> u8 {
        self.0 % 8
    }

    pub fn rank(self) -> u8 {
        self.0 / 8
    }

    pub fn to_algebraic(self) -> String {
        format!("{}{}", FILE_NAMES[usize::from(self.file())], 8 - self.rank())
    }

    /// All 64 squares in ascending index order
    pub fn all() -> impl Iterator<Item = Square> {
        (0..Self::COUNT as u8).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_algebraic())
    }
}

/// Immutable bit-per-square set, as returned by the oracle's target query
///
/// Bit `i` set means square `i` is a member. The mask is always interpreted
/// as unsigned 64-bit, so a host that hands over a signed value keeps its
/// sign bit (square 63).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SquareSet(u64);

impl SquareSet {
    pub const EMPTY: SquareSet = SquareSet(0);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Reinterpret a signed host mask bit-for-bit
    pub const fn from_signed(mask: i64) -> Self {
        Self(mask as u64)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, square: Square) -> bool {
        self.0 & (1u64 << square.index()) != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in ascending index order
    pub fn iter(self) -> SquareSetIter {
        SquareSetIter(self.0)
    }
}

impl IntoIterator for SquareSet {
    type Item = Square;
    type IntoIter = SquareSetIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Square> for SquareSet {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        Self(iter.into_iter().fold(0, |bits, sq| bits | (1u64 << sq.index())))
    }
}

/// Iterator over the members of a [`SquareSet`], lowest index first
#[derive(Debug, Clone)]
pub struct SquareSetIter(u64);

impl Iterator for SquareSetIter {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Some(Square(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for SquareSetIter {}

/// Decode a target mask into its squares, ascending
pub fn decode_square_set(mask: u64) -> Vec<Square> {
    SquareSet::from_bits(mask).iter().collect()
}
