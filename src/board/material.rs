// Copyright 2026 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut, Not};
use strum_macros::Display;
use strum_macros::EnumIter;

/// A piece of a specific color standing on the board.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    color: Color,
    kind: Kind,
}

impl Piece {
    pub const WK: Self = Self::new(White, King);
    pub const WQ: Self = Self::new(White, Queen);
    pub const WR: Self = Self::new(White, Rook);
    pub const WB: Self = Self::new(White, Bishop);
    pub const WN: Self = Self::new(White, Knight);
    pub const WP: Self = Self::new(White, Pawn);

    pub const BK: Self = Self::new(Black, King);
    pub const BQ: Self = Self::new(Black, Queen);
    pub const BR: Self = Self::new(Black, Rook);
    pub const BB: Self = Self::new(Black, Bishop);
    pub const BN: Self = Self::new(Black, Knight);
    pub const BP: Self = Self::new(Black, Pawn);

    #[inline]
    pub const fn new(color: Color, kind: Kind) -> Self {
        Self { color, kind }
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Forsyth-Edwards letter: uppercase for White, lowercase for Black.
    pub fn to_char(&self) -> char {
        let c = self.kind.to_char();
        match self.color {
            White => c.to_ascii_uppercase(),
            Black => c,
        }
    }

    pub fn try_from_char(c: char) -> Option<Self> {
        let kind = Kind::try_from_char(c.to_ascii_lowercase())?;
        let color = if c.is_ascii_uppercase() { White } else { Black };
        Some(Self::new(color, kind))
    }
}

use Color::{Black, White};

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const fn to_index(&self) -> usize {
        *self as usize
    }

    /// Rank direction in which this color's pawns advance.
    #[inline]
    pub const fn forward(&self) -> isize {
        match self {
            White => 1,
            Black => -1,
        }
    }
}

impl Not for Color {
    type Output = Self;

    #[inline]
    fn not(self) -> Self {
        match self {
            White => Black,
            Black => White,
        }
    }
}

/// A value held once per color.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pair<T>((T, T));

impl<T> Pair<T> {
    pub const fn new(white: T, black: T) -> Self {
        Self((white, black))
    }
    pub fn white(&self) -> &T {
        &self.0 .0
    }
    pub fn white_mut(&mut self) -> &mut T {
        &mut self.0 .0
    }
    pub fn black(&self) -> &T {
        &self.0 .1
    }
    pub fn black_mut(&mut self) -> &mut T {
        &mut self.0 .1
    }
}

impl<T> Index<Color> for Pair<T> {
    type Output = T;

    #[inline(always)]
    fn index(&self, index: Color) -> &Self::Output {
        match index {
            White => self.white(),
            Black => self.black(),
        }
    }
}

impl<T> IndexMut<Color> for Pair<T> {
    #[inline(always)]
    fn index_mut(&mut self, index: Color) -> &mut Self::Output {
        match index {
            White => self.white_mut(),
            Black => self.black_mut(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Kind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}
use Kind::{Bishop, King, Knight, Pawn, Queen, Rook};

impl Kind {
    pub const fn from_index(index: usize) -> Self {
        debug_assert!(index < 6);
        const KIND_MAP: [Kind; 6] = [Pawn, Knight, Bishop, Rook, Queen, King];
        KIND_MAP[index]
    }

    pub const fn to_index(&self) -> usize {
        *self as usize
    }

    pub const fn to_char(&self) -> char {
        match self {
            Pawn => 'p',
            Knight => 'n',
            Bishop => 'b',
            Rook => 'r',
            Queen => 'q',
            King => 'k',
        }
    }

    pub const fn try_from_char(c: char) -> Option<Self> {
        match c {
            'p' => Some(Pawn),
            'n' => Some(Knight),
            'b' => Some(Bishop),
            'r' => Some(Rook),
            'q' => Some(Queen),
            'k' => Some(King),
            _ => None,
        }
    }

    pub fn is_slider(&self) -> bool {
        matches!(*self, Bishop | Rook | Queen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_color() {
        assert_eq!(!White, Black);
        assert_eq!(!Black, White);
    }
    #[test]
    fn test_piece_letters() {
        assert_eq!(Piece::WK.to_char(), 'K');
        assert_eq!(Piece::BN.to_char(), 'n');
        assert_eq!(Piece::try_from_char('Q'), Some(Piece::WQ));
        assert_eq!(Piece::try_from_char('p'), Some(Piece::BP));
        assert_eq!(Piece::try_from_char('x'), None);
    }
    #[test]
    fn test_pair_indexing() {
        let mut pair = Pair::new(1, 2);
        assert_eq!(pair[White], 1);
        pair[Black] += 5;
        assert_eq!(*pair.black(), 7);
    }
    #[test]
    fn test_color_display() {
        assert_eq!(White.to_string(), "white");
        assert_eq!(Black.to_string(), "black");
    }
}
