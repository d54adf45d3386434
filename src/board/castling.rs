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
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use super::attacks::between;
use super::material::Color;
use super::square::{File, Mask, Rank, Square};

use File::*;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Side {
    Kingside,
    Queenside,
}

/// One of the four castling moves, identified by color and side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Castle {
    color: Color,
    side: Side,
}

impl Castle {
    #[inline]
    pub const fn new(color: Color, side: Side) -> Self {
        Self { color, side }
    }
    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }
    #[inline]
    fn rank(&self) -> Rank {
        Rank::back_rank(self.color)
    }
    #[inline]
    pub fn king_src(&self) -> Square {
        Square::new(FileE, self.rank())
    }
    #[inline]
    pub fn king_dest(&self) -> Square {
        match self.side {
            Side::Kingside => Square::new(FileG, self.rank()),
            Side::Queenside => Square::new(FileC, self.rank()),
        }
    }
    #[inline]
    pub fn rook_src(&self) -> Square {
        match self.side {
            Side::Kingside => Square::new(FileH, self.rank()),
            Side::Queenside => Square::new(FileA, self.rank()),
        }
    }
    #[inline]
    pub fn rook_dest(&self) -> Square {
        match self.side {
            Side::Kingside => Square::new(FileF, self.rank()),
            Side::Queenside => Square::new(FileD, self.rank()),
        }
    }
    /// Squares that must be empty: everything between king and rook.
    pub fn blocking_lane(&self) -> Mask {
        between(self.king_src(), self.rook_src())
    }
    /// Squares the king crosses or lands on; none may be attacked.
    pub fn attacking_lane(&self) -> Mask {
        between(self.king_src(), self.king_dest()) | self.king_dest()
    }

    /// Recognizes a king's two-square move from its home square.
    pub fn from_king_move(color: Color, from: Square, to: Square) -> Option<Self> {
        Side::iter()
            .map(|side| Self::new(color, side))
            .find(|castle| castle.king_src() == from && castle.king_dest() == to)
    }
}

/// The set of castling moves still available to each side.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b1111);

    #[inline]
    const fn bit(color: Color, side: Side) -> u8 {
        1 << (color.to_index() * 2 + side as usize)
    }
    #[inline]
    pub fn has(&self, color: Color, side: Side) -> bool {
        self.0 & Self::bit(color, side) != 0
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
    pub fn grant(&mut self, color: Color, side: Side) {
        self.0 |= Self::bit(color, side);
    }
    pub fn revoke(&mut self, color: Color, side: Side) {
        self.0 &= !Self::bit(color, side);
    }
    pub fn revoke_all(&mut self, color: Color) {
        for side in Side::iter() {
            self.revoke(color, side);
        }
    }

    /// Revokes every right that depends on the piece standing on `square`.
    /// Called for both the origin and the destination of each move, so a
    /// king or rook leaving home and a rook captured at home are covered.
    pub fn update(&mut self, square: Square) {
        for color in Color::iter() {
            for side in Side::iter() {
                let castle = Castle::new(color, side);
                if square == castle.king_src() || square == castle.rook_src() {
                    self.revoke(color, side);
                }
            }
        }
    }

    pub fn try_from_fen(field: &str) -> Option<Self> {
        let mut rights = Self::NONE;
        if field == "-" {
            return Some(rights);
        }
        for c in field.chars() {
            let (color, side) = match c {
                'K' => (Color::White, Side::Kingside),
                'Q' => (Color::White, Side::Queenside),
                'k' => (Color::Black, Side::Kingside),
                'q' => (Color::Black, Side::Queenside),
                _ => return None,
            };
            rights.grant(color, side);
        }
        (!rights.is_empty()).then_some(rights)
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        const LETTERS: [(Color, Side, char); 4] = [
            (Color::White, Side::Kingside, 'K'),
            (Color::White, Side::Queenside, 'Q'),
            (Color::Black, Side::Kingside, 'k'),
            (Color::Black, Side::Queenside, 'q'),
        ];
        for (color, side, letter) in LETTERS {
            if self.has(color, side) {
                write!(f, "{}", letter)?;
            }
        }
        Ok(())
    }
}
