// Copyright 2023 Tobin Edwards
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
use std::ops::{Index, IndexMut};
use strum::IntoEnumIterator;

use super::attacks::{attacks_from, between};
use super::castling::{Castle, CastlingRights};
use super::material::{Color, Kind, Pair, Piece};
use super::moves::{LegalMove, Move};
use super::square::{File, Mask, Rank, Square};
use super::Turn;

use Color::*;
use Kind::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatingMaterial {
    Sufficient,
    TwoKnights,
    OneKnight,
    OneBishop,
    LoneKing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Squares([Option<Piece>; 64]);

impl Squares {
    fn empty() -> Self {
        Self([None; 64])
    }
}

impl Index<Square> for Squares {
    type Output = Option<Piece>;
    fn index(&self, index: Square) -> &Self::Output {
        &self.0[index.to_index()]
    }
}

impl IndexMut<Square> for Squares {
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        &mut self.0[index.to_index()]
    }
}

/// Occupancy by color and by kind, kept in sync with `Squares`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Masks {
    colors: Pair<Mask>,
    kinds: [Mask; 6],
}

impl Masks {
    fn empty() -> Self {
        Self {
            colors: Pair::new(Mask::empty(), Mask::empty()),
            kinds: [Mask::empty(); 6],
        }
    }
}

/// Everything that makes two positions the same for repetition purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PositionKey {
    turn: Color,
    en_passant: Option<Square>,
    castling: CastlingRights,
    masks: Masks,
}

/// One board state. A position is never changed after construction:
/// `apply` returns the successor and leaves `self` untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    squares: Squares,
    masks: Masks,
    turn: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    fullmove_number: u16,
}

impl Default for Position {
    fn default() -> Self {
        Self::initial()
    }
}

impl Serialize for Position {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.to_fen())
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let fen = String::deserialize(deserializer)?;
        Position::from_fen(&fen).map_err(serde::de::Error::custom)
    }
}

impl Position {
    /// The standard starting arrangement with White to move.
    pub fn initial() -> Self {
        const BACK_RANK: [Kind; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        let mut position = Self::empty();
        for file in File::iter() {
            let kind = BACK_RANK[file.to_index()];
            for color in Color::iter() {
                position.place(Square::new(file, Rank::pawn_rank(color)), Piece::new(color, Pawn));
                position.place(Square::new(file, Rank::back_rank(color)), Piece::new(color, kind));
            }
        }
        position.castling = CastlingRights::ALL;
        position
    }

    pub(crate) fn empty() -> Self {
        Self {
            squares: Squares::empty(),
            masks: Masks::empty(),
            turn: White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub(super) fn from_parts<I>(
        pieces: I,
        turn: Color,
        castling: CastlingRights,
        en_passant: Option<Square>,
        halfmove_clock: u16,
        fullmove_number: u16,
    ) -> Self
    where
        I: IntoIterator<Item = (Square, Piece)>,
    {
        let mut position = Self::empty();
        for (square, piece) in pieces {
            position.place(square, piece);
        }
        position.turn = turn;
        position.castling = castling;
        position.en_passant = en_passant;
        position.halfmove_clock = halfmove_clock;
        position.fullmove_number = fullmove_number;
        position
    }

    /// The en passant target only counts when a pawn could take there.
    pub fn key(&self) -> PositionKey {
        let en_passant = self.en_passant.filter(|&target| {
            let takers = attacks_from(Pawn, !self.turn, target, self.occupied());
            !(takers & self.pieces(self.turn, Pawn)).is_empty()
        });
        PositionKey {
            turn: self.turn,
            en_passant,
            castling: self.castling,
            masks: self.masks,
        }
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square]
    }
    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.turn
    }
    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }
    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }
    #[inline]
    pub fn halfmove_clock(&self) -> usize {
        self.halfmove_clock as usize
    }
    #[inline]
    pub fn fullmove_number(&self) -> usize {
        self.fullmove_number as usize
    }
    #[inline]
    pub fn occupied(&self) -> Mask {
        *self.masks.colors.white() | *self.masks.colors.black()
    }
    #[inline]
    pub fn occupied_by(&self, color: Color) -> Mask {
        self.masks.colors[color]
    }
    #[inline]
    pub fn pieces(&self, color: Color, kind: Kind) -> Mask {
        self.masks.colors[color] & self.masks.kinds[kind.to_index()]
    }
    #[inline]
    pub fn ours(&self) -> Mask {
        self.occupied_by(self.turn)
    }
    #[inline]
    pub fn theirs(&self) -> Mask {
        self.occupied_by(!self.turn)
    }
    #[inline]
    pub fn king(&self, color: Color) -> Option<Square> {
        self.pieces(color, King).first()
    }

    pub fn mating_material(&self, side: Color) -> MatingMaterial {
        let pieces = self.occupied_by(side) - self.pieces(side, King);
        let heavy = self.pieces(side, Pawn) | self.pieces(side, Rook) | self.pieces(side, Queen);
        if !heavy.is_empty() || pieces.len() > 2 {
            return MatingMaterial::Sufficient;
        }
        let knights = self.pieces(side, Knight);
        match (pieces.len(), pieces == knights) {
            (2, true) => MatingMaterial::TwoKnights,
            (2, false) => MatingMaterial::Sufficient,
            (1, true) => MatingMaterial::OneKnight,
            (1, false) => MatingMaterial::OneBishop,
            _ => MatingMaterial::LoneKing,
        }
    }

    /// Neither side can possibly deliver mate.
    pub fn is_insufficient(&self) -> bool {
        use MatingMaterial::*;
        match (self.mating_material(White), self.mating_material(Black)) {
            (Sufficient, _) | (_, Sufficient) => false,
            (TwoKnights, _) | (_, TwoKnights) => false,
            (LoneKing, _) | (_, LoneKing) => true,
            _ => true,
        }
    }

    /// Works out what kind of move `mv` is in this position.
    pub fn classify(&self, mv: Move) -> LegalMove {
        let Move {
            from,
            to,
            promotion,
        } = mv;
        if let Some(promotion) = promotion {
            return LegalMove::Promoting(from, to, promotion);
        }
        match self.squares[from] {
            Some(piece) if piece.kind() == King => {
                match Castle::from_king_move(piece.color(), from, to) {
                    Some(castle) => LegalMove::Castling(castle),
                    None => LegalMove::Standard(from, to),
                }
            }
            Some(piece) if piece.kind() == Pawn => {
                if (to.rank() - from.rank()).abs() == 2 {
                    LegalMove::DoubleAdvance(from, to)
                } else if Some(to) == self.en_passant
                    && from.file() != to.file()
                    && self.squares[to].is_none()
                {
                    LegalMove::EnPassant(from, to)
                } else {
                    LegalMove::Standard(from, to)
                }
            }
            _ => LegalMove::Standard(from, to),
        }
    }

    /// Returns the position after `mv`. The move must be legal here; it is
    /// not validated again.
    pub fn apply(&self, mv: Move) -> Position {
        self.apply_legal(self.classify(mv))
    }

    pub fn apply_legal(&self, mv: LegalMove) -> Position {
        let us = self.turn;
        let mut next = self.clone();
        next.halfmove_clock = next.halfmove_clock.saturating_add(1);
        next.en_passant = None;
        match mv {
            LegalMove::Standard(from, to) => {
                debug_assert!(self.squares[from].is_some());
                if let Some(piece) = next.remove(from) {
                    let captured = next.place(to, piece);
                    if captured.is_some() || piece.kind() == Pawn {
                        next.halfmove_clock = 0;
                    }
                }
                next.castling.update(from);
                next.castling.update(to);
            }
            LegalMove::DoubleAdvance(from, to) => {
                if let Some(piece) = next.remove(from) {
                    next.place(to, piece);
                }
                next.en_passant = between(from, to).first();
                next.halfmove_clock = 0;
            }
            LegalMove::EnPassant(from, to) => {
                if let Some(piece) = next.remove(from) {
                    next.place(to, piece);
                }
                // the captured pawn sits beside the origin, not on `to`
                next.remove(Square::new(to.file(), from.rank()));
                next.halfmove_clock = 0;
            }
            LegalMove::Promoting(from, to, promotion) => {
                next.remove(from);
                next.place(to, Piece::new(us, promotion.into()));
                next.castling.update(from);
                next.castling.update(to);
                next.halfmove_clock = 0;
            }
            LegalMove::Castling(castle) => {
                if let Some(king) = next.remove(castle.king_src()) {
                    next.place(castle.king_dest(), king);
                }
                if let Some(rook) = next.remove(castle.rook_src()) {
                    next.place(castle.rook_dest(), rook);
                }
                next.castling.revoke_all(us);
            }
        };
        if us == Black {
            next.fullmove_number = next.fullmove_number.saturating_add(1);
        }
        next.turn = !us;
        next
    }

    fn place(&mut self, square: Square, piece: Piece) -> Option<Piece> {
        let replaced = self.remove(square);
        self.squares[square] = Some(piece);
        self.masks.colors[piece.color()] |= square;
        self.masks.kinds[piece.kind().to_index()] |= square;
        replaced
    }

    fn remove(&mut self, square: Square) -> Option<Piece> {
        let piece = self.squares[square].take()?;
        self.masks.colors[piece.color()].reset(square);
        self.masks.kinds[piece.kind().to_index()].reset(square);
        Some(piece)
    }
}

/// The standard starting position.
pub fn initial_position() -> Position {
    Position::initial()
}

/// The position after the legal move `mv`; see [`Position::apply`].
pub fn apply(position: &Position, mv: Move) -> Position {
    position.apply(mv)
}

impl Turn for Position {
    #[inline]
    fn turn(&self) -> Color {
        self.turn
    }
}

impl Index<Square> for Position {
    type Output = Option<Piece>;
    #[inline]
    fn index(&self, index: Square) -> &Self::Output {
        &self.squares[index]
    }
}

impl AsRef<Self> for Position {
    fn as_ref(&self) -> &Self {
        self
    }
}

#[cfg(test)]
impl Position {
    pub fn with_piece(mut self, square: Square, piece: Piece) -> Self {
        self.place(square, piece);
        self
    }
    pub fn without(mut self, square: Square) -> Self {
        self.remove(square);
        self
    }
    pub fn with_turn(mut self, turn: Color) -> Self {
        self.turn = turn;
        self
    }
    pub fn with_en_passant(mut self, value: Option<Square>) -> Self {
        self.en_passant = value;
        self
    }
    pub fn with_castling(mut self, value: CastlingRights) -> Self {
        self.castling = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::castling::Side;
    use crate::board::moves::Promotion;
    use Square::*;

    #[test]
    fn test_initial_layout() {
        let position = Position::initial();
        assert_eq!(position[E1], Some(Piece::WK));
        assert_eq!(position[D8], Some(Piece::BQ));
        assert_eq!(position[B1], Some(Piece::WN));
        assert_eq!(position[H7], Some(Piece::BP));
        assert_eq!(position[E4], None);
        assert_eq!(position.occupied().len(), 32);
        assert_eq!(position.side_to_move(), White);
        assert_eq!(position.castling_rights(), CastlingRights::ALL);
        assert_eq!(position.en_passant(), None);
        assert_eq!(position.halfmove_clock(), 0);
        assert_eq!(position.fullmove_number(), 1);
        assert_eq!(position.king(White), Some(E1));
        assert_eq!(position.king(Black), Some(E8));
    }
    #[test]
    fn test_apply_leaves_input_untouched() {
        let position = initial_position();
        let next = apply(&position, Move::new(E2, E4, None));
        assert_eq!(position, Position::initial());
        assert_eq!(next[E4], Some(Piece::WP));
        assert_eq!(next[E2], None);
        assert_eq!(next.side_to_move(), Black);
    }
    #[test]
    fn test_double_advance_sets_en_passant() {
        let next = Position::initial().apply(Move::new(E2, E4, None));
        assert_eq!(next.en_passant(), Some(E3));
        let next = next.apply(Move::new(G8, F6, None));
        assert_eq!(next.en_passant(), None);
        let next = next.apply(Move::new(E4, E5, None));
        assert_eq!(next.en_passant(), None);
    }
    #[test]
    fn test_en_passant_removes_captured_pawn() {
        let position = Position::initial()
            .with_piece(E5, Piece::WP)
            .without(E2)
            .with_piece(D5, Piece::BP)
            .without(D7)
            .with_en_passant(Some(D6));
        let next = position.apply(Move::new(E5, D6, None));
        assert_eq!(next[D6], Some(Piece::WP));
        assert_eq!(next[D5], None);
        assert_eq!(next[E5], None);
        assert_eq!(next.halfmove_clock(), 0);
    }
    #[test]
    fn test_castling_moves_rook() {
        let position = Position::initial().without(F1).without(G1);
        let next = position.apply(Move::new(E1, G1, None));
        assert_eq!(next[G1], Some(Piece::WK));
        assert_eq!(next[F1], Some(Piece::WR));
        assert_eq!(next[E1], None);
        assert_eq!(next[H1], None);
        assert!(!next.castling_rights().has(White, Side::Kingside));
        assert!(!next.castling_rights().has(White, Side::Queenside));
        assert!(next.castling_rights().has(Black, Side::Kingside));
    }
    #[test]
    fn test_long_castling_moves_rook() {
        let position = Position::initial()
            .without(B8)
            .without(C8)
            .without(D8)
            .with_turn(Black);
        let next = position.apply(Move::new(E8, C8, None));
        assert_eq!(next[C8], Some(Piece::BK));
        assert_eq!(next[D8], Some(Piece::BR));
        assert_eq!(next[A8], None);
        assert!(!next.castling_rights().has(Black, Side::Queenside));
        assert!(next.castling_rights().has(White, Side::Queenside));
    }
    #[test]
    fn test_rook_capture_revokes_rights() {
        let position = Position::empty()
            .with_piece(E1, Piece::WK)
            .with_piece(H1, Piece::WR)
            .with_piece(E8, Piece::BK)
            .with_piece(H8, Piece::BR)
            .with_castling(CastlingRights::ALL);
        let next = position.apply(Move::new(H1, H8, None));
        assert!(!next.castling_rights().has(White, Side::Kingside));
        assert!(!next.castling_rights().has(Black, Side::Kingside));
        assert!(next.castling_rights().has(White, Side::Queenside));
    }
    #[test]
    fn test_promotion_replaces_pawn() {
        let position = Position::empty()
            .with_piece(E1, Piece::WK)
            .with_piece(H8, Piece::BK)
            .with_piece(B7, Piece::WP)
            .with_piece(A8, Piece::BR);
        let next = position.apply(Move::new(B7, A8, Some(Promotion::Knight)));
        assert_eq!(next[A8], Some(Piece::WN));
        assert_eq!(next[B7], None);
        assert_eq!(next.occupied_by(Black).len(), 1);
    }
    #[test]
    fn test_clocks() {
        let position = Position::initial();
        let next = position
            .apply(Move::new(G1, F3, None))
            .apply(Move::new(G8, F6, None));
        assert_eq!(next.halfmove_clock(), 2);
        assert_eq!(next.fullmove_number(), 2);
        let next = next.apply(Move::new(E2, E4, None));
        assert_eq!(next.halfmove_clock(), 0);
        assert_eq!(next.fullmove_number(), 2);
    }
    #[test]
    fn test_classify() {
        let position = Position::initial().with_en_passant(Some(D6));
        assert_eq!(
            position.classify(Move::new(E2, E4, None)),
            LegalMove::DoubleAdvance(E2, E4)
        );
        assert_eq!(
            position.classify(Move::new(E1, G1, None)),
            LegalMove::Castling(Castle::new(White, Side::Kingside))
        );
        assert_eq!(
            position.classify(Move::new(G1, F3, None)),
            LegalMove::Standard(G1, F3)
        );
        let position = position.with_piece(E5, Piece::WP);
        assert_eq!(
            position.classify(Move::new(E5, D6, None)),
            LegalMove::EnPassant(E5, D6)
        );
    }
    #[test]
    fn test_mating_material() {
        let kings = Position::empty()
            .with_piece(E1, Piece::WK)
            .with_piece(E8, Piece::BK);
        assert!(kings.is_insufficient());
        assert_eq!(kings.mating_material(White), MatingMaterial::LoneKing);
        let knight = kings.clone().with_piece(B1, Piece::WN);
        assert!(knight.is_insufficient());
        let two_knights = knight.clone().with_piece(G1, Piece::WN);
        assert_eq!(two_knights.mating_material(White), MatingMaterial::TwoKnights);
        assert_eq!(two_knights.mating_material(Black), MatingMaterial::LoneKing);
        assert!(!two_knights.is_insufficient());
        let knight_each = knight.clone().with_piece(B8, Piece::BN);
        assert!(knight_each.is_insufficient());
        let rook = kings.with_piece(A8, Piece::BR);
        assert!(!rook.is_insufficient());
        assert!(!Position::initial().is_insufficient());
    }
    #[test]
    fn test_key_ignores_clocks() {
        let a = Position::initial()
            .apply(Move::new(G1, F3, None))
            .apply(Move::new(G8, F6, None))
            .apply(Move::new(F3, G1, None))
            .apply(Move::new(F6, G8, None));
        assert_eq!(a.key(), Position::initial().key());
        assert_ne!(a, Position::initial());
    }
    #[test]
    fn test_key_ignores_uncapturable_en_passant() {
        let pushed = Position::initial().apply(Move::new(E2, E4, None));
        assert_eq!(pushed.en_passant(), Some(E3));
        assert_eq!(pushed.key(), pushed.clone().with_en_passant(None).key());

        let capturable = Position::initial()
            .without(E2)
            .with_piece(E4, Piece::WP)
            .without(D7)
            .with_piece(D4, Piece::BP)
            .with_turn(Black);
        let with_target = capturable.clone().with_en_passant(Some(E3));
        assert_ne!(with_target.key(), capturable.key());
    }
}
