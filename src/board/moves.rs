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

use std::collections::HashMap;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use thiserror::Error;

use super::attacks::{attacks_from, is_attacked, king_in_check};
use super::castling::{Castle, Side};
use super::material::{Color, Kind, Piece};
use super::position::Position;
use super::square::{Mask, Offset, Rank, Square};

use Kind::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("Malformed move text {0:?}")]
    Malformed(String),
    #[error("Not a legal move: {0}")]
    Illegal(Move),
}

/// A request to move from one square to another. Carries no validity of
/// its own; castling is written as the king's two-square move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Promotion>,
}

impl Move {
    pub const fn new(from: Square, to: Square, promotion: Option<Promotion>) -> Self {
        Self {
            from,
            to,
            promotion,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Promotion {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl Promotion {
    pub const fn to_char(&self) -> char {
        match self {
            Promotion::Queen => 'q',
            Promotion::Rook => 'r',
            Promotion::Bishop => 'b',
            Promotion::Knight => 'n',
        }
    }

    pub fn try_from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'q' => Some(Promotion::Queen),
            'r' => Some(Promotion::Rook),
            'b' => Some(Promotion::Bishop),
            'n' => Some(Promotion::Knight),
            _ => None,
        }
    }
}

impl From<Promotion> for Kind {
    fn from(value: Promotion) -> Self {
        match value {
            Promotion::Queen => Queen,
            Promotion::Rook => Rook,
            Promotion::Bishop => Bishop,
            Promotion::Knight => Knight,
        }
    }
}

/// A move already known to be legal, tagged with the special handling
/// it needs when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegalMove {
    Standard(Square, Square),
    DoubleAdvance(Square, Square),
    EnPassant(Square, Square),
    Promoting(Square, Square, Promotion),
    Castling(Castle),
}

impl LegalMove {
    pub fn to_move(&self) -> Move {
        match *self {
            LegalMove::Standard(from, to)
            | LegalMove::DoubleAdvance(from, to)
            | LegalMove::EnPassant(from, to) => Move::new(from, to, None),
            LegalMove::Promoting(from, to, promotion) => Move::new(from, to, Some(promotion)),
            LegalMove::Castling(castle) => Move::new(castle.king_src(), castle.king_dest(), None),
        }
    }
}

/// The legal moves of one position, keyed by (from, to, promotion).
#[derive(Debug, Clone, Default)]
pub struct MoveSet {
    map: HashMap<Move, LegalMove>,
}

impl MoveSet {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, mv: LegalMove) {
        self.map.insert(mv.to_move(), mv);
    }
    pub fn contains(&self, mv: Move) -> bool {
        self.map.contains_key(&mv)
    }
    pub fn get(&self, mv: Move) -> Option<LegalMove> {
        self.map.get(&mv).copied()
    }
    pub fn len(&self) -> usize {
        self.map.len()
    }
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.map.keys().copied()
    }
    pub fn legal_moves(&self) -> impl Iterator<Item = LegalMove> + '_ {
        self.map.values().copied()
    }
    /// Every square the piece on `from` may move to.
    pub fn destinations(&self, from: Square) -> Mask {
        Mask::from_squares(self.iter().filter(|mv| mv.from == from).map(|mv| mv.to))
    }
}

impl FromIterator<LegalMove> for MoveSet {
    fn from_iter<I: IntoIterator<Item = LegalMove>>(iter: I) -> Self {
        let mut result = Self::new();
        for mv in iter {
            result.insert(mv);
        }
        result
    }
}

pub trait LegalMoves: AsRef<Position> {
    fn legal_moves(&self) -> MoveSet {
        let pos: &Position = self.as_ref();
        let us = pos.side_to_move();
        self.pseudo_legal_moves()
            .into_iter()
            .filter(|&mv| !king_in_check(&pos.apply_legal(mv), us))
            .collect()
    }

    fn validate_move(&self, mv: Move) -> Result<LegalMove, MoveError> {
        self.legal_moves().get(mv).ok_or(MoveError::Illegal(mv))
    }

    fn is_check(&self) -> bool {
        let pos: &Position = self.as_ref();
        king_in_check(pos, pos.side_to_move())
    }

    fn is_checkmate(&self) -> bool {
        self.is_check() && self.legal_moves().is_empty()
    }

    fn is_stalemate(&self) -> bool {
        !self.is_check() && self.legal_moves().is_empty()
    }

    /// Moves that obey piece movement but may leave the king attacked.
    fn pseudo_legal_moves(&self) -> Vec<LegalMove> {
        let pos: &Position = self.as_ref();
        let us = pos.side_to_move();
        let mut result = Vec::with_capacity(64);
        for kind in Kind::iter() {
            for from in pos.pieces(us, kind).iter() {
                match kind {
                    Pawn => self.pawn_moves(from, &mut result),
                    King => {
                        self.standard_moves(King, from, &mut result);
                        self.castle_moves(&mut result);
                    }
                    _ => self.standard_moves(kind, from, &mut result),
                }
            }
        }
        result
    }

    fn standard_moves(&self, kind: Kind, from: Square, result: &mut Vec<LegalMove>) {
        let pos: &Position = self.as_ref();
        let targets = attacks_from(kind, pos.side_to_move(), from, pos.occupied()) - pos.ours();
        result.extend(targets.iter().map(|to| LegalMove::Standard(from, to)));
    }

    fn pawn_moves(&self, from: Square, result: &mut Vec<LegalMove>) {
        let pos: &Position = self.as_ref();
        let us = pos.side_to_move();
        let step = Offset::new(0, us.forward());
        if let Some(single) = from + step {
            if pos[single].is_none() {
                push_pawn_move(us, from, single, result);
                if from.rank() == Rank::pawn_rank(us) {
                    if let Some(double) = single + step {
                        if pos[double].is_none() {
                            result.push(LegalMove::DoubleAdvance(from, double));
                        }
                    }
                }
            }
        }
        for to in attacks_from(Pawn, us, from, pos.occupied()).iter() {
            if pos.theirs().contains(to) {
                push_pawn_move(us, from, to, result);
            } else if pos.en_passant() == Some(to) {
                let victim = Square::new(to.file(), from.rank());
                if pos[victim] == Some(Piece::new(!us, Pawn)) {
                    result.push(LegalMove::EnPassant(from, to));
                }
            }
        }
    }

    fn castle_moves(&self, result: &mut Vec<LegalMove>) {
        let pos: &Position = self.as_ref();
        let us = pos.side_to_move();
        for side in Side::iter() {
            let castle = Castle::new(us, side);
            if pos.castling_rights().has(us, side)
                && pos[castle.king_src()] == Some(Piece::new(us, King))
                && pos[castle.rook_src()] == Some(Piece::new(us, Rook))
                && (castle.blocking_lane() & pos.occupied()).is_empty()
                && !is_attacked(pos, castle.king_src(), !us)
                && !castle
                    .attacking_lane()
                    .iter()
                    .any(|square| is_attacked(pos, square, !us))
            {
                result.push(LegalMove::Castling(castle));
            }
        }
    }
}

impl LegalMoves for Position {}

fn push_pawn_move(us: Color, from: Square, to: Square, result: &mut Vec<LegalMove>) {
    if to.rank() == Rank::promotion_rank(us) {
        result.extend(Promotion::iter().map(|p| LegalMove::Promoting(from, to, p)));
    } else {
        result.push(LegalMove::Standard(from, to));
    }
}

/// Every legal move for the side to move of `position`.
pub fn legal_moves(position: &Position) -> MoveSet {
    position.legal_moves()
}

/// Counts the leaf nodes of the legal move tree `depth` plies deep.
pub fn perft(position: &Position, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = position.legal_moves();
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .legal_moves()
        .map(|mv| perft(&position.apply_legal(mv), depth - 1))
        .sum()
}
