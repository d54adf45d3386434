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

//! Attack detection.
//!
//! Everything here is pseudo-legal: a piece attacks a square even if moving
//! there would expose its own king. Pawns attack diagonally forward only,
//! never their push squares.

use once_cell::sync::Lazy;
use strum::IntoEnumIterator;

use super::material::{Color, Kind, Pair};
use super::position::Position;
use super::square::{Direction, Mask, Offset, Square};

use Kind::*;

/// True iff any piece of `by` attacks `square`.
#[inline]
pub fn is_attacked(position: &Position, square: Square, by: Color) -> bool {
    !attackers(position, square, by).is_empty()
}

/// True iff `color`'s king is attacked. A side without a king is never
/// in check.
pub fn king_in_check(position: &Position, color: Color) -> bool {
    match position.king(color) {
        Some(king) => is_attacked(position, king, !color),
        None => false,
    }
}

/// Squares holding pieces of `by` that attack `square`.
pub fn attackers(position: &Position, square: Square, by: Color) -> Mask {
    let occupied = position.occupied();
    let mut result = KNIGHT_ATTACKS[square] & position.pieces(by, Knight);
    result |= KING_ATTACKS[square] & position.pieces(by, King);
    // a pawn of `by` attacks `square` iff a pawn of the other color standing
    // on `square` would attack the pawn's own square
    result |= PAWN_ATTACKS[!by][square] & position.pieces(by, Pawn);

    let queens = position.pieces(by, Queen);
    let horizontals = ROOK_RAYS[square] & (position.pieces(by, Rook) | queens);
    let diagonals = BISHOP_RAYS[square] & (position.pieces(by, Bishop) | queens);
    for from in (horizontals | diagonals).iter() {
        if (between(from, square) & occupied).is_empty() {
            result |= from;
        }
    }
    result
}

/// Squares a piece of `kind` and `color` standing on `from` attacks, given
/// the board occupancy. Own pieces are included; callers mask them out.
pub fn attacks_from(kind: Kind, color: Color, from: Square, occupied: Mask) -> Mask {
    match kind {
        Pawn => PAWN_ATTACKS[color][from],
        Knight => KNIGHT_ATTACKS[from],
        Bishop => slide(from, Direction::diagonals(), occupied),
        Rook => slide(from, Direction::horizontals(), occupied),
        Queen => slide(from, Direction::iter(), occupied),
        King => KING_ATTACKS[from],
    }
}

fn slide<I>(from: Square, directions: I, occupied: Mask) -> Mask
where
    I: Iterator<Item = Direction>,
{
    let mut mask = Mask::empty();
    for dir in directions {
        let mut next = from + dir;
        while let Some(square) = next {
            mask |= square;
            if occupied.contains(square) {
                break;
            }
            next = square + dir;
        }
    }
    mask
}

/// Squares strictly between `from` and `to` when they share a line,
/// otherwise the empty mask.
#[inline]
pub fn between(from: Square, to: Square) -> Mask {
    SQUARES_BETWEEN[from.to_index() * 64 + to.to_index()]
}

static SQUARES_BETWEEN: Lazy<Vec<Mask>> = Lazy::new(|| {
    fn squares_between(start: Square, end: Square) -> Mask {
        let mut mask = Mask::empty();
        if let Some(step) = (end - start).to_unit() {
            let mut next = start + step;
            while let Some(square) = next {
                if square == end {
                    break;
                }
                mask |= square;
                next = square + step;
            }
        }
        mask
    }

    let mut table = vec![Mask::empty(); 64 * 64];
    for start in Square::iter() {
        for end in Square::iter() {
            table[start.to_index() * 64 + end.to_index()] = squares_between(start, end);
        }
    }
    table
});

static ROOK_RAYS: Lazy<[Mask; 64]> = Lazy::new(|| {
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square] = slide(square, Direction::horizontals(), Mask::empty());
    }
    array
});

static BISHOP_RAYS: Lazy<[Mask; 64]> = Lazy::new(|| {
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square] = slide(square, Direction::diagonals(), Mask::empty());
    }
    array
});

static KING_ATTACKS: Lazy<[Mask; 64]> = Lazy::new(|| {
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square] = Mask::from_squares(Direction::iter().filter_map(|dir| square + dir));
    }
    array
});

static KNIGHT_ATTACKS: Lazy<[Mask; 64]> = Lazy::new(|| {
    const OFFSETS: [Offset; 8] = [
        Offset::new(-2, -1),
        Offset::new(-2, 1),
        Offset::new(2, -1),
        Offset::new(2, 1),
        Offset::new(-1, -2),
        Offset::new(-1, 2),
        Offset::new(1, -2),
        Offset::new(1, 2),
    ];
    let mut array = [Mask::default(); 64];
    for square in Square::iter() {
        array[square] =
            Mask::from_squares(OFFSETS.into_iter().filter_map(|offset| square + offset));
    }
    array
});

static PAWN_ATTACKS: Lazy<Pair<[Mask; 64]>> = Lazy::new(|| {
    fn table(color: Color) -> [Mask; 64] {
        let forward = color.forward();
        let offsets = [Offset::new(-1, forward), Offset::new(1, forward)];
        let mut array = [Mask::default(); 64];
        for square in Square::iter() {
            array[square] =
                Mask::from_squares(offsets.into_iter().filter_map(|offset| square + offset));
        }
        array
    }
    Pair::new(table(Color::White), table(Color::Black))
});
