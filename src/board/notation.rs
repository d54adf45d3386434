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

//! Text encodings: square-pair moves (`e2e4`, `e7e8q`) and Forsyth-Edwards
//! Notation for whole positions.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use thiserror::Error;

use super::attacks::king_in_check;
use super::castling::CastlingRights;
use super::material::{Color, Kind, Piece};
use super::moves::{Move, MoveError, Promotion};
use super::position::Position;
use super::square::{File, Rank, Square};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("Expected 4 or 6 fields, found {0}")]
    FieldCount(usize),
    #[error("Bad piece placement {0:?}")]
    Placement(String),
    #[error("Bad side to move {0:?}")]
    SideToMove(String),
    #[error("Bad castling field {0:?}")]
    Castling(String),
    #[error("Bad en passant field {0:?}")]
    EnPassant(String),
    #[error("Bad move clock {0:?}")]
    Clock(String),
    #[error("Expected one {0} king, found {1}")]
    KingCount(Color, usize),
    #[error("The side not to move is in check")]
    OpponentInCheck,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.to_char())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = MoveError;

    /// Two algebraic squares and an optional promotion letter. Nothing
    /// else is accepted, including surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || MoveError::Malformed(s.to_string());
        let chars: Vec<char> = s.chars().collect();
        if !(4..=5).contains(&chars.len()) {
            return Err(malformed());
        }
        let from = Square::try_from_chars(chars[0], chars[1]).ok_or_else(malformed)?;
        let to = Square::try_from_chars(chars[2], chars[3]).ok_or_else(malformed)?;
        let promotion = match chars.get(4) {
            Some(&c) => Some(Promotion::try_from_char(c).ok_or_else(malformed)?),
            None => None,
        };
        Ok(Move::new(from, to, promotion))
    }
}

impl Serialize for Move {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Move {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Displays a position as a FEN record.
pub struct Fen<'a>(pub &'a Position);

impl fmt::Display for Fen<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let position = self.0;
        for rank in Rank::iter().rev() {
            let mut empty = 0;
            for file in File::iter() {
                match position[Square::new(file, rank)] {
                    Some(piece) => {
                        if empty > 0 {
                            write!(f, "{}", empty)?;
                            empty = 0;
                        }
                        write!(f, "{}", piece.to_char())?;
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                write!(f, "{}", empty)?;
            }
            if rank != Rank::Rank1 {
                write!(f, "/")?;
            }
        }
        let side = match position.side_to_move() {
            Color::White => 'w',
            Color::Black => 'b',
        };
        write!(f, " {} {} ", side, position.castling_rights())?;
        match position.en_passant() {
            Some(square) => write!(f, "{}", square)?,
            None => write!(f, "-")?,
        }
        write!(
            f,
            " {} {}",
            position.halfmove_clock(),
            position.fullmove_number()
        )
    }
}

impl Position {
    pub fn to_fen(&self) -> String {
        Fen(self).to_string()
    }

    pub fn from_fen(fen: &str) -> Result<Self> {
        fen.parse::<Position>()
            .with_context(|| format!("Cannot decode FEN {:?}", fen))
    }
}

impl FromStr for Position {
    type Err = FenError;

    /// Accepts the full six fields, or the first four with the clocks
    /// defaulting to `0 1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if fields.len() != 4 && fields.len() != 6 {
            return Err(FenError::FieldCount(fields.len()));
        }
        let pieces = parse_placement(fields[0])?;
        let turn = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };
        let castling = CastlingRights::try_from_fen(fields[2])
            .ok_or_else(|| FenError::Castling(fields[2].to_string()))?;
        let en_passant = parse_en_passant(fields[3], turn)?;
        let (halfmove_clock, fullmove_number) = match fields.len() {
            6 => (parse_clock(fields[4])?, parse_clock(fields[5])?),
            _ => (0, 1),
        };
        if fullmove_number == 0 {
            return Err(FenError::Clock(fields[5].to_string()));
        }

        for color in Color::iter() {
            let kings = pieces
                .iter()
                .filter(|(_, piece)| *piece == Piece::new(color, Kind::King))
                .count();
            if kings != 1 {
                return Err(FenError::KingCount(color, kings));
            }
        }
        let position = Position::from_parts(
            pieces,
            turn,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        );
        if let Some(target) = en_passant {
            // the pawn that just double-pushed stands in front of the target
            let pushed = match turn {
                Color::White => Rank::Rank5,
                Color::Black => Rank::Rank4,
            };
            let pawn = Piece::new(!turn, Kind::Pawn);
            if position[target].is_some()
                || position[Square::new(target.file(), pushed)] != Some(pawn)
            {
                return Err(FenError::EnPassant(fields[3].to_string()));
            }
        }
        if king_in_check(&position, !turn) {
            return Err(FenError::OpponentInCheck);
        }
        Ok(position)
    }
}

fn parse_placement(field: &str) -> Result<Vec<(Square, Piece)>, FenError> {
    let bad = || FenError::Placement(field.to_string());
    let rows: Vec<&str> = field.split('/').collect();
    if rows.len() != 8 {
        return Err(bad());
    }
    let mut pieces = Vec::with_capacity(32);
    for (row, text) in rows.into_iter().enumerate() {
        let rank = Rank::from_index(7 - row);
        let mut file = 0;
        for c in text.chars() {
            if let Some(skip) = c.to_digit(10) {
                if skip == 0 {
                    return Err(bad());
                }
                file += skip as usize;
            } else {
                let piece = Piece::try_from_char(c).ok_or_else(bad)?;
                if file >= 8 {
                    return Err(bad());
                }
                // pawns never stand on either back rank
                if piece.kind() == Kind::Pawn && (rank == Rank::Rank1 || rank == Rank::Rank8) {
                    return Err(bad());
                }
                pieces.push((Square::new(File::from_index(file), rank), piece));
                file += 1;
            }
            if file > 8 {
                return Err(bad());
            }
        }
        if file != 8 {
            return Err(bad());
        }
    }
    Ok(pieces)
}

fn parse_en_passant(field: &str, turn: Color) -> Result<Option<Square>, FenError> {
    if field == "-" {
        return Ok(None);
    }
    let square =
        Square::try_from_string(field).ok_or_else(|| FenError::EnPassant(field.to_string()))?;
    let expected = match turn {
        Color::White => Rank::Rank6,
        Color::Black => Rank::Rank3,
    };
    if square.rank() != expected {
        return Err(FenError::EnPassant(field.to_string()));
    }
    Ok(Some(square))
}

fn parse_clock(field: &str) -> Result<u16, FenError> {
    field
        .parse()
        .map_err(|_| FenError::Clock(field.to_string()))
}
