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

//! Chess rules engine for standard chess
//!
//! A _board_ is the pure part of the crate: positions, legal moves and
//! the rules that decide when a game has ended. Nothing in here knows
//! about sessions, credentials or threads. The following features are
//! supported:
//!
//! [x] Standard chess rules, including castling, en passant and promotion
//! [x] Check, checkmate and stalemate detection
//! [x] Three-fold repetition, fifty-move rule and insufficient material
//! [x] FEN encoding and decoding
//! [x] Square-pair move notation (`e2e4`, `e7e8q`)
//! [ ] SAN / PGN
//! [ ] Chess960 back ranks
//!
//! Some of the key abstractions include:
//!
//! * A `Square` represents the coordinates for a single square
//!   on an 8-by-8 board. The 8 rows and 8 columns on a board
//!   are represented by `Rank` (`Rank1` .. `Rank8`) and `File`
//!   (`FileA` .. `FileH`) respectively. Squares are ordered rank by
//!   rank so that `A1` is index 0 and `H8` is index 63.
//!
//! * A `Mask` is a 64-bit (u64) value in which bit `n` stands for the
//!   square with index `n`. Masks can be combined or modified using
//!   bitwise `|`, `|=`, `&`, `&=`, `-` and `!` operators. The `iter()`
//!   method provides an efficient double-ended iterator.
//!
//! * A `Piece` is a `Kind` (`Pawn` .. `King`) of a specific `Color`.
//!   Pawn promotion uses the narrower `Promotion` type which converts
//!   into a `Kind` with `From<Promotion>`.
//!
//! * A `Position` holds one board state: the contents of each square,
//!   whose turn it is, castling rights, the en passant target and both
//!   move clocks. A position is never modified once built. `apply`
//!   returns the successor position, so a rejected move can never leave
//!   a half-updated board behind.
//!
//! * The `LegalMoves` trait generates the `MoveSet` for a position:
//!   pseudo-legal moves for each piece kind, filtered by playing each one
//!   out and dropping those that leave the mover's king attacked.
//!   `perft` counts move-tree leaves and is the yardstick for the
//!   generator.
//!

mod attacks;
mod castling;
mod material;
mod moves;
mod notation;
mod position;
mod square;

pub use attacks::*;
pub use castling::*;
pub use material::*;
pub use moves::*;
pub use notation::*;
pub use position::*;
pub use square::*;

pub trait Turn {
    fn turn(&self) -> Color;
}
