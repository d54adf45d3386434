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

use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::{Color, Move};

mod play;

pub use play::*;

/// Opaque session identity: sixteen lowercase hex digits when random.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
    pub fn random() -> Self {
        let value: u64 = thread_rng().gen();
        Self(format!("{:016x}", value))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Checkmate { winner: Color },
    Stalemate,
    Drawn { reason: DrawReason },
}

impl GameStatus {
    /// Every status except `InProgress` is final.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    Repetition,
    FiftyMoves,
    Insufficient,
}

/// Which automatic draws a session enforces. Checkmate and stalemate are
/// always detected.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DrawRules {
    pub threefold_repetition: bool,
    pub fifty_moves: bool,
    pub insufficient_material: bool,
}

impl DrawRules {
    pub const NONE: Self = Self {
        threefold_repetition: false,
        fifty_moves: false,
        insufficient_material: false,
    };
    pub const ALL: Self = Self {
        threefold_repetition: true,
        fifty_moves: true,
        insufficient_material: true,
    };
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    #[error("Game is already over: {0:?}")]
    GameOver(GameStatus),
    #[error("It is {to_move}'s turn, not {claimed}'s")]
    WrongTurn { to_move: Color, claimed: Color },
    #[error("Not a legal move: {0}")]
    IllegalMove(Move),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_session_ids() {
        let a = SessionId::random();
        let b = SessionId::random();
        assert_ne!(a, b);
        assert_eq!(a.as_ref().len(), 16);
        assert!(a.as_ref().chars().all(|c| c.is_ascii_hexdigit()));
    }
    #[test]
    fn test_status_wire_shape() {
        let json = serde_json::to_value(GameStatus::Checkmate {
            winner: Color::Black,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "state": "checkmate", "winner": "black" })
        );
        let json = serde_json::to_value(GameStatus::Drawn {
            reason: DrawReason::FiftyMoves,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "state": "drawn", "reason": "fifty_moves" })
        );
        let json = serde_json::to_value(GameStatus::InProgress).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "in_progress" }));
    }
    #[test]
    fn test_draw_rules_default_off() {
        assert_eq!(DrawRules::default(), DrawRules::NONE);
        let rules: DrawRules = serde_json::from_str(r#"{"fifty_moves": true}"#).unwrap();
        assert!(rules.fifty_moves);
        assert!(!rules.threefold_repetition);
    }
    #[test]
    fn test_terminal() {
        assert!(!GameStatus::InProgress.is_terminal());
        assert!(GameStatus::Stalemate.is_terminal());
    }
}
