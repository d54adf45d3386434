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

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{DrawReason, DrawRules, GameStatus, PlayError, SessionId};
use crate::board::{Color, LegalMoves, Move, Position, PositionKey, Turn};

/// One game between two players: the current position plus everything
/// needed to decide whether the game is over.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: SessionId,
    created_at: DateTime<Utc>,
    position: Position,
    status: GameStatus,
    history: Vec<Move>,
    repetitions: HashMap<PositionKey, u8>,
    draw_rules: DrawRules,
}

impl GameSession {
    pub fn new(id: SessionId, draw_rules: DrawRules) -> Self {
        Self::from_position(id, Position::initial(), draw_rules)
    }

    /// Starts a session from an arbitrary position. The status is
    /// classified straight away, so a mated or stalemated start is
    /// already terminal.
    pub fn from_position(id: SessionId, position: Position, draw_rules: DrawRules) -> Self {
        let mut session = Self {
            id,
            created_at: Utc::now(),
            position,
            status: GameStatus::InProgress,
            history: Vec::new(),
            repetitions: HashMap::new(),
            draw_rules,
        };
        session.update_status();
        session
    }

    /// Plays `moves` (square-pair notation) from the initial position.
    pub fn replay<I, S>(id: SessionId, draw_rules: DrawRules, moves: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut session = Self::new(id, draw_rules);
        for (ply, text) in moves.into_iter().enumerate() {
            let text = text.as_ref();
            let mv: Move = text
                .parse()
                .with_context(|| format!("Move {} ({:?}) is malformed", ply + 1, text))?;
            let side = session.side_to_move();
            session
                .submit_move(mv, side)
                .with_context(|| format!("Move {} ({}) was rejected", ply + 1, mv))?;
        }
        Ok(session)
    }

    #[inline]
    pub fn id(&self) -> &SessionId {
        &self.id
    }
    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }
    #[inline]
    pub fn status(&self) -> GameStatus {
        self.status
    }
    #[inline]
    pub fn history(&self) -> &[Move] {
        &self.history
    }
    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    /// Validates `mv` for the player claiming `claimed` and, if it is
    /// accepted, applies it and returns the new status. A rejected move
    /// leaves the session exactly as it was.
    pub fn submit_move(&mut self, mv: Move, claimed: Color) -> Result<GameStatus, PlayError> {
        if self.status.is_terminal() {
            return Err(PlayError::GameOver(self.status));
        }
        let to_move = self.side_to_move();
        if claimed != to_move {
            return Err(PlayError::WrongTurn { to_move, claimed });
        }
        let legal = self
            .position
            .legal_moves()
            .get(mv)
            .ok_or(PlayError::IllegalMove(mv))?;

        self.position = self.position.apply_legal(legal);
        self.history.push(mv);
        self.update_status();
        debug!(session_id = %self.id, mv = %mv, status = ?self.status, "move accepted");
        if self.status.is_terminal() {
            info!(session_id = %self.id, status = ?self.status, plies = self.history.len(), "game over");
        }
        Ok(self.status)
    }

    fn update_status(&mut self) {
        use GameStatus::*;
        let repetitions = self.update_repetitions();
        let rules = self.draw_rules;
        let pos = &self.position;
        self.status = if pos.legal_moves().is_empty() {
            if pos.is_check() {
                Checkmate {
                    winner: !pos.turn(),
                }
            } else {
                Stalemate
            }
        } else if rules.threefold_repetition && repetitions >= 3 {
            Drawn {
                reason: DrawReason::Repetition,
            }
        } else if rules.fifty_moves && pos.halfmove_clock() >= 100 {
            Drawn {
                reason: DrawReason::FiftyMoves,
            }
        } else if rules.insufficient_material && pos.is_insufficient() {
            Drawn {
                reason: DrawReason::Insufficient,
            }
        } else {
            InProgress
        }
    }

    fn update_repetitions(&mut self) -> u8 {
        if self.position.halfmove_clock() == 0 {
            // a pawn move or capture can never be undone, so no earlier
            // position can occur again
            self.repetitions.clear();
        }
        let count = self.repetitions.entry(self.position.key()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Piece, Square};
    use Color::*;
    use Square::*;

    fn session() -> GameSession {
        GameSession::new(SessionId::new("test"), DrawRules::NONE)
    }
    fn mv(text: &str) -> Move {
        text.parse().unwrap()
    }

    #[test]
    fn test_new_session() {
        let session = session();
        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.side_to_move(), White);
        assert_eq!(session.position(), &Position::initial());
        assert!(session.history().is_empty());
    }
    #[test]
    fn test_accepted_move_flips_turn() {
        let mut session = session();
        let status = session.submit_move(mv("e2e4"), White).unwrap();
        assert_eq!(status, GameStatus::InProgress);
        assert_eq!(session.side_to_move(), Black);
        assert_eq!(session.history(), &[mv("e2e4")]);
    }
    #[test]
    fn test_wrong_turn_changes_nothing() {
        let mut session = session();
        let before = session.position().clone();
        assert_eq!(
            session.submit_move(mv("e7e5"), Black),
            Err(PlayError::WrongTurn {
                to_move: White,
                claimed: Black
            })
        );
        assert_eq!(session.position(), &before);
        assert!(session.history().is_empty());
    }
    #[test]
    fn test_wrong_turn_checked_before_legality() {
        let mut session = session();
        assert!(matches!(
            session.submit_move(mv("a1a8"), Black),
            Err(PlayError::WrongTurn { .. })
        ));
    }
    #[test]
    fn test_illegal_move_changes_nothing() {
        let mut session = session();
        assert_eq!(
            session.submit_move(mv("e2e5"), White),
            Err(PlayError::IllegalMove(mv("e2e5")))
        );
        assert_eq!(session.position(), &Position::initial());
    }
    #[test]
    fn test_fools_mate() {
        let mut session = session();
        for (text, color) in [("f2f3", White), ("e7e5", Black), ("g2g4", White)] {
            assert_eq!(
                session.submit_move(mv(text), color),
                Ok(GameStatus::InProgress)
            );
        }
        assert_eq!(
            session.submit_move(mv("d8h4"), Black),
            Ok(GameStatus::Checkmate { winner: Black })
        );
        assert!(session.position().legal_moves().is_empty());
        assert_eq!(
            session.submit_move(mv("a2a3"), White),
            Err(PlayError::GameOver(GameStatus::Checkmate { winner: Black }))
        );
        assert_eq!(session.history().len(), 4);
    }
    #[test]
    fn test_stalemate() {
        let position: Position = "k7/8/1QK5/8/8/8/8/8 w - - 0 1".parse().unwrap();
        let mut session = GameSession::from_position(SessionId::new("s"), position, DrawRules::NONE);
        // queen b6 to c7 leaves the king on a8 with no move but not in check
        assert_eq!(
            session.submit_move(mv("b6c7"), White),
            Ok(GameStatus::Stalemate)
        );
        assert_eq!(session.position()[C7], Some(Piece::WQ));
    }
    #[test]
    fn test_from_position_classifies_start() {
        let position: Position = "k7/1Q6/1K6/8/8/8/8/8 b - - 0 1".parse().unwrap();
        let session = GameSession::from_position(SessionId::new("m"), position, DrawRules::NONE);
        assert_eq!(session.status(), GameStatus::Checkmate { winner: White });
    }
    #[test]
    fn test_repetition_only_when_enabled() {
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"];
        let session = GameSession::replay(SessionId::new("r"), DrawRules::NONE, shuffle).unwrap();
        assert_eq!(session.status(), GameStatus::InProgress);

        let rules = DrawRules {
            threefold_repetition: true,
            ..DrawRules::NONE
        };
        let session = GameSession::replay(SessionId::new("r"), rules, shuffle).unwrap();
        assert_eq!(
            session.status(),
            GameStatus::Drawn {
                reason: DrawReason::Repetition
            }
        );
        assert_eq!(session.history().len(), 8);
    }
    #[test]
    fn test_repetition_after_double_push() {
        // the e3 target after e4 can never be taken, so it does not tell
        // the first visit apart from the later ones
        let moves = ["e2e4", "g8f6", "g1f3", "f6g8", "f3g1", "g8f6", "g1f3", "f6g8"];
        let rules = DrawRules {
            threefold_repetition: true,
            ..DrawRules::NONE
        };
        let session = GameSession::replay(SessionId::new("r"), rules, moves).unwrap();
        assert_eq!(
            session.status(),
            GameStatus::Drawn {
                reason: DrawReason::Repetition
            }
        );
    }
    #[test]
    fn test_fifty_moves() {
        let position: Position = "4k3/8/8/8/8/8/8/R3K3 w - - 99 80".parse().unwrap();
        let mut session = GameSession::from_position(SessionId::new("f"), position.clone(), DrawRules::ALL);
        assert_eq!(
            session.submit_move(mv("a1a2"), White),
            Ok(GameStatus::Drawn {
                reason: DrawReason::FiftyMoves
            })
        );
        let mut session = GameSession::from_position(SessionId::new("f"), position, DrawRules::NONE);
        assert_eq!(
            session.submit_move(mv("a1a2"), White),
            Ok(GameStatus::InProgress)
        );
    }
    #[test]
    fn test_insufficient_material() {
        let position: Position = "4k3/8/8/8/8/8/3r4/4KN2 w - - 0 1".parse().unwrap();
        let mut session = GameSession::from_position(SessionId::new("i"), position, DrawRules::ALL);
        assert_eq!(
            session.submit_move(mv("e1d2"), White),
            Ok(GameStatus::Drawn {
                reason: DrawReason::Insufficient
            })
        );
    }
    #[test]
    fn test_replay_reports_bad_move() {
        let err = GameSession::replay(SessionId::new("x"), DrawRules::NONE, ["e2e4", "e2e4"])
            .unwrap_err();
        assert!(err.to_string().contains("Move 2"));
        assert!(err.downcast_ref::<PlayError>().is_some());
        let err = GameSession::replay(SessionId::new("x"), DrawRules::NONE, ["e2-e4"]).unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }
}
