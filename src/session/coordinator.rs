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

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::config::CoordinatorConfig;
use super::credential::{Credential, CredentialAuthority, MemoryAuthority};
use super::error::{ErrorKind, SessionError};
use crate::board::{Color, Move};
use crate::game::{GameSession, GameStatus, SessionId};

/// Shared access to one session. Lock it to read or play.
pub type SessionHandle = Arc<Mutex<GameSession>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewSession {
    pub session_id: SessionId,
    pub credential: Credential,
}

/// The answer to a move submission. `reason` is set iff the move was
/// turned down. `status` is the session's status after the submission and
/// is missing only when no session could be resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveOutcome {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GameStatus>,
}

impl MoveOutcome {
    pub fn accepted(status: GameStatus) -> Self {
        Self {
            accepted: true,
            reason: None,
            status: Some(status),
        }
    }
    pub fn rejected(reason: ErrorKind, status: Option<GameStatus>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
            status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusReport {
    pub session_id: SessionId,
    pub status: GameStatus,
    pub side_to_move: Color,
    pub fen: String,
    pub history: Vec<Move>,
}

struct Slot {
    created_at: DateTime<Utc>,
    session: SessionHandle,
}

/// Registry of live sessions.
///
/// Lookups and creations for different ids run concurrently. A move holds
/// only its own session's mutex, and the registry is never locked while a
/// session mutex is held.
pub struct SessionCoordinator {
    sessions: DashMap<SessionId, Slot>,
    authority: Arc<dyn CredentialAuthority>,
    config: CoordinatorConfig,
}

impl Default for SessionCoordinator {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

impl SessionCoordinator {
    /// A coordinator backed by a [`MemoryAuthority`] using the configured
    /// credential lifetime.
    pub fn new(config: CoordinatorConfig) -> Self {
        let authority = Arc::new(MemoryAuthority::new(config.credential_ttl()));
        Self::with_authority(config, authority)
    }

    pub fn with_authority(config: CoordinatorConfig, authority: Arc<dyn CredentialAuthority>) -> Self {
        Self {
            sessions: DashMap::new(),
            authority,
            config,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Registers a new session at the initial position and mints its
    /// credential.
    pub fn create(&self) -> (SessionId, Credential) {
        let session_id = loop {
            let id = SessionId::random();
            if let Entry::Vacant(slot) = self.sessions.entry(id.clone()) {
                let session = GameSession::new(id.clone(), self.config.draw_rules);
                slot.insert(Slot {
                    created_at: session.created_at(),
                    session: Arc::new(Mutex::new(session)),
                });
                break id;
            }
        };
        let credential = self.authority.issue(&session_id);
        info!(session_id = %session_id, "session created");
        (session_id, credential)
    }

    pub fn create_session(&self) -> NewSession {
        let (session_id, credential) = self.create();
        NewSession {
            session_id,
            credential,
        }
    }

    /// Maps a credential to the session it was issued for.
    pub fn resolve(&self, credential: &Credential) -> Result<SessionHandle, SessionError> {
        let claims = self.authority.verify(credential).map_err(|err| {
            warn!(error = %err, "credential rejected");
            err
        })?;
        let session = self
            .sessions
            .get(&claims.session_id)
            .map(|slot| Arc::clone(&slot.session));
        session.ok_or_else(|| {
            warn!(session_id = %claims.session_id, "credential for unknown session");
            SessionError::NotFound {
                session_id: claims.session_id,
            }
        })
    }

    /// Like [`submit_move`](Self::submit_move) but returns the typed error.
    pub fn try_submit_move(
        &self,
        credential: &Credential,
        text: &str,
        claimed: Color,
    ) -> Result<GameStatus, SessionError> {
        let handle = self.resolve(credential)?;
        let mut session = handle.lock();
        play(&mut session, text, claimed)
    }

    /// Submits `text` as `claimed`. A rejection from a resolved session
    /// still carries that session's current status.
    pub fn submit_move(&self, credential: &Credential, text: &str, claimed: Color) -> MoveOutcome {
        let handle = match self.resolve(credential) {
            Ok(handle) => handle,
            Err(err) => return MoveOutcome::rejected(err.kind(), None),
        };
        let mut session = handle.lock();
        match play(&mut session, text, claimed) {
            Ok(status) => MoveOutcome::accepted(status),
            Err(err) => {
                debug!(error = %err, mv = text, "move rejected");
                MoveOutcome::rejected(err.kind(), Some(session.status()))
            }
        }
    }

    pub fn query_status(&self, credential: &Credential) -> Result<StatusReport, SessionError> {
        let handle = self.resolve(credential)?;
        let session = handle.lock();
        Ok(StatusReport {
            session_id: session.id().clone(),
            status: session.status(),
            side_to_move: session.side_to_move(),
            fen: session.position().to_fen(),
            history: session.history().to_vec(),
        })
    }

    /// Drops a session. Credentials issued for it resolve to `NotFound`
    /// from now on. Returns whether the session existed.
    pub fn evict(&self, session_id: &SessionId) -> bool {
        let evicted = self.sessions.remove(session_id).is_some();
        if evicted {
            info!(session_id = %session_id, "session evicted");
        }
        evicted
    }

    /// Drops every session created at least `age` ago; returns how many.
    pub fn evict_older_than(&self, age: Duration) -> usize {
        let cutoff = Utc::now()
            .checked_sub_signed(age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let before = self.sessions.len();
        self.sessions.retain(|_, slot| slot.created_at > cutoff);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            info!(evicted, "evicted stale sessions");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn play(session: &mut GameSession, text: &str, claimed: Color) -> Result<GameStatus, SessionError> {
    let mv: Move = text.parse()?;
    Ok(session.submit_move(mv, claimed)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::PlayError;

    #[test]
    fn test_create_registers_session() {
        let coordinator = SessionCoordinator::default();
        let (id, credential) = coordinator.create();
        assert_eq!(coordinator.len(), 1);
        let handle = coordinator.resolve(&credential).unwrap();
        assert_eq!(handle.lock().id(), &id);
    }
    #[test]
    fn test_malformed_move_checked_after_credential() {
        let coordinator = SessionCoordinator::default();
        let (_, credential) = coordinator.create();
        assert_eq!(
            coordinator.submit_move(&credential, "e2e", Color::White),
            MoveOutcome::rejected(ErrorKind::MalformedMove, Some(GameStatus::InProgress))
        );
        assert_eq!(
            coordinator.submit_move(&Credential::new("nope"), "e2e", Color::White),
            MoveOutcome::rejected(ErrorKind::Unauthorized, None)
        );
    }
    #[test]
    fn test_try_submit_move_errors() {
        let coordinator = SessionCoordinator::default();
        let (_, credential) = coordinator.create();
        assert_eq!(
            coordinator.try_submit_move(&credential, "e2e4", Color::Black),
            Err(SessionError::Rejected(PlayError::WrongTurn {
                to_move: Color::White,
                claimed: Color::Black,
            }))
        );
        assert_eq!(
            coordinator.try_submit_move(&credential, "e2e4", Color::White),
            Ok(GameStatus::InProgress)
        );
    }
    #[test]
    fn test_evict() {
        let coordinator = SessionCoordinator::default();
        let (id, credential) = coordinator.create();
        assert!(coordinator.evict(&id));
        assert!(!coordinator.evict(&id));
        assert!(coordinator.is_empty());
        assert_eq!(
            coordinator.resolve(&credential).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
    #[test]
    fn test_evict_older_than() {
        let coordinator = SessionCoordinator::default();
        coordinator.create();
        coordinator.create();
        assert_eq!(coordinator.evict_older_than(Duration::hours(1)), 0);
        assert_eq!(coordinator.len(), 2);
        assert_eq!(coordinator.evict_older_than(Duration::zero()), 2);
        assert!(coordinator.is_empty());
    }
    #[test]
    fn test_outcome_wire_shape() {
        let json = serde_json::to_value(MoveOutcome::rejected(ErrorKind::Unauthorized, None)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "accepted": false, "reason": "unauthorized" })
        );
        let json = serde_json::to_value(MoveOutcome::rejected(
            ErrorKind::WrongTurn,
            Some(GameStatus::InProgress),
        ))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "accepted": false,
                "reason": "wrong_turn",
                "status": { "state": "in_progress" }
            })
        );
        let json = serde_json::to_value(MoveOutcome::accepted(GameStatus::InProgress)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "accepted": true, "status": { "state": "in_progress" } })
        );
    }
}
