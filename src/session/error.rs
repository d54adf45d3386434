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
use strum_macros::Display;
use thiserror::Error;

use super::credential::CredentialError;
use crate::board::MoveError;
use crate::game::{PlayError, SessionId};

/// The reason a request was turned down, in a form the transport can
/// put on the wire. Every kind is caused by the caller and retrying the
/// same request gives the same answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    MalformedMove,
    Unauthorized,
    NotFound,
    WrongTurn,
    IllegalMove,
    GameOver,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("malformed move {text:?}")]
    MalformedMove { text: String },

    #[error("unauthorized: {0}")]
    Unauthorized(#[from] CredentialError),

    #[error("session {session_id} not found")]
    NotFound { session_id: SessionId },

    #[error(transparent)]
    Rejected(#[from] PlayError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::MalformedMove { .. } => ErrorKind::MalformedMove,
            SessionError::Unauthorized(_) => ErrorKind::Unauthorized,
            SessionError::NotFound { .. } => ErrorKind::NotFound,
            SessionError::Rejected(PlayError::WrongTurn { .. }) => ErrorKind::WrongTurn,
            SessionError::Rejected(PlayError::IllegalMove(_)) => ErrorKind::IllegalMove,
            SessionError::Rejected(PlayError::GameOver(_)) => ErrorKind::GameOver,
        }
    }
}

impl From<MoveError> for SessionError {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::Malformed(text) => SessionError::MalformedMove { text },
            MoveError::Illegal(mv) => SessionError::Rejected(PlayError::IllegalMove(mv)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Color;
    use crate::game::GameStatus;

    #[test]
    fn test_error_kinds() {
        let err: SessionError = "e2e".parse::<crate::Move>().unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::MalformedMove);
        assert_eq!(err.to_string(), "malformed move \"e2e\"");

        let err = SessionError::from(PlayError::WrongTurn {
            to_move: Color::White,
            claimed: Color::Black,
        });
        assert_eq!(err.kind(), ErrorKind::WrongTurn);
        assert_eq!(err.to_string(), "It is white's turn, not black's");

        let err = SessionError::from(PlayError::GameOver(GameStatus::Stalemate));
        assert_eq!(err.kind(), ErrorKind::GameOver);

        let err = SessionError::NotFound {
            session_id: SessionId::new("abc"),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "session abc not found");

        let err = SessionError::from(CredentialError::Unknown);
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
    #[test]
    fn test_error_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::MalformedMove).unwrap(),
            "\"malformed_move\""
        );
        assert_eq!(ErrorKind::IllegalMove.to_string(), "illegal_move");
        assert_eq!(
            serde_json::from_str::<ErrorKind>("\"game_over\"").unwrap(),
            ErrorKind::GameOver
        );
    }
    #[test]
    fn test_errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SessionError>();
    }
}
