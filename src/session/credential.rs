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

//! Bearer credentials binding a caller to one session.
//!
//! How a credential is encoded and checked is up to the
//! [`CredentialAuthority`] handed to the coordinator. [`MemoryAuthority`]
//! keeps issued tokens in memory and is what tests and single-process
//! deployments use.

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::game::SessionId;

const TOKEN_LEN: usize = 32;

/// An opaque bearer token.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl AsRef<str> for Credential {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// tokens are secrets; keep them out of logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// What a valid credential asserts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub session_id: SessionId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("unknown credential")]
    Unknown,
    #[error("credential expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },
}

pub trait CredentialAuthority: Send + Sync {
    /// Mints a credential for `session_id`.
    fn issue(&self, session_id: &SessionId) -> Credential;

    /// Returns the claims of a credential this authority issued and
    /// that has not yet expired.
    fn verify(&self, credential: &Credential) -> Result<Claims, CredentialError>;
}

pub struct MemoryAuthority {
    ttl: Duration,
    issued: DashMap<Credential, Claims>,
}

impl MemoryAuthority {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            issued: DashMap::new(),
        }
    }

    /// Forgets every expired credential; returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.issued.len();
        self.issued.retain(|_, claims| claims.expires_at > now);
        before.saturating_sub(self.issued.len())
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}

impl CredentialAuthority for MemoryAuthority {
    fn issue(&self, session_id: &SessionId) -> Credential {
        let issued_at = Utc::now();
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let claims = Claims {
            session_id: session_id.clone(),
            issued_at,
            expires_at,
        };
        loop {
            let token: String = thread_rng()
                .sample_iter(&Alphanumeric)
                .take(TOKEN_LEN)
                .map(char::from)
                .collect();
            let credential = Credential(token);
            if let Entry::Vacant(slot) = self.issued.entry(credential.clone()) {
                slot.insert(claims);
                return credential;
            }
        }
    }

    fn verify(&self, credential: &Credential) -> Result<Claims, CredentialError> {
        let claims = self
            .issued
            .get(credential)
            .map(|entry| entry.value().clone())
            .ok_or(CredentialError::Unknown)?;
        if Utc::now() >= claims.expires_at {
            return Err(CredentialError::Expired {
                expired_at: claims.expires_at,
            });
        }
        Ok(claims)
    }
}
