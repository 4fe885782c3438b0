//! Session token entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::Email;

/// Plaintext bearer secret, shown to the caller exactly once
///
/// `Debug` is redacted so the value never reaches logs by accident.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenValue(String);

impl TokenValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret, e.g. to hand it to the client
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for TokenValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenValue([REDACTED])")
    }
}

/// Lifecycle of a session token; `Expired` and `Revoked` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    Valid,
    Expired,
    Revoked,
}

impl TokenStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Valid)
    }
}

/// Persisted session token, keyed by the digest of its value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionToken {
    token_hash: String,
    user: Email,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    status: TokenStatus,
}

impl SessionToken {
    pub fn new(
        token_hash: impl Into<String>,
        user: Email,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token_hash: token_hash.into(),
            user,
            issued_at,
            expires_at,
            status: TokenStatus::Valid,
        }
    }

    pub fn token_hash(&self) -> &str {
        &self.token_hash
    }

    pub fn user(&self) -> &Email {
        &self.user
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn status(&self) -> TokenStatus {
        self.status
    }

    /// Whether the validity window has elapsed at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub(crate) fn set_status(&mut self, status: TokenStatus) {
        self.status = status;
    }
}

/// Result of issuing a session token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub value: TokenValue,
    pub user: Email,
    pub expires_at: DateTime<Utc>,
}
