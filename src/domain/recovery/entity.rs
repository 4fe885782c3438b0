//! Password reset token entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::user::Email;

/// Single-use secret authorizing one password change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetToken {
    token_hash: String,
    user: Email,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    used_at: Option<DateTime<Utc>>,
}

impl ResetToken {
    pub fn new(
        token_hash: impl Into<String>,
        user: Email,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token_hash: token_hash.into(),
            user,
            created_at,
            expires_at,
            used_at: None,
        }
    }

    pub fn token_hash(&self) -> &str {
        &self.token_hash
    }

    pub fn user(&self) -> &Email {
        &self.user
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn used_at(&self) -> Option<DateTime<Utc>> {
        self.used_at
    }

    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Unused and inside its window
    pub fn is_claimable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_used() && !self.is_expired_at(now)
    }

    pub(crate) fn mark_used(&mut self, at: DateTime<Utc>) {
        self.used_at = Some(at);
    }

    pub(crate) fn clear_used(&mut self) {
        self.used_at = None;
    }
}
