//! In-memory reset token repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{DomainError, Email, ResetToken, ResetTokenRepository};

/// In-memory implementation of ResetTokenRepository, keyed by token digest
#[derive(Debug, Default)]
pub struct InMemoryResetTokenRepository {
    tokens: Arc<RwLock<HashMap<String, ResetToken>>>,
}

impl InMemoryResetTokenRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl ResetTokenRepository for InMemoryResetTokenRepository {
    async fn create(&self, token: ResetToken) -> Result<ResetToken, DomainError> {
        let mut tokens = self.tokens.write().await;

        if tokens.contains_key(token.token_hash()) {
            return Err(DomainError::conflict("Reset token already exists"));
        }

        tokens.insert(token.token_hash().to_string(), token.clone());
        Ok(token)
    }

    async fn get(&self, token_hash: &str) -> Result<Option<ResetToken>, DomainError> {
        Ok(self.tokens.read().await.get(token_hash).cloned())
    }

    async fn claim(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, DomainError> {
        // Check and mark under one write guard
        let mut tokens = self.tokens.write().await;

        match tokens.get_mut(token_hash) {
            Some(token) if token.is_claimable_at(now) => {
                token.mark_used(now);
                Ok(Some(token.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release(&self, token_hash: &str) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.write().await;

        match tokens.get_mut(token_hash) {
            Some(token) if token.is_used() => {
                token.clear_used();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_for_user(&self, user: &Email) -> Result<usize, DomainError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| token.user() != user);
        Ok(before - tokens.len())
    }

    async fn prune(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| token.is_claimable_at(now));
        Ok(before - tokens.len())
    }
}
