//! In-memory session token repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{DomainError, Email, SessionToken, TokenRepository, TokenStatus};

/// In-memory implementation of TokenRepository
///
/// Reads take the shared lock only, so validating many tokens concurrently
/// never contends. Revocation takes the exclusive lock for the whole batch:
/// a reader sees either every token of the user valid or every one revoked.
#[derive(Debug, Default)]
pub struct InMemoryTokenRepository {
    tokens: Arc<RwLock<HashMap<String, SessionToken>>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn create(&self, token: SessionToken) -> Result<SessionToken, DomainError> {
        let mut tokens = self.tokens.write().await;

        if tokens.contains_key(token.token_hash()) {
            return Err(DomainError::conflict("Token digest collision"));
        }

        tokens.insert(token.token_hash().to_string(), token.clone());
        Ok(token)
    }

    async fn get(&self, token_hash: &str) -> Result<Option<SessionToken>, DomainError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.get(token_hash).cloned())
    }

    async fn transition(
        &self,
        token_hash: &str,
        from: TokenStatus,
        to: TokenStatus,
    ) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.write().await;

        match tokens.get_mut(token_hash) {
            Some(token) if token.status() == from => {
                token.set_status(to);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user: &Email) -> Result<usize, DomainError> {
        let mut tokens = self.tokens.write().await;

        let mut revoked = 0;
        for token in tokens.values_mut() {
            if token.user() == user && token.status() == TokenStatus::Valid {
                token.set_status(TokenStatus::Revoked);
                revoked += 1;
            }
        }

        Ok(revoked)
    }

    async fn list_for_user(&self, user: &Email) -> Result<Vec<SessionToken>, DomainError> {
        let tokens = self.tokens.read().await;
        Ok(tokens.values().filter(|t| t.user() == user).cloned().collect())
    }

    async fn prune(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| !t.status().is_terminal() && !t.is_expired_at(now));
        Ok(before - tokens.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn email(value: &str) -> Email {
        Email::parse(value).unwrap()
    }

    fn token(hash: &str, user: &str) -> SessionToken {
        let now = Utc::now();
        SessionToken::new(hash, email(user), now, now + Duration::days(7))
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = InMemoryTokenRepository::new();
        repo.create(token("h1", "alice@example.com")).await.unwrap();

        let stored = repo.get("h1").await.unwrap().unwrap();
        assert_eq!(stored.user().as_str(), "alice@example.com");
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_digest_rejected() {
        let repo = InMemoryTokenRepository::new();
        repo.create(token("h1", "alice@example.com")).await.unwrap();

        let result = repo.create(token("h1", "bob@example.com")).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let repo = InMemoryTokenRepository::new();
        repo.create(token("h1", "alice@example.com")).await.unwrap();

        assert!(repo
            .transition("h1", TokenStatus::Valid, TokenStatus::Expired)
            .await
            .unwrap());
        assert!(!repo
            .transition("h1", TokenStatus::Valid, TokenStatus::Revoked)
            .await
            .unwrap());
        assert!(!repo
            .transition("missing", TokenStatus::Valid, TokenStatus::Revoked)
            .await
            .unwrap());

        let stored = repo.get("h1").await.unwrap().unwrap();
        assert_eq!(stored.status(), TokenStatus::Expired);
    }

    #[tokio::test]
    async fn test_revoke_all_only_touches_user() {
        let repo = InMemoryTokenRepository::new();
        repo.create(token("a1", "alice@example.com")).await.unwrap();
        repo.create(token("a2", "alice@example.com")).await.unwrap();
        repo.create(token("b1", "bob@example.com")).await.unwrap();

        let revoked = repo
            .revoke_all_for_user(&email("alice@example.com"))
            .await
            .unwrap();
        assert_eq!(revoked, 2);

        let bob = repo.get("b1").await.unwrap().unwrap();
        assert_eq!(bob.status(), TokenStatus::Valid);
    }

    #[tokio::test]
    async fn test_prune_drops_dead_tokens() {
        let repo = InMemoryTokenRepository::new();
        repo.create(token("live", "alice@example.com")).await.unwrap();
        repo.create(token("revoked", "alice@example.com")).await.unwrap();
        repo.transition("revoked", TokenStatus::Valid, TokenStatus::Revoked)
            .await
            .unwrap();

        let pruned = repo.prune(Utc::now()).await.unwrap();
        assert_eq!(pruned, 1);

        let pruned_later = repo.prune(Utc::now() + Duration::days(8)).await.unwrap();
        assert_eq!(pruned_later, 1);
        assert!(repo.get("live").await.unwrap().is_none());
    }
}
