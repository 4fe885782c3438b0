//! Session token repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::entity::{SessionToken, TokenStatus};
use crate::domain::user::Email;
use crate::domain::DomainError;

/// Storage for session tokens
///
/// Tokens are looked up by the digest of their value only; there is no way to
/// enumerate plaintext values.
#[async_trait]
pub trait TokenRepository: Send + Sync + std::fmt::Debug {
    /// Persist a freshly issued token
    async fn create(&self, token: SessionToken) -> Result<SessionToken, DomainError>;

    /// Look up a token by the digest of its value
    async fn get(&self, token_hash: &str) -> Result<Option<SessionToken>, DomainError>;

    /// Move a token from `from` to `to` if it is still in `from`
    ///
    /// Returns false when the token is missing or already left `from`.
    async fn transition(
        &self,
        token_hash: &str,
        from: TokenStatus,
        to: TokenStatus,
    ) -> Result<bool, DomainError>;

    /// Revoke every valid token of a user in one atomic step, returns how many
    async fn revoke_all_for_user(&self, user: &Email) -> Result<usize, DomainError>;

    /// Tokens bound to a user, in any status
    async fn list_for_user(&self, user: &Email) -> Result<Vec<SessionToken>, DomainError>;

    /// Drop tokens that are terminal or past expiry at `now`, returns how many
    async fn prune(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Mock token repository whose bulk revocation can be made to fail
    #[derive(Debug, Default)]
    pub struct MockTokenRepository {
        tokens: Arc<RwLock<HashMap<String, SessionToken>>>,
        fail_revocations: AtomicBool,
    }

    impl MockTokenRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent `revoke_all_for_user` fail with a storage error
        pub fn set_fail_revocations(&self, fail: bool) {
            self.fail_revocations.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl TokenRepository for MockTokenRepository {
        async fn create(&self, token: SessionToken) -> Result<SessionToken, DomainError> {
            let mut tokens = self.tokens.write().await;
            tokens.insert(token.token_hash().to_string(), token.clone());
            Ok(token)
        }

        async fn get(&self, token_hash: &str) -> Result<Option<SessionToken>, DomainError> {
            Ok(self.tokens.read().await.get(token_hash).cloned())
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
            if self.fail_revocations.load(Ordering::SeqCst) {
                return Err(DomainError::storage("Mock repository configured to fail"));
            }

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
}
