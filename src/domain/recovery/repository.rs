//! Password reset token repository trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::entity::ResetToken;
use crate::domain::user::Email;
use crate::domain::DomainError;

/// Storage for password reset tokens
#[async_trait]
pub trait ResetTokenRepository: Send + Sync + std::fmt::Debug {
    async fn create(&self, token: ResetToken) -> Result<ResetToken, DomainError>;

    async fn get(&self, token_hash: &str) -> Result<Option<ResetToken>, DomainError>;

    /// Atomically check that the token is unused and unexpired at `now`, then
    /// mark it used. Exactly one concurrent caller gets `Some`.
    async fn claim(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, DomainError>;

    /// Undo a claim whose follow-up work failed
    async fn release(&self, token_hash: &str) -> Result<bool, DomainError>;

    /// Remove every outstanding token of a user, returns how many
    async fn delete_for_user(&self, user: &Email) -> Result<usize, DomainError>;

    /// Drop used or expired tokens, returns how many
    async fn prune(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;
}
