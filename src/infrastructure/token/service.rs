//! Session token service

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::generator::{parse_bearer, SecretGenerator};
use crate::domain::{
    Clock, DomainError, Email, IssuedToken, SessionToken, TokenRepository, TokenStatus,
};

/// Session token settings
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// How long a session token stays valid after issuance
    pub validity: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            validity: Duration::days(7),
        }
    }
}

impl TokenConfig {
    pub fn with_validity_days(days: i64) -> Self {
        Self {
            validity: Duration::days(days),
        }
    }
}

/// Issues, validates and revokes session tokens
#[derive(Debug)]
pub struct TokenService<R: TokenRepository> {
    repository: Arc<R>,
    generator: SecretGenerator,
    clock: Arc<dyn Clock>,
    config: TokenConfig,
}

impl<R: TokenRepository> TokenService<R> {
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>, config: TokenConfig) -> Self {
        Self {
            repository,
            generator: SecretGenerator::session(),
            clock,
            config,
        }
    }

    /// Issue a new token bound to `user`
    ///
    /// The plaintext value is only part of the return value; storage keeps the digest.
    pub async fn issue(&self, user: &Email) -> Result<IssuedToken, DomainError> {
        let secret = self.generator.generate();
        let issued_at = self.clock.now();
        let expires_at = issued_at + self.config.validity;

        self.repository
            .create(SessionToken::new(
                secret.hash,
                user.clone(),
                issued_at,
                expires_at,
            ))
            .await?;

        info!(user = %user, expires_at = %expires_at, "Issued session token");

        Ok(IssuedToken {
            value: secret.value,
            user: user.clone(),
            expires_at,
        })
    }

    /// Resolve a token value to the user it is bound to
    pub async fn validate(&self, value: &str) -> Result<Email, DomainError> {
        let token_hash = SecretGenerator::hash(value);

        let token = self
            .repository
            .get(&token_hash)
            .await?
            .ok_or(DomainError::TokenNotFound)?;

        match token.status() {
            TokenStatus::Revoked => return Err(DomainError::TokenRevoked),
            TokenStatus::Expired => return Err(DomainError::TokenExpired),
            TokenStatus::Valid => {}
        }

        if token.is_expired_at(self.clock.now()) {
            // Pin the terminal state so a skewed clock cannot revive it
            self.repository
                .transition(&token_hash, TokenStatus::Valid, TokenStatus::Expired)
                .await?;
            debug!(user = %token.user(), "Session token expired");
            return Err(DomainError::TokenExpired);
        }

        Ok(token.user().clone())
    }

    /// Validate the token carried by an `Authorization` header value
    pub async fn validate_header(&self, header: &str) -> Result<Email, DomainError> {
        let value = parse_bearer(header).ok_or(DomainError::TokenNotFound)?;
        self.validate(value).await
    }

    /// Revoke a single token (logout), returns false if it was not valid
    pub async fn revoke(&self, value: &str) -> Result<bool, DomainError> {
        let token_hash = SecretGenerator::hash(value);
        let revoked = self
            .repository
            .transition(&token_hash, TokenStatus::Valid, TokenStatus::Revoked)
            .await?;

        if revoked {
            info!("Revoked session token");
        }

        Ok(revoked)
    }

    /// Revoke every outstanding token of `user`
    pub async fn revoke_all(&self, user: &Email) -> Result<usize, DomainError> {
        let revoked = self.repository.revoke_all_for_user(user).await?;
        info!(user = %user, revoked, "Revoked all session tokens");
        Ok(revoked)
    }

    /// Remove expired and revoked tokens from storage
    pub async fn prune_expired(&self) -> Result<usize, DomainError> {
        let pruned = self.repository.prune(self.clock.now()).await?;
        debug!(pruned, "Pruned session tokens");
        Ok(pruned)
    }

    /// Expiry a token issued now would get
    pub fn expiry_from_now(&self) -> DateTime<Utc> {
        self.clock.now() + self.config.validity
    }
}
