//! Credential service for user identity, authentication and password changes

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::password::PasswordHasher;
use crate::domain::user::{validate_password, PasswordPolicy};
use crate::domain::{
    Clock, DomainError, Email, IssuedToken, TokenRepository, TokenValue, User, UserRepository,
    UserRole,
};
use crate::infrastructure::locks::KeyedLocks;
use crate::infrastructure::token::{SecretGenerator, TokenService};

/// Failure of a password change, by how far it got
#[derive(Debug)]
pub enum PasswordChangeError {
    /// Nothing was written
    NotApplied(DomainError),
    /// The new hash is stored but open sessions could not be revoked
    SessionsNotRevoked(DomainError),
}

impl PasswordChangeError {
    /// Whether the new password hash was stored
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::SessionsNotRevoked(_))
    }

    pub fn into_inner(self) -> DomainError {
        match self {
            Self::NotApplied(e) | Self::SessionsNotRevoked(e) => e,
        }
    }
}

/// Owns user records and password verification
///
/// Every mutation of a single user runs under that user's lock, so two
/// concurrent password changes are applied one after the other.
#[derive(Debug)]
pub struct CredentialService<R: UserRepository, H: PasswordHasher, T: TokenRepository> {
    repository: Arc<R>,
    hasher: Arc<H>,
    tokens: Arc<TokenService<T>>,
    clock: Arc<dyn Clock>,
    policy: PasswordPolicy,
    api_keys: SecretGenerator,
    locks: KeyedLocks,
}

impl<R: UserRepository, H: PasswordHasher, T: TokenRepository> CredentialService<R, H, T> {
    /// Create a new credential service
    pub fn new(
        repository: Arc<R>,
        hasher: Arc<H>,
        tokens: Arc<TokenService<T>>,
        clock: Arc<dyn Clock>,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            repository,
            hasher,
            tokens,
            clock,
            policy,
            api_keys: SecretGenerator::api_key(),
            locks: KeyedLocks::new(),
        }
    }

    fn parse_email(email: &str) -> Result<Email, DomainError> {
        Email::parse(email).map_err(|e| DomainError::invalid_credential_format(e.to_string()))
    }

    /// Check a candidate password against the policy
    pub fn check_password(&self, password: &str) -> Result<(), DomainError> {
        validate_password(password, &self.policy)
            .map_err(|e| DomainError::invalid_credential_format(e.to_string()))
    }

    /// Register a new user
    pub async fn create(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let email = Self::parse_email(email)?;
        self.check_password(password)?;

        let _guard = self.locks.lock(email.as_str()).await;

        if self.repository.exists(&email).await? {
            return Err(DomainError::duplicate_user(email.as_str()));
        }

        let password_hash = self.hasher.hash(password)?;
        let user = self.repository.create(User::new(email, password_hash)).await?;

        info!(email = %user.email(), "Created user");
        Ok(user)
    }

    /// Check a password, returning the user on success
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let email = Email::parse(email).map_err(|_| DomainError::user_not_found(email))?;

        let user = self
            .repository
            .get(&email)
            .await?
            .ok_or_else(|| DomainError::user_not_found(email.as_str()))?;

        if !self.hasher.verify(password, user.password_hash()) {
            debug!(email = %email, "Password mismatch");
            return Err(DomainError::InvalidPassword);
        }

        if self.hasher.needs_rehash(user.password_hash()) {
            if let Err(e) = self.rehash(&email, password).await {
                warn!(email = %email, error = %e, "Failed to upgrade password hash");
            }
        }

        Ok(user)
    }

    /// Re-hash a verified password with the current cost
    async fn rehash(&self, email: &Email, password: &str) -> Result<(), DomainError> {
        let _guard = self.locks.lock(email.as_str()).await;

        let Some(mut user) = self.repository.get(email).await? else {
            return Ok(());
        };

        // Skip if the password changed between verification and the lock
        if !self.hasher.verify(password, user.password_hash()) {
            return Ok(());
        }

        user.set_password_hash(self.hasher.hash(password)?);
        self.repository.update(&user).await?;
        debug!(email = %email, "Upgraded password hash cost");
        Ok(())
    }

    /// Authenticate and open a session
    ///
    /// The session is issued under the user's lock after checking the stored
    /// hash again, so a login racing a password change either finishes before
    /// the change revokes sessions or fails with `InvalidPassword`.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, DomainError> {
        let verified = self.authenticate(email, password).await?;
        let email = verified.email().clone();

        let _guard = self.locks.lock(email.as_str()).await;

        let mut current = self.require(&email).await?;
        if current.password_hash() != verified.password_hash()
            && !self.hasher.verify(password, current.password_hash())
        {
            debug!(email = %email, "Password changed while logging in");
            return Err(DomainError::InvalidPassword);
        }

        current.record_login(self.clock.now());
        self.repository.update(&current).await?;

        self.tokens.issue(&email).await
    }

    /// Replace a user's password and revoke every open session
    pub async fn change_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<User, DomainError> {
        let email = Self::parse_email(email)?;
        self.set_password(&email, new_password).await
    }

    /// Same as [`Self::change_password`] for an already parsed email
    pub async fn set_password(
        &self,
        email: &Email,
        new_password: &str,
    ) -> Result<User, DomainError> {
        self.replace_password(email, new_password)
            .await
            .map_err(PasswordChangeError::into_inner)
    }

    /// Like [`Self::set_password`], telling apart failures that left the
    /// stored hash untouched from ones that happened after it was written
    pub async fn replace_password(
        &self,
        email: &Email,
        new_password: &str,
    ) -> Result<User, PasswordChangeError> {
        self.check_password(new_password)
            .map_err(PasswordChangeError::NotApplied)?;

        let _guard = self.locks.lock(email.as_str()).await;

        let user = self
            .store_password_hash(email, new_password)
            .await
            .map_err(PasswordChangeError::NotApplied)?;

        self.tokens
            .revoke_all(email)
            .await
            .map_err(PasswordChangeError::SessionsNotRevoked)?;

        info!(email = %email, "Changed password");
        Ok(user)
    }

    async fn store_password_hash(&self, email: &Email, password: &str) -> Result<User, DomainError> {
        let mut user = self.require(email).await?;
        user.set_password_hash(self.hasher.hash(password)?);
        self.repository.update(&user).await
    }

    /// Get a user by email
    pub async fn get(&self, email: &str) -> Result<Option<User>, DomainError> {
        match Email::parse(email) {
            Ok(email) => self.repository.get(&email).await,
            Err(_) => Ok(None),
        }
    }

    /// Get a user or fail with `UserNotFound`
    pub async fn require(&self, email: &Email) -> Result<User, DomainError> {
        self.repository
            .get(email)
            .await?
            .ok_or_else(|| DomainError::user_not_found(email.as_str()))
    }

    /// Grant or withdraw the admin role
    pub async fn set_role(&self, email: &str, role: UserRole) -> Result<User, DomainError> {
        let email = Self::parse_email(email)?;
        let _guard = self.locks.lock(email.as_str()).await;

        let mut user = self.require(&email).await?;
        user.set_role(role);
        let user = self.repository.update(&user).await?;

        info!(email = %email, role = %role, "Changed user role");
        Ok(user)
    }

    /// Replace the user's API key, returning the new key once
    pub async fn regenerate_api_key(&self, email: &str) -> Result<TokenValue, DomainError> {
        let email = Self::parse_email(email)?;
        let _guard = self.locks.lock(email.as_str()).await;

        let mut user = self.require(&email).await?;
        let secret = self.api_keys.generate();
        user.set_api_key_hash(Some(secret.hash));
        self.repository.update(&user).await?;

        info!(email = %email, "Regenerated API key");
        Ok(secret.value)
    }

    /// Drop the user's API key
    pub async fn revoke_api_key(&self, email: &str) -> Result<(), DomainError> {
        let email = Self::parse_email(email)?;
        let _guard = self.locks.lock(email.as_str()).await;

        let mut user = self.require(&email).await?;
        if user.api_key_hash().is_some() {
            user.set_api_key_hash(None);
            self.repository.update(&user).await?;
            info!(email = %email, "Revoked API key");
        }
        Ok(())
    }

    /// Resolve an API key to its owner
    pub async fn authenticate_api_key(&self, key: &str) -> Result<User, DomainError> {
        self.repository
            .get_by_api_key_hash(&SecretGenerator::hash(key))
            .await?
            .ok_or(DomainError::TokenNotFound)
    }

    /// Remove the user record and revoke its sessions
    ///
    /// Team and repository cleanup is the caller's job, see `AccountService`.
    pub async fn delete(&self, email: &Email) -> Result<bool, DomainError> {
        let _guard = self.locks.lock(email.as_str()).await;

        self.tokens.revoke_all(email).await?;
        let deleted = self.repository.delete(email).await?;

        if deleted {
            info!(email = %email, "Deleted user");
        }
        Ok(deleted)
    }
}
