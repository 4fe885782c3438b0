//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::user::{Email, User, UserRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<String, User>,
    /// API key digest -> email
    api_key_index: HashMap<String, String>,
}

/// In-memory implementation of UserRepository
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get(&self, email: &Email) -> Result<Option<User>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(email.as_str()).cloned())
    }

    async fn get_by_api_key_hash(&self, api_key_hash: &str) -> Result<Option<User>, DomainError> {
        let inner = self.inner.read().await;

        Ok(inner
            .api_key_index
            .get(api_key_hash)
            .and_then(|email| inner.users.get(email))
            .cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut inner = self.inner.write().await;
        let key = user.email().as_str().to_string();

        if inner.users.contains_key(&key) {
            return Err(DomainError::duplicate_user(key));
        }

        if let Some(api_key_hash) = user.api_key_hash() {
            inner
                .api_key_index
                .insert(api_key_hash.to_string(), key.clone());
        }

        inner.users.insert(key, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let mut inner = self.inner.write().await;
        let key = user.email().as_str().to_string();

        let previous_api_key = {
            let stored = inner
                .users
                .get(&key)
                .ok_or_else(|| DomainError::user_not_found(&key))?;

            if stored.version() != user.version() {
                return Err(DomainError::conflict(format!(
                    "User '{}' was modified concurrently",
                    key
                )));
            }

            stored.api_key_hash().map(str::to_string)
        };

        if let Some(old) = previous_api_key {
            inner.api_key_index.remove(&old);
        }
        if let Some(new) = user.api_key_hash() {
            inner.api_key_index.insert(new.to_string(), key.clone());
        }

        let mut updated = user.clone();
        updated.bump_version();
        inner.users.insert(key, updated.clone());

        Ok(updated)
    }

    async fn delete(&self, email: &Email) -> Result<bool, DomainError> {
        let mut inner = self.inner.write().await;

        match inner.users.remove(email.as_str()) {
            Some(user) => {
                if let Some(api_key_hash) = user.api_key_hash() {
                    inner.api_key_index.remove(api_key_hash);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().cloned().collect())
    }
}
