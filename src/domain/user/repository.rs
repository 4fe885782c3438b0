//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{Email, User};
use crate::domain::DomainError;

/// Repository trait for user storage
///
/// `update` is a compare-and-set on [`User::version`]: it fails with
/// `DomainError::Conflict` when the stored record moved on since it was read.
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by normalized email
    async fn get(&self, email: &Email) -> Result<Option<User>, DomainError>;

    /// Get the user owning an API key digest
    async fn get_by_api_key_hash(&self, api_key_hash: &str) -> Result<Option<User>, DomainError>;

    /// Insert a new user, `DuplicateUser` if the email is taken
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Replace a user if its version still matches, returns the stored record
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    /// Delete a user
    async fn delete(&self, email: &Email) -> Result<bool, DomainError>;

    /// List all users
    async fn list(&self) -> Result<Vec<User>, DomainError>;

    /// Check if a user exists
    async fn exists(&self, email: &Email) -> Result<bool, DomainError> {
        Ok(self.get(email).await?.is_some())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Mock user repository for testing
    #[derive(Debug, Default)]
    pub struct MockUserRepository {
        users: Arc<RwLock<HashMap<String, User>>>,
        should_fail: Arc<RwLock<bool>>,
    }

    impl MockUserRepository {
        /// Create a new mock repository
        pub fn new() -> Self {
            Self::default()
        }

        /// Set whether operations should fail
        pub async fn set_should_fail(&self, fail: bool) {
            *self.should_fail.write().await = fail;
        }

        async fn check_should_fail(&self) -> Result<(), DomainError> {
            if *self.should_fail.read().await {
                return Err(DomainError::storage("Mock repository configured to fail"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn get(&self, email: &Email) -> Result<Option<User>, DomainError> {
            self.check_should_fail().await?;
            Ok(self.users.read().await.get(email.as_str()).cloned())
        }

        async fn get_by_api_key_hash(
            &self,
            api_key_hash: &str,
        ) -> Result<Option<User>, DomainError> {
            self.check_should_fail().await?;
            let users = self.users.read().await;
            Ok(users
                .values()
                .find(|u| u.api_key_hash() == Some(api_key_hash))
                .cloned())
        }

        async fn create(&self, user: User) -> Result<User, DomainError> {
            self.check_should_fail().await?;
            let mut users = self.users.write().await;
            let key = user.email().as_str().to_string();

            if users.contains_key(&key) {
                return Err(DomainError::duplicate_user(key));
            }

            users.insert(key, user.clone());
            Ok(user)
        }

        async fn update(&self, user: &User) -> Result<User, DomainError> {
            self.check_should_fail().await?;
            let mut users = self.users.write().await;

            let stored = users
                .get_mut(user.email().as_str())
                .ok_or_else(|| DomainError::user_not_found(user.email().as_str()))?;

            if stored.version() != user.version() {
                return Err(DomainError::conflict(format!(
                    "User '{}' was modified concurrently",
                    user.email()
                )));
            }

            let mut updated = user.clone();
            updated.bump_version();
            *stored = updated.clone();
            Ok(updated)
        }

        async fn delete(&self, email: &Email) -> Result<bool, DomainError> {
            self.check_should_fail().await?;
            Ok(self.users.write().await.remove(email.as_str()).is_some())
        }

        async fn list(&self) -> Result<Vec<User>, DomainError> {
            self.check_should_fail().await?;
            Ok(self.users.read().await.values().cloned().collect())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn create_test_user(email: &str) -> User {
            User::new(Email::parse(email).unwrap(), "hashed_password")
        }

        #[tokio::test]
        async fn test_create_and_get() {
            let repo = MockUserRepository::new();
            let user = create_test_user("alice@example.com");

            repo.create(user.clone()).await.unwrap();

            let retrieved = repo.get(user.email()).await.unwrap();
            assert_eq!(retrieved.unwrap().email(), user.email());
        }

        #[tokio::test]
        async fn test_update_is_compare_and_set() {
            let repo = MockUserRepository::new();
            let user = repo.create(create_test_user("alice@example.com")).await.unwrap();

            let mut first = user.clone();
            first.set_password_hash("first");
            let stored = repo.update(&first).await.unwrap();
            assert_eq!(stored.version(), 1);

            let mut stale = user.clone();
            stale.set_password_hash("stale");
            let result = repo.update(&stale).await;
            assert!(matches!(result, Err(DomainError::Conflict { .. })));
        }

        #[tokio::test]
        async fn test_should_fail() {
            let repo = MockUserRepository::new();
            repo.set_should_fail(true).await;

            let result = repo.list().await;
            assert!(matches!(result, Err(DomainError::Storage { .. })));
        }
    }
}
