//! Repository manager capability contract
//!
//! Source-repository hosting (a git server, a hosted forge...) is pluggable.
//! The coordinator talks to it only through [`RepositoryManager`]; user ids are
//! normalized emails and group names are team names.

use std::collections::BTreeSet;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who a repository grant is given to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Principal {
    User(String),
    Group(String),
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(name) => write!(f, "user:{}", name),
            Self::Group(name) => write!(f, "group:{}", name),
        }
    }
}

/// Backend-side failure
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryManagerError {
    #[error("'{0}' already exists")]
    AlreadyExists(String),

    #[error("'{0}' does not exist")]
    Missing(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend rejected the request: {0}")]
    Rejected(String),
}

/// Capabilities the access coordinator needs from a repository backend
///
/// Mutating operations are the provisioning surface. The read operations let
/// the coordinator diff backend state against the team registry so that a sync
/// can be re-run after a crash without duplicating or missing grants.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RepositoryManager: Send + Sync + std::fmt::Debug {
    async fn create_user(&self, user: &str) -> Result<(), RepositoryManagerError>;

    async fn remove_user(&self, user: &str) -> Result<(), RepositoryManagerError>;

    async fn create_group(&self, group: &str) -> Result<(), RepositoryManagerError>;

    async fn remove_group(&self, group: &str) -> Result<(), RepositoryManagerError>;

    async fn grant_group_membership(
        &self,
        group: &str,
        user: &str,
    ) -> Result<(), RepositoryManagerError>;

    async fn revoke_group_membership(
        &self,
        group: &str,
        user: &str,
    ) -> Result<(), RepositoryManagerError>;

    async fn grant_repository_access(
        &self,
        repository: &str,
        principal: &Principal,
    ) -> Result<(), RepositoryManagerError>;

    async fn revoke_repository_access(
        &self,
        repository: &str,
        principal: &Principal,
    ) -> Result<(), RepositoryManagerError>;

    async fn user_exists(&self, user: &str) -> Result<bool, RepositoryManagerError>;

    /// Members of a group, `None` when the group does not exist
    async fn group_members(
        &self,
        group: &str,
    ) -> Result<Option<BTreeSet<String>>, RepositoryManagerError>;

    async fn groups_of_user(&self, user: &str) -> Result<BTreeSet<String>, RepositoryManagerError>;

    /// Repositories the principal holds a direct grant on
    async fn repository_grants_of(
        &self,
        principal: &Principal,
    ) -> Result<BTreeSet<String>, RepositoryManagerError>;
}
