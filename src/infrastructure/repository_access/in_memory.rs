//! In-memory repository backend
//!
//! Behaves like a small forge: users, groups and direct repository grants.
//! Mutating calls are recorded so callers can assert on exactly what was sent,
//! and latency or failures can be injected.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Principal, RepositoryManager, RepositoryManagerError};

/// A mutating call received by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CreateUser(String),
    RemoveUser(String),
    CreateGroup(String),
    RemoveGroup(String),
    GrantGroupMembership { group: String, user: String },
    RevokeGroupMembership { group: String, user: String },
    GrantRepositoryAccess { repository: String, principal: Principal },
    RevokeRepositoryAccess { repository: String, principal: Principal },
}

#[derive(Debug, Default)]
struct State {
    users: BTreeSet<String>,
    groups: BTreeMap<String, BTreeSet<String>>,
    grants: BTreeMap<Principal, BTreeSet<String>>,
    calls: Vec<BackendCall>,
    latency: Option<Duration>,
    unavailable: bool,
    /// Users whose group grants are rejected
    rejected_users: BTreeSet<String>,
}

/// In-memory implementation of RepositoryManager
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepositoryManager {
    state: Arc<RwLock<State>>,
}

impl InMemoryRepositoryManager {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutating calls received so far, in order
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.state.read().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.write().await.calls.clear();
    }

    /// Members of a group, `None` when it does not exist
    pub async fn members_of(&self, group: &str) -> Option<BTreeSet<String>> {
        self.state.read().await.groups.get(group).cloned()
    }

    /// Delay every call by `latency`
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.write().await.latency = latency;
    }

    /// Fail every call with `Unavailable`
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Reject group grants for one user
    pub async fn reject_grants_for(&self, user: &str) {
        self.state.write().await.rejected_users.insert(user.to_string());
    }

    async fn delay(&self) -> Result<(), RepositoryManagerError> {
        let (latency, unavailable) = {
            let state = self.state.read().await;
            (state.latency, state.unavailable)
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if unavailable {
            return Err(RepositoryManagerError::Unavailable(
                "backend marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RepositoryManager for InMemoryRepositoryManager {
    async fn create_user(&self, user: &str) -> Result<(), RepositoryManagerError> {
        self.delay().await?;
        let mut state = self.state.write().await;
        state.calls.push(BackendCall::CreateUser(user.to_string()));

        if !state.users.insert(user.to_string()) {
            return Err(RepositoryManagerError::AlreadyExists(user.to_string()));
        }
        Ok(())
    }

    async fn remove_user(&self, user: &str) -> Result<(), RepositoryManagerError> {
        self.delay().await?;
        let mut state = self.state.write().await;
        state.calls.push(BackendCall::RemoveUser(user.to_string()));

        if !state.users.remove(user) {
            return Err(RepositoryManagerError::Missing(user.to_string()));
        }
        for members in state.groups.values_mut() {
            members.remove(user);
        }
        state.grants.remove(&Principal::User(user.to_string()));
        Ok(())
    }

    async fn create_group(&self, group: &str) -> Result<(), RepositoryManagerError> {
        self.delay().await?;
        let mut state = self.state.write().await;
        state.calls.push(BackendCall::CreateGroup(group.to_string()));

        if state.groups.contains_key(group) {
            return Err(RepositoryManagerError::AlreadyExists(group.to_string()));
        }
        state.groups.insert(group.to_string(), BTreeSet::new());
        Ok(())
    }

    async fn remove_group(&self, group: &str) -> Result<(), RepositoryManagerError> {
        self.delay().await?;
        let mut state = self.state.write().await;
        state.calls.push(BackendCall::RemoveGroup(group.to_string()));

        if state.groups.remove(group).is_none() {
            return Err(RepositoryManagerError::Missing(group.to_string()));
        }
        state.grants.remove(&Principal::Group(group.to_string()));
        Ok(())
    }

    async fn grant_group_membership(
        &self,
        group: &str,
        user: &str,
    ) -> Result<(), RepositoryManagerError> {
        self.delay().await?;
        let mut state = self.state.write().await;
        state.calls.push(BackendCall::GrantGroupMembership {
            group: group.to_string(),
            user: user.to_string(),
        });

        if state.rejected_users.contains(user) {
            return Err(RepositoryManagerError::Rejected(format!(
                "user '{}' may not join groups",
                user
            )));
        }
        if !state.users.contains(user) {
            return Err(RepositoryManagerError::Missing(user.to_string()));
        }

        let members = state
            .groups
            .get_mut(group)
            .ok_or_else(|| RepositoryManagerError::Missing(group.to_string()))?;
        members.insert(user.to_string());
        Ok(())
    }

    async fn revoke_group_membership(
        &self,
        group: &str,
        user: &str,
    ) -> Result<(), RepositoryManagerError> {
        self.delay().await?;
        let mut state = self.state.write().await;
        state.calls.push(BackendCall::RevokeGroupMembership {
            group: group.to_string(),
            user: user.to_string(),
        });

        let removed = state
            .groups
            .get_mut(group)
            .map(|members| members.remove(user))
            .unwrap_or(false);

        if !removed {
            return Err(RepositoryManagerError::Missing(format!("{}/{}", group, user)));
        }
        Ok(())
    }

    async fn grant_repository_access(
        &self,
        repository: &str,
        principal: &Principal,
    ) -> Result<(), RepositoryManagerError> {
        self.delay().await?;
        let mut state = self.state.write().await;
        state.calls.push(BackendCall::GrantRepositoryAccess {
            repository: repository.to_string(),
            principal: principal.clone(),
        });

        let known = match principal {
            Principal::User(name) => state.users.contains(name),
            Principal::Group(name) => state.groups.contains_key(name),
        };
        if !known {
            return Err(RepositoryManagerError::Missing(principal.to_string()));
        }

        if !state
            .grants
            .entry(principal.clone())
            .or_default()
            .insert(repository.to_string())
        {
            return Err(RepositoryManagerError::AlreadyExists(format!(
                "{} on {}",
                principal, repository
            )));
        }
        Ok(())
    }

    async fn revoke_repository_access(
        &self,
        repository: &str,
        principal: &Principal,
    ) -> Result<(), RepositoryManagerError> {
        self.delay().await?;
        let mut state = self.state.write().await;
        state.calls.push(BackendCall::RevokeRepositoryAccess {
            repository: repository.to_string(),
            principal: principal.clone(),
        });

        let removed = state
            .grants
            .get_mut(principal)
            .map(|repositories| repositories.remove(repository))
            .unwrap_or(false);

        if !removed {
            return Err(RepositoryManagerError::Missing(format!(
                "{} on {}",
                principal, repository
            )));
        }
        Ok(())
    }

    async fn user_exists(&self, user: &str) -> Result<bool, RepositoryManagerError> {
        self.delay().await?;
        Ok(self.state.read().await.users.contains(user))
    }

    async fn group_members(
        &self,
        group: &str,
    ) -> Result<Option<BTreeSet<String>>, RepositoryManagerError> {
        self.delay().await?;
        Ok(self.state.read().await.groups.get(group).cloned())
    }

    async fn groups_of_user(&self, user: &str) -> Result<BTreeSet<String>, RepositoryManagerError> {
        self.delay().await?;
        let state = self.state.read().await;

        Ok(state
            .groups
            .iter()
            .filter(|(_, members)| members.contains(user))
            .map(|(group, _)| group.clone())
            .collect())
    }

    async fn repository_grants_of(
        &self,
        principal: &Principal,
    ) -> Result<BTreeSet<String>, RepositoryManagerError> {
        self.delay().await?;
        Ok(self
            .state
            .read()
            .await
            .grants
            .get(principal)
            .cloned()
            .unwrap_or_default())
    }
}
