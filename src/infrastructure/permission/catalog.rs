//! In-memory resource catalog

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{DomainError, ResourceCatalog, ResourceId, TeamName};

/// Resource to owning-teams map
#[derive(Debug, Default, Clone)]
pub struct InMemoryResourceCatalog {
    resources: Arc<RwLock<HashMap<ResourceId, BTreeSet<TeamName>>>>,
}

impl InMemoryResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource with no owning team yet
    pub async fn register(&self, resource: ResourceId) {
        self.resources.write().await.entry(resource).or_default();
    }

    /// Assign a resource to a team, registering the resource if needed
    pub async fn assign(&self, resource: ResourceId, team: TeamName) -> bool {
        self.resources
            .write()
            .await
            .entry(resource)
            .or_default()
            .insert(team)
    }

    pub async fn unassign(&self, resource: &ResourceId, team: &TeamName) -> bool {
        self.resources
            .write()
            .await
            .get_mut(resource)
            .is_some_and(|teams| teams.remove(team))
    }

    pub async fn remove(&self, resource: &ResourceId) -> bool {
        self.resources.write().await.remove(resource).is_some()
    }

    /// Resources assigned to a team
    pub async fn resources_of(&self, team: &TeamName) -> Vec<ResourceId> {
        let mut owned: Vec<ResourceId> = self
            .resources
            .read()
            .await
            .iter()
            .filter(|(_, teams)| teams.contains(team))
            .map(|(resource, _)| resource.clone())
            .collect();
        owned.sort();
        owned
    }
}

#[async_trait]
impl ResourceCatalog for InMemoryResourceCatalog {
    async fn teams_for(
        &self,
        resource: &ResourceId,
    ) -> Result<Option<BTreeSet<TeamName>>, DomainError> {
        Ok(self.resources.read().await.get(resource).cloned())
    }
}
