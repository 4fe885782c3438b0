//! In-memory dependents registry

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::team::{TeamDependents, TeamName};
use crate::domain::DomainError;

/// Counts resources owned by each team
///
/// Stands in for the owning domain (applications, services...) in tests and
/// the demo.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTeamDependents {
    owned: Arc<RwLock<HashMap<String, usize>>>,
}

impl InMemoryTeamDependents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more resource owned by `team`
    pub async fn attach(&self, team: &TeamName) {
        *self
            .owned
            .write()
            .await
            .entry(team.as_str().to_string())
            .or_insert(0) += 1;
    }

    /// Forget one resource owned by `team`
    pub async fn detach(&self, team: &TeamName) {
        let mut owned = self.owned.write().await;
        if let Some(count) = owned.get_mut(team.as_str()) {
            *count -= 1;
            if *count == 0 {
                owned.remove(team.as_str());
            }
        }
    }
}

#[async_trait]
impl TeamDependents for InMemoryTeamDependents {
    async fn has_dependents(&self, team: &TeamName) -> Result<bool, DomainError> {
        Ok(self.owned.read().await.contains_key(team.as_str()))
    }
}
