//! In-memory team repository implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::team::{Team, TeamName, TeamRepository};
use crate::domain::{DomainError, Email};

/// In-memory implementation of TeamRepository
#[derive(Debug, Default)]
pub struct InMemoryTeamRepository {
    teams: Arc<RwLock<HashMap<String, Team>>>,
}

impl InMemoryTeamRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn get(&self, name: &TeamName) -> Result<Option<Team>, DomainError> {
        let teams = self.teams.read().await;
        Ok(teams.get(name.as_str()).cloned())
    }

    async fn create(&self, team: Team) -> Result<Team, DomainError> {
        let mut teams = self.teams.write().await;

        if teams.contains_key(team.name().as_str()) {
            return Err(DomainError::duplicate_team(team.name().as_str()));
        }

        teams.insert(team.name().as_str().to_string(), team.clone());
        Ok(team)
    }

    async fn update(&self, team: &Team) -> Result<Team, DomainError> {
        let mut teams = self.teams.write().await;

        let stored = teams
            .get_mut(team.name().as_str())
            .ok_or_else(|| DomainError::team_not_found(team.name().as_str()))?;

        if stored.version() != team.version() {
            return Err(DomainError::conflict(format!(
                "Team '{}' was modified concurrently",
                team.name()
            )));
        }

        let mut updated = team.clone();
        updated.bump_version();
        *stored = updated.clone();

        Ok(updated)
    }

    async fn delete(&self, name: &TeamName) -> Result<bool, DomainError> {
        let mut teams = self.teams.write().await;
        Ok(teams.remove(name.as_str()).is_some())
    }

    async fn list(&self) -> Result<Vec<Team>, DomainError> {
        let teams = self.teams.read().await;
        let mut result: Vec<Team> = teams.values().cloned().collect();

        // Sort by name
        result.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(result)
    }

    async fn list_for_member(&self, user: &Email) -> Result<Vec<Team>, DomainError> {
        let teams = self.teams.read().await;
        let mut result: Vec<Team> = teams
            .values()
            .filter(|team| team.contains(user))
            .cloned()
            .collect();

        result.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(result)
    }
}
