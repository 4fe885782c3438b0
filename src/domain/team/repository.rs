//! Team repository trait

use async_trait::async_trait;

use super::entity::{Team, TeamName};
use crate::domain::user::Email;
use crate::domain::DomainError;

/// Repository for managing teams
///
/// `update` is a compare-and-set on [`Team::version`].
#[async_trait]
pub trait TeamRepository: Send + Sync + std::fmt::Debug {
    /// Get a team by name
    async fn get(&self, name: &TeamName) -> Result<Option<Team>, DomainError>;

    /// Insert a new team, `DuplicateTeam` if the name is taken
    async fn create(&self, team: Team) -> Result<Team, DomainError>;

    /// Replace a team if its version still matches, returns the stored record
    async fn update(&self, team: &Team) -> Result<Team, DomainError>;

    /// Delete a team by name
    async fn delete(&self, name: &TeamName) -> Result<bool, DomainError>;

    /// List all teams
    async fn list(&self) -> Result<Vec<Team>, DomainError>;

    /// List the teams a user is a direct member of
    async fn list_for_member(&self, user: &Email) -> Result<Vec<Team>, DomainError>;

    /// Check if a team exists
    async fn exists(&self, name: &TeamName) -> Result<bool, DomainError> {
        Ok(self.get(name).await?.is_some())
    }
}
