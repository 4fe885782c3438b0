//! Dependent-resource check supplied by the caller domain

use async_trait::async_trait;

use super::entity::TeamName;
use crate::domain::DomainError;

/// Answers whether a team still owns resources (applications, services...)
///
/// The owning domain implements this; the team registry consults it before
/// deleting a team or emptying it.
#[async_trait]
pub trait TeamDependents: Send + Sync + std::fmt::Debug {
    async fn has_dependents(&self, team: &TeamName) -> Result<bool, DomainError>;
}

/// For deployments where teams never own resources
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDependents;

#[async_trait]
impl TeamDependents for NoDependents {
    async fn has_dependents(&self, _team: &TeamName) -> Result<bool, DomainError> {
        Ok(false)
    }
}
