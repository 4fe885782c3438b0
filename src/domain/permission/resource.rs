//! Resources and their owning teams

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::team::TeamName;
use crate::domain::DomainError;

/// Opaque identifier of a protected resource (an application, a repository...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps resources to the teams they are assigned to
#[async_trait]
pub trait ResourceCatalog: Send + Sync + std::fmt::Debug {
    /// Owning teams, `None` when the resource is unknown
    async fn teams_for(
        &self,
        resource: &ResourceId,
    ) -> Result<Option<BTreeSet<TeamName>>, DomainError>;
}
