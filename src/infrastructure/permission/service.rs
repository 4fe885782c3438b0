//! Authorization checks against live registry state

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::permission::resolve;
use crate::domain::{
    Decision, DenyReason, DomainError, Email, Grant, ResourceCatalog, ResourceId, TeamName,
    TeamRepository, TeamSnapshot, User, UserRepository,
};

/// Everything the resolver needs for one decision
struct Inputs {
    user: Option<User>,
    owners: Option<BTreeSet<TeamName>>,
    snapshot: TeamSnapshot,
}

/// Gathers user, resource owners and team memberships, then asks the resolver
///
/// Any lookup failure becomes `Denied(LookupFailed)`.
#[derive(Debug)]
pub struct PermissionService<U: UserRepository, T: TeamRepository> {
    users: Arc<U>,
    teams: Arc<T>,
    catalog: Arc<dyn ResourceCatalog>,
}

impl<U: UserRepository, T: TeamRepository> PermissionService<U, T> {
    pub fn new(users: Arc<U>, teams: Arc<T>, catalog: Arc<dyn ResourceCatalog>) -> Self {
        Self {
            users,
            teams,
            catalog,
        }
    }

    /// Decide whether `user` may act on `resource`
    pub async fn check(&self, user: &str, resource: &ResourceId) -> Decision {
        let decision = match self.gather(user, resource).await {
            Ok(inputs) => resolve(
                inputs.user.as_ref(),
                inputs.owners.as_ref(),
                &inputs.snapshot,
            ),
            Err(e) => {
                warn!(user = %user, resource = %resource, error = %e, "Authorization lookup failed");
                Decision::Denied(DenyReason::LookupFailed)
            }
        };

        debug!(user = %user, resource = %resource, decision = ?decision, "Authorization decision");
        decision
    }

    /// Like [`Self::check`], turning a denial into `PermissionDenied`
    pub async fn authorize(&self, user: &str, resource: &ResourceId) -> Result<Grant, DomainError> {
        match self.check(user, resource).await {
            Decision::Allowed(grant) => Ok(grant),
            Decision::Denied(reason) => Err(DomainError::permission_denied(format!(
                "'{}' may not act on '{}': {}",
                user, resource, reason
            ))),
        }
    }

    async fn gather(
        &self,
        user: &str,
        resource: &ResourceId,
    ) -> Result<Inputs, DomainError> {
        let user = match Email::parse(user) {
            Ok(email) => self.users.get(&email).await?,
            Err(_) => None,
        };

        let owners = self.catalog.teams_for(resource).await?;

        let mut teams = Vec::new();
        if user.is_some() {
            for name in owners.iter().flatten() {
                if let Some(team) = self.teams.get(name).await? {
                    teams.push(team);
                }
            }
        }

        Ok(Inputs {
            user,
            owners,
            snapshot: TeamSnapshot::from_teams(&teams),
        })
    }
}
