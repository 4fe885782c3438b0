//! Keeps the repository backend's users and groups in line with the team registry

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{DomainError, Email, Principal, RepositoryManager, RepositoryManagerError, Team, TeamName};

/// Coordinator configuration
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Upper bound on a single backend call
    pub call_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
        }
    }
}

impl CoordinatorConfig {
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

/// Mutating calls issued by one convergence run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub group_created: bool,
    pub users_provisioned: Vec<String>,
    pub granted: Vec<String>,
    pub revoked: Vec<String>,
}

impl SyncReport {
    /// True when the backend already matched
    pub fn is_noop(&self) -> bool {
        !self.group_created
            && self.users_provisioned.is_empty()
            && self.granted.is_empty()
            && self.revoked.is_empty()
    }
}

fn provisioning_error(operation: &str, target: &str, error: RepositoryManagerError) -> DomainError {
    DomainError::provisioning(format!("{} '{}' failed: {}", operation, target, error))
}

/// Drives the repository backend through the [`RepositoryManager`] contract
///
/// Every call is bounded by `call_timeout`. Creation calls that report
/// `AlreadyExists` and removal calls that report `Missing` count as success,
/// so each operation can be re-run after a partial failure.
#[derive(Debug)]
pub struct RepositoryAccessCoordinator {
    backend: Arc<dyn RepositoryManager>,
    config: CoordinatorConfig,
}

impl RepositoryAccessCoordinator {
    /// Create a new coordinator
    pub fn new(backend: Arc<dyn RepositoryManager>, config: CoordinatorConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    async fn call<T>(
        &self,
        operation: &str,
        target: &str,
        request: impl Future<Output = Result<T, RepositoryManagerError>>,
    ) -> Result<Result<T, RepositoryManagerError>, DomainError> {
        tokio::time::timeout(self.config.call_timeout, request)
            .await
            .map_err(|_| {
                DomainError::timeout(format!(
                    "{} '{}' did not complete within {:?}",
                    operation, target, self.config.call_timeout
                ))
            })
    }

    /// Create the user's backend identity unless it already exists
    ///
    /// Returns true when a create call was issued.
    pub async fn ensure_user_provisioned(&self, user: &Email) -> Result<bool, DomainError> {
        let id = user.as_str();

        match self.call("user_exists", id, self.backend.user_exists(id)).await? {
            Ok(true) => return Ok(false),
            Ok(false) => {}
            Err(e) => return Err(provisioning_error("user_exists", id, e)),
        }

        match self.call("create_user", id, self.backend.create_user(id)).await? {
            Ok(()) => {
                info!(user = %id, "Provisioned backend user");
                Ok(true)
            }
            Err(RepositoryManagerError::AlreadyExists(_)) => Ok(false),
            Err(e) => Err(provisioning_error("create_user", id, e)),
        }
    }

    /// Converge the team's backend group onto its registry membership
    pub async fn sync_team_membership(&self, team: &Team) -> Result<SyncReport, DomainError> {
        self.converge(team.name(), team.members()).await
    }

    /// Converge the backend group `group` onto exactly `desired`
    ///
    /// Reads the group's current members, then issues only the grants and
    /// revokes needed. A second run with nothing changed issues no mutating
    /// call.
    pub async fn converge(
        &self,
        group: &TeamName,
        desired: &BTreeSet<Email>,
    ) -> Result<SyncReport, DomainError> {
        let group_id = group.as_str();
        let mut report = SyncReport::default();

        let current = match self
            .call("group_members", group_id, self.backend.group_members(group_id))
            .await?
        {
            Ok(Some(members)) => members,
            Ok(None) => {
                match self
                    .call("create_group", group_id, self.backend.create_group(group_id))
                    .await?
                {
                    Ok(()) => report.group_created = true,
                    Err(RepositoryManagerError::AlreadyExists(_)) => {}
                    Err(e) => return Err(provisioning_error("create_group", group_id, e)),
                }
                BTreeSet::new()
            }
            Err(e) => return Err(provisioning_error("group_members", group_id, e)),
        };

        let desired_ids: BTreeSet<String> =
            desired.iter().map(|e| e.as_str().to_string()).collect();

        for user in desired.iter().filter(|u| !current.contains(u.as_str())) {
            if self.ensure_user_provisioned(user).await? {
                report.users_provisioned.push(user.as_str().to_string());
            }

            let user_id = user.as_str();
            match self
                .call(
                    "grant_group_membership",
                    user_id,
                    self.backend.grant_group_membership(group_id, user_id),
                )
                .await?
            {
                Ok(()) | Err(RepositoryManagerError::AlreadyExists(_)) => {
                    report.granted.push(user_id.to_string());
                }
                Err(e) => return Err(provisioning_error("grant_group_membership", user_id, e)),
            }
        }

        for user_id in current.difference(&desired_ids) {
            match self
                .call(
                    "revoke_group_membership",
                    user_id,
                    self.backend.revoke_group_membership(group_id, user_id),
                )
                .await?
            {
                Ok(()) | Err(RepositoryManagerError::Missing(_)) => {
                    report.revoked.push(user_id.clone());
                }
                Err(e) => return Err(provisioning_error("revoke_group_membership", user_id, e)),
            }
        }

        if report.is_noop() {
            debug!(team = %group, "Backend group already converged");
        } else {
            info!(
                team = %group,
                granted = report.granted.len(),
                revoked = report.revoked.len(),
                "Converged backend group"
            );
        }

        Ok(report)
    }

    /// Revoke every grant held by the user, then remove its backend identity
    pub async fn remove_user_access(&self, user: &Email) -> Result<(), DomainError> {
        let id = user.as_str();

        let groups = self
            .call("groups_of_user", id, self.backend.groups_of_user(id))
            .await?
            .map_err(|e| provisioning_error("groups_of_user", id, e))?;

        for group in &groups {
            match self
                .call(
                    "revoke_group_membership",
                    group,
                    self.backend.revoke_group_membership(group, id),
                )
                .await?
            {
                Ok(()) | Err(RepositoryManagerError::Missing(_)) => {}
                Err(e) => return Err(provisioning_error("revoke_group_membership", group, e)),
            }
        }

        self.revoke_all_repository_grants(&Principal::User(id.to_string()))
            .await?;

        match self.call("remove_user", id, self.backend.remove_user(id)).await? {
            Ok(()) | Err(RepositoryManagerError::Missing(_)) => {}
            Err(e) => return Err(provisioning_error("remove_user", id, e)),
        }

        info!(user = %id, groups = groups.len(), "Removed backend user access");
        Ok(())
    }

    /// Revoke the group's repository grants and remove the group
    pub async fn remove_team_access(&self, team: &TeamName) -> Result<(), DomainError> {
        let id = team.as_str();

        self.revoke_all_repository_grants(&Principal::Group(id.to_string()))
            .await?;

        match self.call("remove_group", id, self.backend.remove_group(id)).await? {
            Ok(()) | Err(RepositoryManagerError::Missing(_)) => {}
            Err(e) => return Err(provisioning_error("remove_group", id, e)),
        }

        info!(team = %id, "Removed backend group");
        Ok(())
    }

    async fn revoke_all_repository_grants(&self, principal: &Principal) -> Result<(), DomainError> {
        let target = principal.to_string();

        let repositories = self
            .call(
                "repository_grants_of",
                &target,
                self.backend.repository_grants_of(principal),
            )
            .await?
            .map_err(|e| provisioning_error("repository_grants_of", &target, e))?;

        for repository in &repositories {
            self.revoke_repository(repository, principal).await?;
        }

        Ok(())
    }

    /// Give a principal access to a repository
    pub async fn grant_repository(
        &self,
        repository: &str,
        principal: &Principal,
    ) -> Result<(), DomainError> {
        match self
            .call(
                "grant_repository_access",
                repository,
                self.backend.grant_repository_access(repository, principal),
            )
            .await?
        {
            Ok(()) | Err(RepositoryManagerError::AlreadyExists(_)) => {
                info!(repository = %repository, principal = %principal, "Granted repository access");
                Ok(())
            }
            Err(e) => Err(provisioning_error("grant_repository_access", repository, e)),
        }
    }

    /// Withdraw a principal's access to a repository
    pub async fn revoke_repository(
        &self,
        repository: &str,
        principal: &Principal,
    ) -> Result<(), DomainError> {
        match self
            .call(
                "revoke_repository_access",
                repository,
                self.backend.revoke_repository_access(repository, principal),
            )
            .await?
        {
            Ok(()) | Err(RepositoryManagerError::Missing(_)) => {
                info!(repository = %repository, principal = %principal, "Revoked repository access");
                Ok(())
            }
            Err(e) => {
                warn!(repository = %repository, principal = %principal, error = %e, "Revoke failed");
                Err(provisioning_error("revoke_repository_access", repository, e))
            }
        }
    }
}
