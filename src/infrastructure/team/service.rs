//! Team service for team management
//!
//! Membership changes are linearized per team. Each change is first
//! reconciled against the repository backend and only then persisted; if
//! reconciliation fails or times out, the backend is converged back to the
//! previous membership and nothing is written.
//!
//! Joins additionally hold a per-user lock, taken before the team lock, which
//! account deletion holds for its whole run.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::domain::permission::{check_user_access, TeamSnapshot};
use crate::domain::team::{Team, TeamDependents, TeamName, TeamRepository};
use crate::domain::{DomainError, Email, Principal, UserRepository};
use crate::infrastructure::locks::KeyedLocks;
use crate::infrastructure::repository_access::{RepositoryAccessCoordinator, SyncReport};

/// Team service configuration
#[derive(Debug, Clone)]
pub struct TeamServiceConfig {
    /// Bound on the backend reconciliation of one membership change
    pub mutation_timeout: Duration,
}

impl Default for TeamServiceConfig {
    fn default() -> Self {
        Self {
            mutation_timeout: Duration::from_secs(15),
        }
    }
}

impl TeamServiceConfig {
    pub fn with_mutation_timeout(mut self, timeout: Duration) -> Self {
        self.mutation_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MembershipChange {
    Add,
    Remove,
}

/// Team service for managing teams and their memberships
#[derive(Debug)]
pub struct TeamService<T: TeamRepository, U: UserRepository> {
    teams: Arc<T>,
    users: Arc<U>,
    coordinator: Arc<RepositoryAccessCoordinator>,
    dependents: Arc<dyn TeamDependents>,
    config: TeamServiceConfig,
    locks: KeyedLocks,
    member_locks: KeyedLocks,
}

impl<T: TeamRepository, U: UserRepository> TeamService<T, U> {
    /// Create a new team service
    pub fn new(
        teams: Arc<T>,
        users: Arc<U>,
        coordinator: Arc<RepositoryAccessCoordinator>,
        dependents: Arc<dyn TeamDependents>,
        config: TeamServiceConfig,
    ) -> Self {
        Self {
            teams,
            users,
            coordinator,
            dependents,
            config,
            locks: KeyedLocks::new(),
            member_locks: KeyedLocks::new(),
        }
    }

    fn parse_name(name: &str) -> Result<TeamName, DomainError> {
        TeamName::new(name).map_err(|e| DomainError::validation(e.to_string()))
    }

    fn parse_email(email: &str) -> Result<Email, DomainError> {
        Email::parse(email).map_err(|e| DomainError::validation(e.to_string()))
    }

    async fn require_user(&self, user: &Email) -> Result<(), DomainError> {
        if !self.users.exists(user).await? {
            return Err(DomainError::user_not_found(user.as_str()));
        }
        Ok(())
    }

    /// Keep `user` from joining or creating any team until the guard drops
    ///
    /// Removals are not blocked, so the holder may still take the user out
    /// of its teams.
    pub async fn hold_member(&self, user: &Email) -> OwnedMutexGuard<()> {
        self.member_locks.lock(user.as_str()).await
    }

    /// Create a team with `creator` as its first member
    pub async fn create_team(&self, name: &str, creator: &str) -> Result<Team, DomainError> {
        let name = Self::parse_name(name)?;
        let creator = Self::parse_email(creator)?;

        info!(team = %name, creator = %creator, "Creating team");

        let _member = self.hold_member(&creator).await;
        self.require_user(&creator).await?;

        let _guard = self.locks.lock(name.as_str()).await;

        if self.teams.exists(&name).await? {
            return Err(DomainError::duplicate_team(name.as_str()));
        }

        let team = Team::new(name.clone(), creator);

        if let Err(e) = self.reconcile(&name, team.members()).await {
            self.restore(&name, None).await;
            return Err(e);
        }

        match self.teams.create(team).await {
            Ok(team) => Ok(team),
            Err(e) => {
                self.restore(&name, None).await;
                Err(e)
            }
        }
    }

    /// Add a user to a team; adding an existing member is a no-op
    pub async fn add_member(&self, team: &str, user: &str) -> Result<Team, DomainError> {
        self.change_membership(team, user, MembershipChange::Add)
            .await
    }

    /// Remove a user from a team; removing a non-member is a no-op
    ///
    /// Emptying a team that still owns resources fails with `TeamHasDependents`.
    pub async fn remove_member(&self, team: &str, user: &str) -> Result<Team, DomainError> {
        self.change_membership(team, user, MembershipChange::Remove)
            .await
    }

    async fn change_membership(
        &self,
        team: &str,
        user: &str,
        change: MembershipChange,
    ) -> Result<Team, DomainError> {
        let name = Self::parse_name(team)?;
        let user = Self::parse_email(user)?;

        let _member = match change {
            MembershipChange::Add => Some(self.hold_member(&user).await),
            MembershipChange::Remove => None,
        };
        let _guard = self.locks.lock(name.as_str()).await;

        let current = self.require(&name).await?;
        let mut proposed = current.clone();

        let changed = match change {
            MembershipChange::Add => {
                if !current.contains(&user) {
                    self.require_user(&user).await?;
                }
                proposed.add_member(user.clone())
            }
            MembershipChange::Remove => {
                if current.contains(&user)
                    && current.member_count() == 1
                    && self.dependents.has_dependents(&name).await?
                {
                    return Err(DomainError::team_has_dependents(name.as_str()));
                }
                proposed.remove_member(&user)
            }
        };

        if !changed {
            debug!(team = %name, user = %user, change = ?change, "Membership already in place");
            return Ok(current);
        }

        if let Err(e) = self.reconcile(&name, proposed.members()).await {
            warn!(team = %name, user = %user, error = %e, "Reconciliation failed, rolling back");
            self.restore(&name, Some(current.members())).await;
            return Err(e);
        }

        match self.teams.update(&proposed).await {
            Ok(team) => {
                info!(team = %name, user = %user, change = ?change, "Changed team membership");
                Ok(team)
            }
            Err(e) => {
                warn!(team = %name, user = %user, error = %e, "Persisting membership failed, rolling back");
                self.restore(&name, Some(current.members())).await;
                Err(e)
            }
        }
    }

    async fn reconcile(
        &self,
        name: &TeamName,
        members: &BTreeSet<Email>,
    ) -> Result<SyncReport, DomainError> {
        tokio::time::timeout(
            self.config.mutation_timeout,
            self.coordinator.converge(name, members),
        )
        .await
        .map_err(|_| {
            DomainError::timeout(format!(
                "Reconciling team '{}' did not complete within {:?}",
                name, self.config.mutation_timeout
            ))
        })?
    }

    /// Best-effort return of the backend group to `previous`; `None` removes it
    async fn restore(&self, name: &TeamName, previous: Option<&BTreeSet<Email>>) {
        let result = match previous {
            Some(members) => self.coordinator.converge(name, members).await.map(|_| ()),
            None => self.coordinator.remove_team_access(name).await,
        };

        if let Err(e) = result {
            warn!(
                team = %name,
                error = %e,
                "Backend rollback incomplete, sync_team_membership will repair it"
            );
        }
    }

    /// Re-run convergence of the team's backend group
    pub async fn sync_team_membership(&self, team: &str) -> Result<SyncReport, DomainError> {
        let name = Self::parse_name(team)?;
        let _guard = self.locks.lock(name.as_str()).await;

        let team = self.require(&name).await?;
        self.reconcile(&name, team.members()).await
    }

    /// Delete a team that owns no resources, dropping its backend group
    pub async fn delete_team(&self, team: &str) -> Result<(), DomainError> {
        let name = Self::parse_name(team)?;
        let _guard = self.locks.lock(name.as_str()).await;

        self.require(&name).await?;

        if self.dependents.has_dependents(&name).await? {
            return Err(DomainError::team_has_dependents(name.as_str()));
        }

        tokio::time::timeout(
            self.config.mutation_timeout,
            self.coordinator.remove_team_access(&name),
        )
        .await
        .map_err(|_| DomainError::timeout(format!("Removing group '{}' timed out", name)))??;

        self.teams.delete(&name).await?;

        info!(team = %name, "Deleted team");
        Ok(())
    }

    /// Give the team's backend group access to a repository
    pub async fn grant_team_repository(&self, team: &str, repository: &str) -> Result<(), DomainError> {
        let name = Self::parse_name(team)?;
        let _guard = self.locks.lock(name.as_str()).await;

        self.require(&name).await?;
        self.coordinator
            .grant_repository(repository, &Principal::Group(name.as_str().to_string()))
            .await
    }

    /// Withdraw the team's backend group access to a repository
    pub async fn revoke_team_repository(&self, team: &str, repository: &str) -> Result<(), DomainError> {
        let name = Self::parse_name(team)?;
        let _guard = self.locks.lock(name.as_str()).await;

        self.require(&name).await?;
        self.coordinator
            .revoke_repository(repository, &Principal::Group(name.as_str().to_string()))
            .await
    }

    /// Get a team by name
    pub async fn get(&self, team: &str) -> Result<Option<Team>, DomainError> {
        match TeamName::new(team) {
            Ok(name) => self.teams.get(&name).await,
            Err(_) => Ok(None),
        }
    }

    async fn require(&self, name: &TeamName) -> Result<Team, DomainError> {
        self.teams
            .get(name)
            .await?
            .ok_or_else(|| DomainError::team_not_found(name.as_str()))
    }

    /// List all teams
    pub async fn list(&self) -> Result<Vec<Team>, DomainError> {
        self.teams.list().await
    }

    /// Teams the user directly belongs to
    pub async fn teams_of(&self, user: &str) -> Result<Vec<Team>, DomainError> {
        match Email::parse(user) {
            Ok(user) => self.teams.list_for_member(&user).await,
            Err(_) => Ok(Vec::new()),
        }
    }

    /// Whether the user belongs to any of the named teams
    ///
    /// Unknown or malformed team names simply do not match.
    pub async fn check_user_access(&self, teams: &[&str], user: &str) -> Result<bool, DomainError> {
        let Ok(user) = Email::parse(user) else {
            return Ok(false);
        };

        let names: Vec<TeamName> = teams
            .iter()
            .filter_map(|team| TeamName::new(*team).ok())
            .collect();

        let mut known = Vec::with_capacity(names.len());
        for name in &names {
            if let Some(team) = self.teams.get(name).await? {
                known.push(team);
            }
        }

        let snapshot = TeamSnapshot::from_teams(&known);
        Ok(check_user_access(&names, &user, &snapshot))
    }
}
