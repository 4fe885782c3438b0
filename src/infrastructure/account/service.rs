//! Account lifecycle across the credential store, team registry and backend

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{
    DomainError, Email, ResetTokenRepository, TeamRepository, TokenRepository, User,
    UserRepository,
};
use crate::infrastructure::recovery::RecoveryService;
use crate::infrastructure::repository_access::RepositoryAccessCoordinator;
use crate::infrastructure::team::TeamService;
use crate::infrastructure::user::{CredentialService, PasswordHasher};

/// Registration and deletion of whole accounts
#[derive(Debug)]
pub struct AccountService<U, H, T, M, P>
where
    U: UserRepository,
    H: PasswordHasher,
    T: TokenRepository,
    M: TeamRepository,
    P: ResetTokenRepository,
{
    credentials: Arc<CredentialService<U, H, T>>,
    teams: Arc<TeamService<M, U>>,
    recovery: Arc<RecoveryService<U, H, T, P>>,
    coordinator: Arc<RepositoryAccessCoordinator>,
}

impl<U, H, T, M, P> AccountService<U, H, T, M, P>
where
    U: UserRepository,
    H: PasswordHasher,
    T: TokenRepository,
    M: TeamRepository,
    P: ResetTokenRepository,
{
    pub fn new(
        credentials: Arc<CredentialService<U, H, T>>,
        teams: Arc<TeamService<M, U>>,
        recovery: Arc<RecoveryService<U, H, T, P>>,
        coordinator: Arc<RepositoryAccessCoordinator>,
    ) -> Self {
        Self {
            credentials,
            teams,
            recovery,
            coordinator,
        }
    }

    /// Create the user and its backend identity
    ///
    /// If the backend cannot provision the user, the record is removed again
    /// and the provisioning error is returned.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let user = self.credentials.create(email, password).await?;

        if let Err(e) = self.coordinator.ensure_user_provisioned(user.email()).await {
            warn!(email = %user.email(), error = %e, "Provisioning failed, undoing registration");
            if let Err(undo) = self.credentials.delete(user.email()).await {
                warn!(email = %user.email(), error = %undo, "Failed to undo registration");
            }
            return Err(e);
        }

        info!(email = %user.email(), "Registered account");
        Ok(user)
    }

    /// Remove the account everywhere
    ///
    /// Team memberships go first, through the reconciled removal path, then
    /// backend access, outstanding reset tokens and sessions, and finally the
    /// record. A failure stops the sequence with the record still present, so
    /// the call can be retried.
    ///
    /// The user cannot join a team while this runs: an add already under way
    /// finishes first and is undone below, later ones find no user.
    pub async fn delete(&self, email: &str) -> Result<(), DomainError> {
        let email = Email::parse(email).map_err(|e| DomainError::validation(e.to_string()))?;
        let _member = self.teams.hold_member(&email).await;
        self.credentials.require(&email).await?;

        for team in self.teams.teams_of(email.as_str()).await? {
            self.teams
                .remove_member(team.name().as_str(), email.as_str())
                .await?;
        }

        self.coordinator.remove_user_access(&email).await?;
        self.recovery.forget_user(&email).await?;
        self.credentials.delete(&email).await?;

        info!(email = %email, "Deleted account");
        Ok(())
    }
}
