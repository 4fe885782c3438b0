//! Teamgate
//!
//! Identity and access-control core for a multi-tenant platform:
//! - Credential store with Argon2 password hashing
//! - Team registry mirrored onto a pluggable repository backend
//! - Flat, fail-closed permission resolution
//! - Session tokens, API keys and password recovery

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use domain::{Clock, DomainError, Mailer, NoDependents, RepositoryManager, SystemClock, TeamDependents};
use infrastructure::{
    AccountService, Argon2Hasher, CredentialService, InMemoryResetTokenRepository,
    InMemoryResourceCatalog, InMemoryTeamRepository, InMemoryTokenRepository,
    InMemoryUserRepository, PermissionService, RecoveryService, RepositoryAccessCoordinator,
    TeamService, TokenService,
};
use tracing::info;

pub type Tokens = TokenService<InMemoryTokenRepository>;
pub type Credentials =
    CredentialService<InMemoryUserRepository, Argon2Hasher, InMemoryTokenRepository>;
pub type Teams = TeamService<InMemoryTeamRepository, InMemoryUserRepository>;
pub type Recovery = RecoveryService<
    InMemoryUserRepository,
    Argon2Hasher,
    InMemoryTokenRepository,
    InMemoryResetTokenRepository,
>;
pub type Accounts = AccountService<
    InMemoryUserRepository,
    Argon2Hasher,
    InMemoryTokenRepository,
    InMemoryTeamRepository,
    InMemoryResetTokenRepository,
>;
pub type Permissions = PermissionService<InMemoryUserRepository, InMemoryTeamRepository>;

/// External collaborators the core is built around
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub backend: Arc<dyn RepositoryManager>,
    pub mailer: Arc<dyn Mailer>,
    pub dependents: Arc<dyn TeamDependents>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Teams own nothing and time comes from the system clock
    pub fn new(backend: Arc<dyn RepositoryManager>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            backend,
            mailer,
            dependents: Arc::new(NoDependents),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_dependents(mut self, dependents: Arc<dyn TeamDependents>) -> Self {
        self.dependents = dependents;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Every component wired together over in-memory stores
#[derive(Debug, Clone)]
pub struct AccessCore {
    pub tokens: Arc<Tokens>,
    pub credentials: Arc<Credentials>,
    pub teams: Arc<Teams>,
    pub recovery: Arc<Recovery>,
    pub accounts: Arc<Accounts>,
    pub permissions: Arc<Permissions>,
    pub coordinator: Arc<RepositoryAccessCoordinator>,
    pub catalog: Arc<InMemoryResourceCatalog>,
}

impl AccessCore {
    /// Build the core from configuration and collaborators
    pub fn build(config: &AppConfig, collaborators: Collaborators) -> Result<Self, DomainError> {
        let Collaborators {
            backend,
            mailer,
            dependents,
            clock,
        } = collaborators;

        let users = Arc::new(InMemoryUserRepository::new());
        let team_repository = Arc::new(InMemoryTeamRepository::new());

        let tokens = Arc::new(TokenService::new(
            Arc::new(InMemoryTokenRepository::new()),
            clock.clone(),
            config.token_config(),
        ));

        let credentials = Arc::new(CredentialService::new(
            users.clone(),
            Arc::new(Argon2Hasher::new(config.hash_cost())?),
            tokens.clone(),
            clock.clone(),
            config.password_policy(),
        ));

        let coordinator = Arc::new(RepositoryAccessCoordinator::new(
            backend,
            config.coordinator_config(),
        ));

        let teams = Arc::new(TeamService::new(
            team_repository.clone(),
            users.clone(),
            coordinator.clone(),
            dependents,
            config.team_service_config(),
        ));

        let recovery = Arc::new(RecoveryService::new(
            credentials.clone(),
            Arc::new(InMemoryResetTokenRepository::new()),
            mailer,
            clock,
            config.recovery_config(),
        ));

        let accounts = Arc::new(AccountService::new(
            credentials.clone(),
            teams.clone(),
            recovery.clone(),
            coordinator.clone(),
        ));

        let catalog = Arc::new(InMemoryResourceCatalog::new());
        let permissions = Arc::new(PermissionService::new(
            users,
            team_repository,
            catalog.clone(),
        ));

        info!("Access core initialized");

        Ok(Self {
            tokens,
            credentials,
            teams,
            recovery,
            accounts,
            permissions,
            coordinator,
            catalog,
        })
    }
}
