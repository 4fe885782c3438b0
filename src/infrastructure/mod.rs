//! Infrastructure layer - Service implementations and collaborators

pub mod account;
pub mod locks;
pub mod logging;
pub mod mail;
pub mod permission;
pub mod recovery;
pub mod repository_access;
pub mod team;
pub mod token;
pub mod user;

pub use account::AccountService;
pub use locks::KeyedLocks;
pub use mail::{InMemoryMailer, LogMailer};
pub use permission::{InMemoryResourceCatalog, PermissionService};
pub use recovery::{InMemoryResetTokenRepository, RecoveryConfig, RecoveryService};
pub use repository_access::{
    BackendCall, CoordinatorConfig, InMemoryRepositoryManager, RepositoryAccessCoordinator,
    SyncReport,
};
pub use team::{InMemoryTeamDependents, InMemoryTeamRepository, TeamService, TeamServiceConfig};
pub use token::{parse_bearer, InMemoryTokenRepository, SecretGenerator, TokenConfig, TokenService};
pub use user::{
    Argon2Hasher, CredentialService, HashCost, InMemoryUserRepository, PasswordChangeError,
    PasswordHasher,
};
