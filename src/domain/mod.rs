//! Domain layer - Core entities, rules and collaborator contracts

pub mod clock;
pub mod error;
pub mod mail;
pub mod permission;
pub mod recovery;
pub mod repository_manager;
pub mod team;
pub mod token;
pub mod user;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "testing"))]
pub use clock::ManualClock;
pub use error::{DomainError, ErrorKind};
pub use mail::{MailError, MailMessage, Mailer};
pub use permission::{Decision, DenyReason, Grant, ResourceCatalog, ResourceId, TeamSnapshot};
pub use recovery::{ResetToken, ResetTokenRepository};
pub use repository_manager::{Principal, RepositoryManager, RepositoryManagerError};
pub use team::{NoDependents, Team, TeamDependents, TeamName, TeamRepository};
pub use token::{IssuedToken, SessionToken, TokenRepository, TokenStatus, TokenValue};
pub use user::{Email, PasswordPolicy, User, UserRepository, UserRole};
