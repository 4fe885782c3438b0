use thiserror::Error;

/// Failure categories callers report on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input the caller can correct
    InvalidInput,
    /// User, team, token or resource absent
    NotFound,
    /// Duplicate identity, lost compare-and-set, already-used secret
    Conflict,
    /// Bad credentials, dead token, denied permission
    Unauthorized,
    /// Repository backend error or timeout
    ProvisioningFailed,
    /// Mail dispatch error
    NotificationFailed,
    /// Storage or unexpected internal failure
    Internal,
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid credential format: {message}")]
    InvalidCredentialFormat { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("User '{email}' already exists")]
    DuplicateUser { email: String },

    #[error("User '{email}' not found")]
    UserNotFound { email: String },

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Team '{name}' already exists")]
    DuplicateTeam { name: String },

    #[error("Team '{name}' not found")]
    TeamNotFound { name: String },

    #[error("Team '{name}' still owns dependent resources")]
    TeamHasDependents { name: String },

    #[error("Token not found")]
    TokenNotFound,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Invalid or expired reset token")]
    InvalidOrExpiredResetToken,

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Provisioning failed: {message}")]
    ProvisioningFailed { message: String },

    #[error("Operation timed out: {message}")]
    Timeout { message: String },

    #[error("Notification failed: {message}")]
    NotificationFailed { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn invalid_credential_format(message: impl Into<String>) -> Self {
        Self::InvalidCredentialFormat {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn duplicate_user(email: impl Into<String>) -> Self {
        Self::DuplicateUser {
            email: email.into(),
        }
    }

    pub fn user_not_found(email: impl Into<String>) -> Self {
        Self::UserNotFound {
            email: email.into(),
        }
    }

    pub fn duplicate_team(name: impl Into<String>) -> Self {
        Self::DuplicateTeam { name: name.into() }
    }

    pub fn team_not_found(name: impl Into<String>) -> Self {
        Self::TeamNotFound { name: name.into() }
    }

    pub fn team_has_dependents(name: impl Into<String>) -> Self {
        Self::TeamHasDependents { name: name.into() }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn provisioning(message: impl Into<String>) -> Self {
        Self::ProvisioningFailed {
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    pub fn notification(message: impl Into<String>) -> Self {
        Self::NotificationFailed {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredentialFormat { .. } | Self::Validation { .. } => {
                ErrorKind::InvalidInput
            }
            Self::UserNotFound { .. } | Self::TeamNotFound { .. } | Self::NotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::DuplicateUser { .. }
            | Self::DuplicateTeam { .. }
            | Self::TeamHasDependents { .. }
            | Self::Conflict { .. } => ErrorKind::Conflict,
            Self::InvalidPassword
            | Self::TokenNotFound
            | Self::TokenExpired
            | Self::TokenRevoked
            | Self::InvalidOrExpiredResetToken
            | Self::PermissionDenied { .. } => ErrorKind::Unauthorized,
            Self::ProvisioningFailed { .. } | Self::Timeout { .. } => {
                ErrorKind::ProvisioningFailed
            }
            Self::NotificationFailed { .. } => ErrorKind::NotificationFailed,
            Self::Storage { .. } | Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProvisioningFailed { .. }
                | Self::Timeout { .. }
                | Self::Conflict { .. }
                | Self::Storage { .. }
        )
    }
}
