use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::PasswordPolicy;
use crate::infrastructure::recovery::RecoveryConfig;
use crate::infrastructure::repository_access::CoordinatorConfig;
use crate::infrastructure::team::TeamServiceConfig;
use crate::infrastructure::token::TokenConfig;
use crate::infrastructure::user::HashCost;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
    pub recovery: RecoverySettings,
    pub repository: RepositorySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Credential and session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Argon2 time cost for new password hashes
    pub hash_cost: u32,
    /// Argon2 memory cost in KiB
    pub hash_memory_kib: u32,
    pub token_validity_days: i64,
    pub min_password_length: usize,
    pub max_password_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoverySettings {
    pub reset_token_validity_minutes: i64,
    /// Minimum duration of a reset request in milliseconds
    pub min_response_ms: u64,
    pub reset_url: String,
    pub sender: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    /// Timeout of one backend call in milliseconds
    pub call_timeout_ms: u64,
    /// Timeout of a whole team membership reconciliation in milliseconds
    pub mutation_timeout_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        let cost = HashCost::default();
        let policy = PasswordPolicy::default();

        Self {
            hash_cost: cost.iterations,
            hash_memory_kib: cost.memory_kib,
            token_validity_days: 7,
            min_password_length: policy.min_length,
            max_password_length: policy.max_length,
        }
    }
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            reset_token_validity_minutes: 60,
            min_response_ms: 400,
            reset_url: "http://localhost:8080/reset-password".to_string(),
            sender: "noreply@localhost".to_string(),
        }
    }
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            call_timeout_ms: 5_000,
            mutation_timeout_ms: 15_000,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("TEAMGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn hash_cost(&self) -> HashCost {
        HashCost {
            iterations: self.auth.hash_cost,
            memory_kib: self.auth.hash_memory_kib,
        }
    }

    pub fn password_policy(&self) -> PasswordPolicy {
        PasswordPolicy {
            min_length: self.auth.min_password_length,
            max_length: self.auth.max_password_length,
        }
    }

    pub fn token_config(&self) -> TokenConfig {
        TokenConfig::with_validity_days(self.auth.token_validity_days)
    }

    pub fn recovery_config(&self) -> RecoveryConfig {
        RecoveryConfig {
            validity: chrono::Duration::minutes(self.recovery.reset_token_validity_minutes),
            min_response: Duration::from_millis(self.recovery.min_response_ms),
            reset_url: self.recovery.reset_url.clone(),
        }
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            call_timeout: Duration::from_millis(self.repository.call_timeout_ms),
        }
    }

    pub fn team_service_config(&self) -> TeamServiceConfig {
        TeamServiceConfig {
            mutation_timeout: Duration::from_millis(self.repository.mutation_timeout_ms),
        }
    }
}
