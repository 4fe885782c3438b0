//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{normalize_email, validate_email, UserValidationError};

/// Normalized email address, the primary key of a user
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Normalize and validate an email address
    pub fn parse(email: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let email = normalize_email(email.as_ref());
        validate_email(&email)?;
        Ok(Self(email))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform-wide role recorded on the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Member,
    /// May act on every resource regardless of team membership
    Admin,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Member => write!(f, "member"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    email: Email,
    /// PHC-encoded password hash, carries its own cost parameters
    #[serde(skip_serializing)]
    password_hash: String,
    /// SHA-256 digest of the current API key, if one was issued
    #[serde(skip_serializing)]
    api_key_hash: Option<String>,
    role: UserRole,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_login_at: Option<DateTime<Utc>>,
    /// Bumped on every persisted change, used for compare-and-set
    version: u64,
}

impl User {
    /// Create a new user
    pub fn new(email: Email, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            email,
            password_hash: password_hash.into(),
            api_key_hash: None,
            role: UserRole::Member,
            created_at: now,
            updated_at: now,
            last_login_at: None,
            version: 0,
        }
    }

    // Getters

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn api_key_hash(&self) -> Option<&str> {
        self.api_key_hash.as_deref()
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn last_login_at(&self) -> Option<DateTime<Utc>> {
        self.last_login_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    // Mutators

    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
        self.touch();
    }

    pub fn set_api_key_hash(&mut self, api_key_hash: Option<String>) {
        self.api_key_hash = api_key_hash;
        self.touch();
    }

    pub fn set_role(&mut self, role: UserRole) {
        self.role = role;
        self.touch();
    }

    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.last_login_at = Some(at);
    }

    /// Called by repositories after a successful compare-and-set
    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user(email: &str) -> User {
        User::new(Email::parse(email).unwrap(), "hashed_password")
    }

    #[test]
    fn test_email_is_normalized() {
        let email = Email::parse(" Alice@Example.com").unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
    }

    #[test]
    fn test_email_invalid() {
        assert!(Email::parse("").is_err());
        assert!(Email::parse("not-an-email").is_err());
    }

    #[test]
    fn test_email_deserialization_validates() {
        let parsed: Result<Email, _> = serde_json::from_str("\"Bob@Example.com\"");
        assert_eq!(parsed.unwrap().as_str(), "bob@example.com");

        let invalid: Result<Email, _> = serde_json::from_str("\"bob\"");
        assert!(invalid.is_err());
    }

    #[test]
    fn test_user_creation() {
        let user = create_test_user("alice@example.com");

        assert_eq!(user.email().as_str(), "alice@example.com");
        assert_eq!(user.password_hash(), "hashed_password");
        assert_eq!(user.role(), UserRole::Member);
        assert!(!user.is_admin());
        assert!(user.api_key_hash().is_none());
        assert!(user.last_login_at().is_none());
        assert_eq!(user.version(), 0);
    }

    #[test]
    fn test_user_role_change() {
        let mut user = create_test_user("alice@example.com");
        user.set_role(UserRole::Admin);
        assert!(user.is_admin());
    }

    #[test]
    fn test_user_update_password() {
        let mut user = create_test_user("alice@example.com");
        let original_updated = user.updated_at();

        std::thread::sleep(std::time::Duration::from_millis(10));

        user.set_password_hash("new_hash");
        assert_eq!(user.password_hash(), "new_hash");
        assert!(user.updated_at() > original_updated);
    }

    #[test]
    fn test_user_serialization_excludes_secrets() {
        let mut user = create_test_user("alice@example.com");
        user.set_api_key_hash(Some("sha256$digest".to_string()));

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("hashed_password"));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("digest"));
    }
}
