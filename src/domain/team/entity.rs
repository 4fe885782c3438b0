//! Team entity and related types

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_team_name, TeamValidationError};
use crate::domain::user::Email;

/// Team name, globally unique, also used as the backend group name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamName(String);

impl TeamName {
    /// Create a new TeamName after validation
    pub fn new(name: impl Into<String>) -> Result<Self, TeamValidationError> {
        let name = name.into();
        validate_team_name(&name)?;
        Ok(Self(name))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TeamName {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamName> for String {
    fn from(name: TeamName) -> Self {
        name.0
    }
}

impl std::fmt::Display for TeamName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    name: TeamName,
    /// Member emails, a set: no duplicates, no order
    members: BTreeSet<Email>,
    created_by: Email,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Bumped on every persisted change, used for compare-and-set
    version: u64,
}

impl Team {
    /// Create a new team with its creator as the first member
    pub fn new(name: TeamName, creator: Email) -> Self {
        let now = Utc::now();
        let mut members = BTreeSet::new();
        members.insert(creator.clone());

        Self {
            name,
            members,
            created_by: creator,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    // Getters

    pub fn name(&self) -> &TeamName {
        &self.name
    }

    pub fn members(&self) -> &BTreeSet<Email> {
        &self.members
    }

    pub fn created_by(&self) -> &Email {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn contains(&self, user: &Email) -> bool {
        self.members.contains(user)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    // Mutators

    /// Add a member, returns false if already present
    pub fn add_member(&mut self, user: Email) -> bool {
        let added = self.members.insert(user);
        if added {
            self.touch();
        }
        added
    }

    /// Remove a member, returns false if absent
    pub fn remove_member(&mut self, user: &Email) -> bool {
        let removed = self.members.remove(user);
        if removed {
            self.touch();
        }
        removed
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

    fn email(value: &str) -> Email {
        Email::parse(value).unwrap()
    }

    #[test]
    fn test_team_name_valid() {
        let name = TeamName::new("core").unwrap();
        assert_eq!(name.as_str(), "core");
    }

    #[test]
    fn test_team_name_invalid() {
        assert!(TeamName::new("").is_err());
        assert!(TeamName::new("-core").is_err());
        assert!(TeamName::new("core team").is_err());
    }

    #[test]
    fn test_creator_is_first_member() {
        let team = Team::new(TeamName::new("core").unwrap(), email("alice@example.com"));

        assert_eq!(team.member_count(), 1);
        assert!(team.contains(&email("alice@example.com")));
        assert_eq!(team.created_by().as_str(), "alice@example.com");
    }

    #[test]
    fn test_add_member_is_set_semantics() {
        let mut team = Team::new(TeamName::new("core").unwrap(), email("alice@example.com"));

        assert!(team.add_member(email("bob@example.com")));
        assert!(!team.add_member(email("BOB@example.com")));
        assert_eq!(team.member_count(), 2);
    }

    #[test]
    fn test_remove_member() {
        let mut team = Team::new(TeamName::new("core").unwrap(), email("alice@example.com"));

        assert!(!team.remove_member(&email("bob@example.com")));
        assert!(team.remove_member(&email("alice@example.com")));
        assert_eq!(team.member_count(), 0);
    }
}
