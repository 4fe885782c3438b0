//! Authorization decision
//!
//! Flat model: a user may act on a resource when they are an admin or a direct
//! member of at least one team the resource is assigned to. Every lookup gap
//! resolves to a denial.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::team::{Team, TeamName};
use crate::domain::user::{Email, User};

/// Why access was granted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    Admin,
    TeamMember(TeamName),
}

/// Why access was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    UnknownUser,
    UnknownResource,
    NotAMember,
    /// A collaborator failed while gathering the inputs
    LookupFailed,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownUser => write!(f, "unknown user"),
            Self::UnknownResource => write!(f, "unknown resource"),
            Self::NotAMember => write!(f, "not a member of any owning team"),
            Self::LookupFailed => write!(f, "authorization lookup failed"),
        }
    }
}

/// Outcome of an authorization check, never ambiguous
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed(Grant),
    Denied(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }
}

/// Point-in-time view of team memberships
#[derive(Debug, Clone, Default)]
pub struct TeamSnapshot {
    members: BTreeMap<TeamName, BTreeSet<Email>>,
}

impl TeamSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_teams<'a>(teams: impl IntoIterator<Item = &'a Team>) -> Self {
        let members = teams
            .into_iter()
            .map(|t| (t.name().clone(), t.members().clone()))
            .collect();
        Self { members }
    }

    /// Builder used mostly by tests
    pub fn with_team(
        mut self,
        team: TeamName,
        members: impl IntoIterator<Item = Email>,
    ) -> Self {
        self.members.insert(team, members.into_iter().collect());
        self
    }

    pub fn is_member(&self, team: &TeamName, user: &Email) -> bool {
        self.members
            .get(team)
            .is_some_and(|members| members.contains(user))
    }
}

/// Decide whether `user` may act on a resource owned by `resource_teams`
///
/// `None` for either input means the lookup found nothing.
pub fn resolve(
    user: Option<&User>,
    resource_teams: Option<&BTreeSet<TeamName>>,
    snapshot: &TeamSnapshot,
) -> Decision {
    let Some(user) = user else {
        return Decision::Denied(DenyReason::UnknownUser);
    };

    let Some(resource_teams) = resource_teams else {
        return Decision::Denied(DenyReason::UnknownResource);
    };

    if user.is_admin() {
        return Decision::Allowed(Grant::Admin);
    }

    resource_teams
        .iter()
        .find(|team| snapshot.is_member(team, user.email()))
        .map(|team| Decision::Allowed(Grant::TeamMember(team.clone())))
        .unwrap_or(Decision::Denied(DenyReason::NotAMember))
}

/// Whether `user` directly belongs to any of the named teams
pub fn check_user_access(team_names: &[TeamName], user: &Email, snapshot: &TeamSnapshot) -> bool {
    team_names.iter().any(|team| snapshot.is_member(team, user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::UserRole;

    fn email(value: &str) -> Email {
        Email::parse(value).unwrap()
    }

    fn team(name: &str) -> TeamName {
        TeamName::new(name).unwrap()
    }

    fn user(value: &str) -> User {
        User::new(email(value), "hash")
    }

    fn teams(names: &[&str]) -> BTreeSet<TeamName> {
        names.iter().map(|n| team(n)).collect()
    }

    #[test]
    fn test_member_of_owning_team_is_allowed() {
        let snapshot = TeamSnapshot::new().with_team(team("core"), [email("alice@example.com")]);
        let alice = user("alice@example.com");

        let decision = resolve(Some(&alice), Some(&teams(&["core"])), &snapshot);
        assert_eq!(decision, Decision::Allowed(Grant::TeamMember(team("core"))));
    }

    #[test]
    fn test_non_member_is_denied() {
        let snapshot = TeamSnapshot::new()
            .with_team(team("core"), [email("alice@example.com")])
            .with_team(team("ops"), [email("bob@example.com")]);
        let bob = user("bob@example.com");

        let decision = resolve(Some(&bob), Some(&teams(&["core"])), &snapshot);
        assert_eq!(decision, Decision::Denied(DenyReason::NotAMember));
    }

    #[test]
    fn test_any_owning_team_suffices() {
        let snapshot = TeamSnapshot::new().with_team(team("ops"), [email("bob@example.com")]);
        let bob = user("bob@example.com");

        let decision = resolve(Some(&bob), Some(&teams(&["core", "ops"])), &snapshot);
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_admin_is_allowed_without_membership() {
        let mut admin = user("root@example.com");
        admin.set_role(UserRole::Admin);

        let decision = resolve(Some(&admin), Some(&teams(&["core"])), &TeamSnapshot::new());
        assert_eq!(decision, Decision::Allowed(Grant::Admin));
    }

    #[test]
    fn test_unknown_inputs_fail_closed() {
        let mut admin = user("root@example.com");
        admin.set_role(UserRole::Admin);

        assert_eq!(
            resolve(None, Some(&teams(&["core"])), &TeamSnapshot::new()),
            Decision::Denied(DenyReason::UnknownUser)
        );
        assert_eq!(
            resolve(Some(&admin), None, &TeamSnapshot::new()),
            Decision::Denied(DenyReason::UnknownResource)
        );
    }

    #[test]
    fn test_resource_without_teams_denies_members() {
        let alice = user("alice@example.com");
        let decision = resolve(Some(&alice), Some(&BTreeSet::new()), &TeamSnapshot::new());
        assert_eq!(decision, Decision::Denied(DenyReason::NotAMember));
    }

    #[test]
    fn test_check_user_access() {
        let snapshot = TeamSnapshot::new().with_team(team("core"), [email("alice@example.com")]);

        assert!(check_user_access(
            &[team("ops"), team("core")],
            &email("alice@example.com"),
            &snapshot
        ));
        assert!(!check_user_access(&[team("ops")], &email("alice@example.com"), &snapshot));
        assert!(!check_user_access(&[], &email("alice@example.com"), &snapshot));
    }
}
