//! Team domain module
//!
//! Teams are named sets of users sharing authorization scope over resources.
//! Each team is mirrored as a group in the repository backend.

mod dependents;
mod entity;
mod repository;
mod validation;

pub use dependents::{NoDependents, TeamDependents};
pub use entity::{Team, TeamName};
pub use repository::TeamRepository;
pub use validation::{validate_team_name, TeamValidationError};

#[cfg(test)]
pub use repository::mock::MockTeamRepository;
