//! Team infrastructure module
//!
//! This module provides the team registry: in-memory storage, the dependents
//! registry and the team service.

mod dependents;
mod repository;
mod service;

pub use dependents::InMemoryTeamDependents;
pub use repository::InMemoryTeamRepository;
pub use service::{TeamService, TeamServiceConfig};
