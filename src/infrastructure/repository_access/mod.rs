//! Repository access coordination
//!
//! The coordinator converges an external repository backend onto the team
//! registry; the in-memory backend stands in for a real forge.

mod coordinator;
mod in_memory;

pub use coordinator::{CoordinatorConfig, RepositoryAccessCoordinator, SyncReport};
pub use in_memory::{BackendCall, InMemoryRepositoryManager};
