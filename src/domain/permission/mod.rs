//! Permission domain

mod resolver;
mod resource;

pub use resolver::{check_user_access, resolve, Decision, DenyReason, Grant, TeamSnapshot};
pub use resource::{ResourceCatalog, ResourceId};
