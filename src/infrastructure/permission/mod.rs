//! Permission infrastructure

mod catalog;
mod service;

pub use catalog::InMemoryResourceCatalog;
pub use service::PermissionService;
