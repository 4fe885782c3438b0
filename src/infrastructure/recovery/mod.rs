//! Password recovery infrastructure

mod repository;
mod service;

pub use repository::InMemoryResetTokenRepository;
pub use service::{RecoveryConfig, RecoveryService};
