//! User infrastructure module
//!
//! This module provides the credential store: password hashing with Argon2,
//! the in-memory repository, and the credential service.

mod password;
mod repository;
mod service;

pub use password::{Argon2Hasher, HashCost, PasswordHasher};
pub use repository::InMemoryUserRepository;
pub use service::{CredentialService, PasswordChangeError};
