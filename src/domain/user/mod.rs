//! User domain
//!
//! This module provides domain types and traits for user identity,
//! including the email-keyed user entity, validation, and repository trait.

mod entity;
mod repository;
mod validation;

pub use entity::{Email, User, UserRole};
pub use repository::UserRepository;
pub use validation::{
    normalize_email, validate_email, validate_password, PasswordPolicy, UserValidationError,
};

#[cfg(test)]
pub use repository::mock::MockUserRepository;
