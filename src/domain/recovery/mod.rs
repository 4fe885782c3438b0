//! Password recovery domain

mod entity;
mod repository;

pub use entity::ResetToken;
pub use repository::ResetTokenRepository;
