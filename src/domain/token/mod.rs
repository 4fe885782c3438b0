//! Session token domain

mod entity;
mod repository;

pub use entity::{IssuedToken, SessionToken, TokenStatus, TokenValue};
pub use repository::TokenRepository;

#[cfg(test)]
pub use repository::mock::MockTokenRepository;
