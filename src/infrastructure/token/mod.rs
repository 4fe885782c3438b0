//! Session token infrastructure
//!
//! Secret generation, in-memory storage and the token service.

mod generator;
mod repository;
mod service;

pub use generator::{parse_bearer, GeneratedSecret, SecretGenerator, MIN_SECRET_BYTES};
pub use repository::InMemoryTokenRepository;
pub use service::{TokenConfig, TokenService};
