//! Bearer secret generation
//!
//! Generates unguessable secrets (session tokens, reset tokens, API keys) and
//! the digests they are stored under.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::domain::TokenValue;

/// Minimum entropy of any generated secret
pub const MIN_SECRET_BYTES: usize = 24;

/// Result of generating a new secret
#[derive(Debug, Clone)]
pub struct GeneratedSecret {
    /// Plaintext value, returned to the caller once
    pub value: TokenValue,
    /// Digest persisted in place of the value
    pub hash: String,
}

/// Generator for prefixed random secrets
#[derive(Debug, Clone)]
pub struct SecretGenerator {
    /// Prefix identifying the kind of secret (e.g. "gts_")
    prefix: String,
    /// Number of random bytes to generate
    secret_bytes: usize,
}

impl SecretGenerator {
    /// Create a new generator, 32 random bytes by default
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            secret_bytes: 32,
        }
    }

    /// Session tokens
    pub fn session() -> Self {
        Self::new("gts_")
    }

    /// Password reset tokens
    pub fn reset() -> Self {
        Self::new("gtr_")
    }

    /// Long-lived API keys
    pub fn api_key() -> Self {
        Self::new("gtk_")
    }

    /// Set the number of random bytes, never below [`MIN_SECRET_BYTES`]
    pub fn with_secret_bytes(mut self, bytes: usize) -> Self {
        self.secret_bytes = bytes.max(MIN_SECRET_BYTES);
        self
    }

    /// Generate a new secret
    pub fn generate(&self) -> GeneratedSecret {
        let mut random_bytes = vec![0u8; self.secret_bytes];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        let value = format!("{}{}", self.prefix, URL_SAFE_NO_PAD.encode(&random_bytes));
        let hash = Self::hash(&value);

        GeneratedSecret {
            value: TokenValue::new(value),
            hash,
        }
    }

    /// Digest a secret for storage and lookup
    pub fn hash(value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        let result = hasher.finalize();
        format!("sha256${}", URL_SAFE_NO_PAD.encode(result))
    }
}

/// Extract the token from an `Authorization` header value
///
/// Accepts `bearer <token>` in any case, or a bare token.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let header = header.trim();

    let token = match header.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        Some(_) => return None,
        None if header.eq_ignore_ascii_case("bearer") => return None,
        None => header,
    };

    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
