//! Password hashing utilities using Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as Argon2PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Trait for password hashing operations
pub trait PasswordHasher: Send + Sync + Debug {
    /// Hash a password with the configured cost
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Verify a password against a hash, using the cost embedded in the hash
    fn verify(&self, password: &str, hash: &str) -> bool;

    /// Whether a stored hash was produced with a different cost than configured
    fn needs_rehash(&self, hash: &str) -> bool;
}

/// Work factor for new hashes
///
/// Existing hashes keep verifying after a change: each PHC string records the
/// parameters it was made with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Argon2 time cost (passes over memory)
    pub iterations: u32,
    /// Argon2 memory cost in KiB
    pub memory_kib: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            iterations: Params::DEFAULT_T_COST,
            memory_kib: Params::DEFAULT_M_COST,
        }
    }
}

impl HashCost {
    /// Cheapest accepted parameters, for tests
    pub fn minimal() -> Self {
        Self {
            iterations: Params::MIN_T_COST,
            memory_kib: Params::MIN_M_COST.max(64),
        }
    }
}

/// Argon2id password hasher
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Create a hasher producing hashes at `cost`
    pub fn new(cost: HashCost) -> Result<Self, DomainError> {
        let params = Params::new(cost.memory_kib, cost.iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| DomainError::internal(format!("Invalid hash cost: {}", e)))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::internal(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        // Parameters come from the parsed hash, not from self
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn needs_rehash(&self, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return true;
        };

        match Params::try_from(&parsed_hash) {
            Ok(params) => {
                params.t_cost() != self.params.t_cost() || params.m_cost() != self.params.m_cost()
            }
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Argon2Hasher {
        Argon2Hasher::new(HashCost::minimal()).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = hasher();
        let password = "my_secure_password";

        let hash = hasher.hash(password).unwrap();

        assert!(hasher.verify(password, &hash));
        assert!(!hasher.verify("wrong_password", &hash));
    }

    #[test]
    fn test_hash_is_unique() {
        let hasher = hasher();
        let password = "my_secure_password";

        let hash1 = hasher.hash(password).unwrap();
        let hash2 = hasher.hash(password).unwrap();

        // Hashes should be different due to random salt
        assert_ne!(hash1, hash2);

        assert!(hasher.verify(password, &hash1));
        assert!(hasher.verify(password, &hash2));
    }

    #[test]
    fn test_hash_embeds_cost() {
        let hash = hasher().hash("s3cret!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("t=1"));
    }

    #[test]
    fn test_raised_cost_still_verifies_old_hashes() {
        let old = hasher();
        let hash = old.hash("s3cret!").unwrap();

        let raised = Argon2Hasher::new(HashCost {
            iterations: 2,
            memory_kib: 128,
        })
        .unwrap();

        assert!(raised.verify("s3cret!", &hash));
        assert!(raised.needs_rehash(&hash));
        assert!(!old.needs_rehash(&hash));
    }

    #[test]
    fn test_verify_invalid_hash() {
        let hasher = hasher();

        assert!(!hasher.verify("password", "invalid_hash_format"));
        assert!(!hasher.verify("password", ""));
        assert!(hasher.needs_rehash("invalid_hash_format"));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        let result = Argon2Hasher::new(HashCost {
            iterations: 0,
            memory_kib: 64,
        });
        assert!(result.is_err());
    }
}
