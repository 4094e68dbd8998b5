//! Password hashing (Argon2id, PHC string format).
//!
//! The cost factor is the Argon2 time cost. Verification reads the
//! parameters back from the stored hash, so raising the configured cost
//! never invalidates existing hashes.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use crate::config::PasswordConfig;
use crate::error::AuthError;

/// Default time cost.
pub const DEFAULT_COST: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
    memory_kib: u32,
    parallelism: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            memory_kib: Params::DEFAULT_M_COST,
            parallelism: 1,
        }
    }

    pub fn with_params(cost: u32, memory_kib: u32, parallelism: u32) -> Self {
        Self {
            cost,
            memory_kib,
            parallelism,
        }
    }

    pub fn from_config(config: &PasswordConfig) -> Self {
        Self::with_params(config.cost, config.memory_kib, config.parallelism)
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash with the configured cost.
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        self.hash_with_cost(plaintext, self.cost)
    }

    /// Hash with an explicit cost; a fresh salt is generated per call.
    pub fn hash_with_cost(&self, plaintext: &str, cost: u32) -> Result<String, AuthError> {
        let params = Params::new(self.memory_kib, cost, self.parallelism, None)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);

        let hash = argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    /// Check `plaintext` against a stored PHC hash.
    ///
    /// The digest comparison is constant-time. Unparsable hashes compare as
    /// `false`.
    pub fn compare(&self, plaintext: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is not a valid PHC string");
                return false;
            }
        };

        Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}
