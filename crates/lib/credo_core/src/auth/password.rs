//! Password hashing via bcrypt.
//!
//! bcrypt embeds a fresh random salt and the cost in every hash, and its
//! verification compares digests in constant time.

use thiserror::Error;

use crate::models::auth::StoredHash;

/// Default bcrypt cost factor.
pub const DEFAULT_COST: u32 = 10;

/// Range of cost factors bcrypt accepts.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Password hashing errors.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("bcrypt cost {0} is outside 4..=31")]
    InvalidCost(u32),

    /// Detail stays in `source()` for server-side diagnostics.
    #[error("Internal hashing failure")]
    Crypto(#[source] bcrypt::BcryptError),
}

/// Hashes and verifies passwords at a fixed cost.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: DEFAULT_COST }
    }
}

impl PasswordHasher {
    /// Hasher with a custom cost factor.
    pub fn with_cost(cost: u32) -> Result<Self, HashError> {
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(HashError::InvalidCost(cost));
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh salt.
    pub fn hash(&self, password: &str) -> Result<StoredHash, HashError> {
        if password.is_empty() {
            return Err(HashError::EmptyPassword);
        }
        bcrypt::hash(password, self.cost)
            .map(StoredHash::from)
            .map_err(HashError::Crypto)
    }

    /// Verify a password against a stored hash.
    ///
    /// Returns `false` for empty input, a mismatch, or a hash bcrypt cannot
    /// parse.
    pub fn verify(&self, password: &str, hash: &StoredHash) -> bool {
        if password.is_empty() || hash.is_empty() {
            return false;
        }
        bcrypt::verify(password, hash.as_str()).unwrap_or(false)
    }
}
