//! Argon2id password hashing.

use super::errors::{AuthError, AuthResult};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use std::sync::Arc;

/// Argon2 work factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl HashingParams {
    /// Lowest cost Argon2 accepts. Only suitable for tests.
    pub fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Salted one-way password hasher.
///
/// Cloning is cheap; clones are moved into blocking tasks by the auth manager.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    pepper: Option<Arc<str>>,
}

impl PasswordHasher {
    /// Create a hasher with the given work factor and optional server-side pepper
    ///
    /// # Errors
    ///
    /// * `AuthError::Internal` - Argon2 rejected the parameters
    pub fn new(params: HashingParams, pepper: Option<String>) -> AuthResult<Self> {
        let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
            .map_err(|e| AuthError::Internal(format!("argon2 parameters: {e}")))?;

        Ok(Self {
            params,
            pepper: pepper.map(Into::into),
        })
    }

    /// Hash password with Argon2id (+ pepper), fresh salt on every call
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let peppered = self.pepper(password);
        let salt = SaltString::generate(&mut OsRng);

        Ok(self
            .argon2()
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify password against a stored hash.
    ///
    /// The cost parameters are read from the hash itself, so hashes produced
    /// under an older work factor keep verifying. A malformed hash is a mismatch.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };
        let peppered = self.pepper(password);

        self.argon2()
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .is_ok()
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn pepper(&self, password: &str) -> String {
        match &self.pepper {
            Some(pepper) => format!("{password}{pepper}"),
            None => password.to_string(),
        }
    }
}
