//! Credential hashing and verification with Argon2id

use crate::auth::AuthError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

/// One-way salted hashing of account credentials
#[derive(Clone, Default)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// Hasher with the crate's default Argon2id parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Hasher with explicit cost parameters (memory in KiB, iterations, lanes)
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, AuthError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        Ok(CredentialHasher {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a secret into a PHC string with a fresh random salt
    pub fn hash(&self, secret: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Check a presented secret against a stored hash.
    ///
    /// The secret is re-hashed with the salt and parameters embedded in
    /// `stored_hash` and the outputs are compared in constant time. A stored
    /// hash that cannot be parsed is a mismatch, not an error; only a failure
    /// of the hashing primitive itself is reported as `Err`.
    pub fn verify(&self, stored_hash: &str, secret: &str) -> Result<bool, AuthError> {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(false),
        };

        match self.argon2.verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Crypto) => {
                Err(AuthError::Hashing("argon2 primitive failure".to_string()))
            }
            Err(_) => Ok(false),
        }
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher").finish_non_exhaustive()
    }
}
