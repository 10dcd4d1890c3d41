// Password hashing and verification (Argon2id)

use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, Secret};
use std::fmt;

use crate::core::errors::{AppError, HashingError};
use crate::core::models::PasswordHash;

const SALT_LEN: usize = 16;

/// Plaintext password wrapper with memory protection
///
/// Uses `secrecy::Secret` so the plaintext never shows up in logs or debug output.
pub struct Password(Secret<String>);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(Secret::new(password.into()))
    }

    /// Expose the plaintext (use with caution)
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Password")
            .field("value", &"<REDACTED>")
            .finish()
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<REDACTED>")
    }
}

/// Argon2id password hasher
///
/// Stateless apart from its cost parameters, so one instance is shared by all requests.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    mem_cost_kib: u32,
    time_cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        let defaults = argon2::Config::default();
        Self {
            mem_cost_kib: defaults.mem_cost,
            time_cost: defaults.time_cost,
        }
    }
}

impl PasswordHasher {
    /// Create a hasher with explicit memory (KiB) and iteration costs
    pub fn with_cost(mem_cost_kib: u32, time_cost: u32) -> Self {
        Self {
            mem_cost_kib,
            time_cost,
        }
    }

    fn argon2_config(&self) -> argon2::Config<'static> {
        argon2::Config {
            variant: argon2::Variant::Argon2id,
            mem_cost: self.mem_cost_kib,
            time_cost: self.time_cost,
            ..argon2::Config::default()
        }
    }

    /// Hash a password with a fresh random salt
    ///
    /// The salt and parameters are embedded in the PHC-encoded output, so two
    /// calls with the same password produce different hashes.
    pub fn hash(&self, password: &Password) -> Result<PasswordHash, HashingError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| HashingError::Randomness(e.to_string()))?;

        let encoded = argon2::hash_encoded(
            password.expose_secret().as_bytes(),
            &salt,
            &self.argon2_config(),
        )
        .map_err(|e| HashingError::Algorithm(e.to_string()))?;

        Ok(PasswordHash::new(encoded))
    }

    /// Verify a password against a stored hash
    ///
    /// A mismatch is `Ok(false)`; only an undecodable stored hash is an error.
    /// The comparison is constant-time inside `argon2::verify_encoded`.
    pub fn verify(&self, password: &Password, hash: &PasswordHash) -> Result<bool, HashingError> {
        argon2::verify_encoded(hash.as_str(), password.expose_secret().as_bytes())
            .map_err(|e| HashingError::MalformedHash(e.to_string()))
    }

    /// Hash on the blocking pool so the async runtime is not stalled
    pub async fn hash_blocking(&self, password: Password) -> Result<PasswordHash, AppError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| HashingError::Algorithm(format!("hashing task failed: {}", e)))?
            .map_err(AppError::from)
    }

    /// Verify on the blocking pool
    pub async fn verify_blocking(
        &self,
        password: Password,
        hash: PasswordHash,
    ) -> Result<bool, AppError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| HashingError::Algorithm(format!("verification task failed: {}", e)))?
            .map_err(AppError::from)
    }
}
