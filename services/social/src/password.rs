//! Password hashing with Argon2id

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use tracing::{error, warn};

use crate::error::{ApiError, ApiResult};

/// Salted one-way hashing of account passwords
#[derive(Clone)]
pub struct PasswordService {
    params: Params,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl PasswordService {
    /// Hasher with explicit Argon2 cost parameters
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> ApiResult<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| ApiError::Internal(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt, returning a PHC string
    pub fn hash(&self, password: &str) -> ApiResult<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Failed to hash password: {}", e);
                ApiError::Internal("Failed to hash password".to_string())
            })
    }

    /// Check a password against a stored PHC string
    ///
    /// A mismatch or an unparsable digest is a negative answer, not an error.
    /// Parameters are read from the digest itself.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password hash is unreadable: {}", e);
                return false;
            }
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

impl PasswordService {
    /// [`hash`](Self::hash) on the blocking thread pool
    pub async fn spawn_hash(&self, password: String) -> ApiResult<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ApiError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    /// [`verify`](Self::verify) on the blocking thread pool
    pub async fn spawn_verify(&self, password: String, digest: String) -> ApiResult<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| ApiError::Internal(format!("Password verification task failed: {}", e)))
    }
}
