use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use super::AuthError;

/// Argon2id password hashing. Hashes are stored as PHC strings, so the
/// parameters used at hash time travel with each hash.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Uses the argon2 crate's recommended parameters.
    pub fn new() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }

    /// Uses explicit cost parameters (memory in KiB, iterations, lanes).
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, AuthError> {
        let params =
            Params::new(m_cost, t_cost, p_cost, None).map_err(|e| AuthError::Crypto(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hashes a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        use argon2::PasswordHasher as _;

        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Crypto(e.to_string()))
    }

    /// Returns true if `password` matches the stored hash. A malformed hash
    /// never matches.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        use argon2::PasswordVerifier as _;

        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// [`hash`](Self::hash) on the blocking thread pool, off the async workers.
    pub async fn hash_off_thread(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Crypto(e.to_string()))?
    }

    /// [`verify`](Self::verify) on the blocking thread pool, off the async workers.
    pub async fn verify_off_thread(
        &self,
        password: String,
        stored_hash: String,
    ) -> Result<bool, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| AuthError::Crypto(e.to_string()))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
