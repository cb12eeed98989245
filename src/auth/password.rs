use std::{sync::Arc, time::Duration};

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

use crate::config::PasswordConfig;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("stored password hash is malformed: {0}")]
    Comparison(String),
    #[error("password hashing timed out")]
    Timeout,
}

/// Argon2id hasher with a fixed work factor.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    dummy_hash: Arc<str>,
}

impl PasswordService {
    pub fn new(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid password hashing parameters: {}", e))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(b"no-such-account", &salt)
            .map_err(|e| anyhow::anyhow!("hash dummy password: {}", e))?
            .to_string();
        Ok(Self {
            argon2,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// A valid hash no user's password matches, for verifying unknown logins.
    pub fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }

    pub fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                PasswordError::Hashing(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// `Ok(false)` on mismatch; errors only when `hash` cannot be parsed.
    pub fn verify(&self, plain: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            PasswordError::Comparison(e.to_string())
        })?;
        Ok(self
            .argon2
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }

    /// Hashes on the blocking pool, giving up after `limit`.
    pub async fn hash_bounded(
        &self,
        plain: String,
        limit: Duration,
    ) -> Result<String, PasswordError> {
        let this = self.clone();
        run_blocking(limit, move || this.hash(&plain)).await
    }

    pub async fn verify_bounded(
        &self,
        plain: String,
        hash: String,
        limit: Duration,
    ) -> Result<bool, PasswordError> {
        let this = self.clone();
        run_blocking(limit, move || this.verify(&plain, &hash)).await
    }
}

async fn run_blocking<T, F>(limit: Duration, f: F) -> Result<T, PasswordError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PasswordError> + Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(res)) => res,
        Ok(Err(join)) => Err(PasswordError::Hashing(join.to_string())),
        Err(_) => Err(PasswordError::Timeout),
    }
}
