//! Argon2id password hashing.
//!
//! Hashing is CPU-bound, so both operations run on the blocking pool.

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::Argon2;
use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// Password hasher using Argon2id with the crate's default parameters.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2PasswordHasher;

async fn blocking<T, F>(task: F) -> Result<T, PasswordHashError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, PasswordHashError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|error| PasswordHashError::hashing(format!("hashing task failed: {error}")))?
}

#[async_trait]
impl PasswordHasher for Argon2PasswordHasher {
    async fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let password = Zeroizing::new(password.to_owned());
        blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|error| PasswordHashError::hashing(error.to_string()))
        })
        .await
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        let password = Zeroizing::new(password.to_owned());
        let hash = hash.to_owned();
        blocking(move || {
            let parsed = PasswordHash::new(&hash)
                .map_err(|error| PasswordHashError::hashing(error.to_string()))?;
            match Argon2::default().verify_password(password.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(error) => Err(PasswordHashError::hashing(error.to_string())),
            }
        })
        .await
    }
}
