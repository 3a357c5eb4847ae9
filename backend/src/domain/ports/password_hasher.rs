//! Driven port for password hashing.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised while hashing or verifying passwords.
    pub enum PasswordHashError {
        /// The hasher failed or the stored hash is unreadable.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// Hashes and verifies account passwords.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing hash string for storage.
    async fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Check `password` against a stored hash.
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError>;
}

/// Reversible stand-in for tests. Never use with real credentials.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePasswordHasher;

const FIXTURE_PREFIX: &str = "fixture$";

#[async_trait]
impl PasswordHasher for FixturePasswordHasher {
    async fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        Ok(format!("{FIXTURE_PREFIX}{password}"))
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        hash.strip_prefix(FIXTURE_PREFIX)
            .map(|stored| stored == password)
            .ok_or_else(|| PasswordHashError::hashing("not a fixture hash"))
    }
}
