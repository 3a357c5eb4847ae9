//! Port abstraction for account persistence.
use async_trait::async_trait;

use crate::domain::{EmailAddress, User, UserId};

use super::RepositoryError;

/// Account storage.
///
/// Email addresses are unique; a duplicate insert fails with
/// [`RepositoryError::UniqueViolation`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account.
    async fn create(&self, user: &User) -> Result<(), RepositoryError>;

    /// Fetch an account by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Fetch an account by its normalised email address.
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, RepositoryError>;
}
