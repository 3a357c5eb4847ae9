//! Driving port for signup, login and profile lookups.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, SignupDraft, User, UserId};

/// Account use-cases consumed by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Register a new account.
    ///
    /// # Errors
    ///
    /// `invalid_request` for malformed input, `conflict` when the email is
    /// already registered.
    async fn signup(&self, draft: SignupDraft) -> Result<User, Error>;

    /// Check credentials and return the account.
    ///
    /// # Errors
    ///
    /// `unauthorized` when the email is unknown or the password is wrong.
    async fn login(&self, credentials: LoginCredentials) -> Result<User, Error>;

    /// Fetch the signed-in account.
    async fn profile(&self, user_id: &UserId) -> Result<User, Error>;
}
