//! Account signup, login and profile service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    AccountService, PasswordHashError, PasswordHasher, RepositoryError, UserRepository,
};
use crate::domain::service_support::map_repository_error;
use crate::domain::{Error, LoginCredentials, SignupDetails, SignupDraft, User, UserId};

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(format!("credential processing failed: {error}"))
}

/// Account service implementing [`AccountService`].
#[derive(Clone)]
pub struct AccountsService<U, H> {
    users: Arc<U>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<U, H> AccountsService<U, H> {
    /// Create the service over a user repository and password hasher.
    pub fn new(users: Arc<U>, hasher: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            hasher,
            clock,
        }
    }
}

#[async_trait]
impl<U, H> AccountService for AccountsService<U, H>
where
    U: UserRepository,
    H: PasswordHasher,
{
    async fn signup(&self, draft: SignupDraft) -> Result<User, Error> {
        let details = SignupDetails::try_from_draft(draft)
            .map_err(|err| Error::invalid_request(err.to_string()))?;

        if self
            .users
            .find_by_email(&details.email)
            .await
            .map_err(map_repository_error)?
            .is_some()
        {
            return Err(Error::conflict("email is already registered"));
        }

        let password_hash = self
            .hasher
            .hash(details.password.as_str())
            .await
            .map_err(map_hash_error)?;
        let user = User {
            id: UserId::random(),
            email: details.email,
            password_hash,
            name: details.name,
            role: details.role,
            jurisdiction: details.jurisdiction,
            bar_number: details.bar_number,
            created_at: self.clock.utc(),
        };

        self.users.create(&user).await.map_err(|err| match err {
            RepositoryError::UniqueViolation { .. } => {
                Error::conflict("email is already registered")
            }
            other => map_repository_error(other),
        })?;
        info!(user_id = %user.id, role = %user.role, "account created");
        Ok(user)
    }

    async fn login(&self, credentials: LoginCredentials) -> Result<User, Error> {
        let Some(user) = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_repository_error)?
        else {
            return Err(Error::unauthorized("invalid credentials"));
        };

        let matches = self
            .hasher
            .verify(credentials.password(), &user.password_hash)
            .await
            .map_err(map_hash_error)?;
        if !matches {
            return Err(Error::unauthorized("invalid credentials"));
        }
        Ok(user)
    }

    async fn profile(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{FixturePasswordHasher, MockUserRepository};
    use mockable::DefaultClock;

    fn service(
        users: MockUserRepository,
    ) -> AccountsService<MockUserRepository, FixturePasswordHasher> {
        AccountsService::new(
            Arc::new(users),
            Arc::new(FixturePasswordHasher),
            Arc::new(DefaultClock),
        )
    }

    fn draft() -> SignupDraft {
        SignupDraft {
            email: "Counsel@Example.com".to_owned(),
            password: "long enough".to_owned(),
            name: "Counsel".to_owned(),
            role: "lawyer".to_owned(),
            jurisdiction: Some("SG".to_owned()),
            bar_number: Some("B-1".to_owned()),
        }
    }

    #[tokio::test]
    async fn signup_hashes_password_and_stores_user() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().return_once(|_| Ok(None));
        users
            .expect_create()
            .withf(|user| user.password_hash == "fixture$long enough")
            .times(1)
            .return_once(|_| Ok(()));

        let user = service(users).signup(draft()).await.expect("signup succeeds");
        assert_eq!(user.email.as_str(), "counsel@example.com");
        assert_eq!(user.bar_number.as_deref(), Some("B-1"));
    }

    #[tokio::test]
    async fn signup_maps_unique_violation_to_conflict() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().return_once(|_| Ok(None));
        users
            .expect_create()
            .return_once(|_| Err(RepositoryError::unique_violation("users_email_key")));

        let err = service(users).signup(draft()).await.expect_err("duplicate");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let stored = User {
            id: UserId::random(),
            email: crate::domain::EmailAddress::parse("a@b.co").expect("email"),
            password_hash: "fixture$right password".to_owned(),
            name: "A".to_owned(),
            role: crate::domain::Role::Client,
            jurisdiction: None,
            bar_number: None,
            created_at: chrono::Utc::now(),
        };
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .return_once(move |_| Ok(Some(stored)));

        let credentials =
            LoginCredentials::try_from_parts("a@b.co", "wrong password").expect("shape");
        let err = service(users).login(credentials).await.expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn login_rejects_unknown_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().return_once(|_| Ok(None));

        let credentials = LoginCredentials::try_from_parts("x@y.co", "whatever").expect("shape");
        let err = service(users).login(credentials).await.expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}
