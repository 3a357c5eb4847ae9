//! Shared `bb8` pool of `diesel-async` PostgreSQL connections.
//!
//! One pool backs every Diesel repository and the transactional store. Pool
//! failures surface as [`PoolError`], which repositories report as
//! `RepositoryError::Connection`.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

use crate::domain::ports::define_port_error;

const DEFAULT_MAX_SIZE: u32 = 10;
const DEFAULT_MIN_IDLE: u32 = 2;
const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

define_port_error! {
    /// Failures raised by the connection pool itself.
    pub enum PoolError {
        /// No connection became available before the checkout timeout.
        Checkout { message: String } => "failed to get connection from pool: {message}",
        /// The pool could not be created.
        Build { message: String } => "failed to build connection pool: {message}",
    }
}

/// Pool sizing and the database to connect to.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use docket::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://docket@localhost/docket")
///     .with_max_size(20)
///     .with_connection_timeout(Duration::from_secs(5));
/// assert_eq!(config.database_url(), "postgres://docket@localhost/docket");
/// assert_eq!(config.max_size(), 20);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    min_idle: Option<u32>,
    connection_timeout: Duration,
}

impl PoolConfig {
    /// Ten connections, two kept idle, thirty-second checkout timeout.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: DEFAULT_MAX_SIZE,
            min_idle: Some(DEFAULT_MIN_IDLE),
            connection_timeout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Cap the pool size. The idle floor is clamped so it never exceeds it.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self.min_idle = self.min_idle.map(|idle| idle.min(self.max_size));
        self
    }

    #[must_use]
    pub fn with_min_idle(mut self, min_idle: Option<u32>) -> Self {
        self.min_idle = min_idle.map(|idle| idle.min(self.max_size));
        self
    }

    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }
}

/// Cloneable handle to the connection pool.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool and open its idle connections.
    ///
    /// # Errors
    ///
    /// [`PoolError::Build`] when the URL is invalid or the server refuses
    /// the initial connections.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url);
        Pool::builder()
            .max_size(config.max_size)
            .min_idle(config.min_idle)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map(|inner| Self { inner })
            .map_err(|err| PoolError::build(err.to_string()))
    }

    /// Borrow a connection for a single repository call.
    ///
    /// # Errors
    ///
    /// [`PoolError::Checkout`] once the checkout timeout elapses.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }

    /// Check out a connection that outlives the borrow of the pool, as a
    /// transaction spanning several repository calls needs.
    ///
    /// # Errors
    ///
    /// [`PoolError::Checkout`] once the checkout timeout elapses.
    pub async fn get_owned(
        &self,
    ) -> Result<PooledConnection<'static, AsyncPgConnection>, PoolError> {
        self.inner
            .get_owned()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}
