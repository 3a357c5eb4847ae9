//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL through `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. No business rules live here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Conditional writes**: the settlement transaction guards every status
//!   change with the expected prior status and row locks.
//!
//! # Example
//!
//! ```ignore
//! use docket::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/docket")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_case_file_repository;
mod diesel_case_repository;
mod diesel_error_mapping;
mod diesel_payment_repository;
mod diesel_quote_repository;
mod diesel_transactional_store;
mod diesel_user_repository;
mod migrations;
mod models;
mod paging;
mod pool;
mod schema;

pub use diesel_case_file_repository::DieselCaseFileRepository;
pub use diesel_case_repository::DieselCaseRepository;
pub use diesel_payment_repository::DieselPaymentRepository;
pub use diesel_quote_repository::DieselQuoteRepository;
pub use diesel_transactional_store::DieselTransactionalStore;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
