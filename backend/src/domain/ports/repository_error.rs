//! Error type shared by every persistence port.

use super::define_port_error;

define_port_error! {
    /// Errors raised by persistence adapters.
    pub enum RepositoryError {
        /// The store could not be reached or a connection could not be
        /// checked out.
        Connection { message: String } => "repository connection failed: {message}",
        /// A query or mutation failed while executing.
        Query { message: String } => "repository query failed: {message}",
        /// A uniqueness constraint rejected the write.
        UniqueViolation { constraint: String } =>
            "unique constraint violated: {constraint}",
    }
}

/// Unique constraint guarding user email addresses.
pub const USERS_EMAIL_KEY: &str = "users_email_key";
/// Unique constraint guarding one quote per lawyer per case.
pub const QUOTES_CASE_LAWYER_KEY: &str = "quotes_case_id_lawyer_id_key";
/// Partial unique index allowing a single accepted quote per case.
pub const QUOTES_ONE_ACCEPTED_PER_CASE: &str = "quotes_one_accepted_per_case";
