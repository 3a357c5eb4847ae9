//! Driven ports for case-file object storage.

use std::time::Duration;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by object storage adapters.
    pub enum ObjectStorageError {
        /// The key is malformed or escapes the storage root.
        InvalidKey { key: String } => "invalid object key: {key}",
        /// No object is stored under the key.
        NotFound { key: String } => "object not found: {key}",
        /// A signed URL carried a bad or expired signature.
        InvalidSignature => "download signature is invalid or expired",
        /// The backing store failed.
        Io { message: String } => "object storage failed: {message}",
    }
}

/// Stores case files and hands out time-limited download URLs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Write `bytes` under `key`, replacing any existing object.
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStorageError>;

    /// A URL granting read access to `key` for `ttl`.
    async fn presign_download(&self, key: &str, ttl: Duration)
    -> Result<String, ObjectStorageError>;
}

/// Serves objects behind URLs produced by [`ObjectStorage::presign_download`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SignedObjectReader: Send + Sync {
    /// Verify `signature` for `key` and `expires` (unix seconds) and return
    /// the object bytes.
    async fn read_signed(
        &self,
        key: &str,
        expires: i64,
        signature: &str,
    ) -> Result<Vec<u8>, ObjectStorageError>;
}
