//! Local filesystem object storage with signed, expiring download URLs.
//!
//! Objects live beneath a capability-scoped root directory, so keys can never
//! reach outside it. Download URLs have the shape
//! `{public_base}/{key}?expires={unix}&signature={hex}` where the signature
//! is an HMAC-SHA256 of `"{key}:{expires}"`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use hmac::{Hmac, Mac};
use mockable::Clock;
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::ports::{ObjectStorage, ObjectStorageError, SignedObjectReader};

type HmacSha256 = Hmac<Sha256>;

/// Object storage rooted in a local directory.
pub struct LocalObjectStorage {
    root: Arc<Dir>,
    public_base: String,
    signing_key: Zeroizing<Vec<u8>>,
    clock: Arc<dyn Clock>,
}

impl LocalObjectStorage {
    /// Open (creating if needed) the storage root.
    ///
    /// # Errors
    ///
    /// Returns `ObjectStorageError::Io` when the directory cannot be created
    /// or opened.
    pub fn open(
        root: &Path,
        public_base: impl Into<String>,
        signing_key: impl Into<Vec<u8>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ObjectStorageError> {
        Dir::create_ambient_dir_all(root, ambient_authority()).map_err(|error| io_error(root, error))?;
        let dir =
            Dir::open_ambient_dir(root, ambient_authority()).map_err(|error| io_error(root, error))?;
        Ok(Self {
            root: Arc::new(dir),
            public_base: public_base.into().trim_end_matches('/').to_owned(),
            signing_key: Zeroizing::new(signing_key.into()),
            clock,
        })
    }

    fn mac_for(&self, key: &str, expires: i64) -> Result<HmacSha256, ObjectStorageError> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|error| ObjectStorageError::io(error.to_string()))?;
        mac.update(format!("{key}:{expires}").as_bytes());
        Ok(mac)
    }
}

fn io_error(path: &Path, error: std::io::Error) -> ObjectStorageError {
    ObjectStorageError::io(format!("{}: {error}", path.display()))
}

/// Keys are relative, slash-separated paths of `[A-Za-z0-9._-]` segments.
fn validate_key(key: &str) -> Result<&Path, ObjectStorageError> {
    let valid_segment = |segment: &str| {
        !segment.is_empty()
            && segment != "."
            && segment != ".."
            && segment
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
    };
    if key.split('/').all(valid_segment) {
        Ok(Path::new(key))
    } else {
        Err(ObjectStorageError::invalid_key(key))
    }
}

async fn blocking<T, F>(task: F) -> Result<T, ObjectStorageError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ObjectStorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|error| ObjectStorageError::io(format!("storage task failed: {error}")))?
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStorageError> {
        let path = validate_key(key)?.to_path_buf();
        let root = Arc::clone(&self.root);
        let size = bytes.len();
        blocking(move || {
            let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
            if !parent.as_os_str().is_empty() {
                root.create_dir_all(&parent)
                    .map_err(|error| io_error(&parent, error))?;
            }
            let staged = PathBuf::from(format!(
                "{}.{}.partial",
                path.display(),
                Uuid::new_v4().simple()
            ));
            root.write(&staged, &bytes)
                .map_err(|error| io_error(&staged, error))?;
            root.rename(&staged, &root, &path).map_err(|error| {
                let _ = root.remove_file(&staged);
                io_error(&path, error)
            })
        })
        .await?;
        debug!(%key, size, %content_type, "stored object");
        Ok(())
    }

    async fn presign_download(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<String, ObjectStorageError> {
        validate_key(key)?;
        let ttl_seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires = self.clock.utc().timestamp().saturating_add(ttl_seconds);
        let signature = hex::encode(self.mac_for(key, expires)?.finalize().into_bytes());
        Ok(format!(
            "{}/{key}?expires={expires}&signature={signature}",
            self.public_base
        ))
    }
}

#[async_trait]
impl SignedObjectReader for LocalObjectStorage {
    async fn read_signed(
        &self,
        key: &str,
        expires: i64,
        signature: &str,
    ) -> Result<Vec<u8>, ObjectStorageError> {
        let path = validate_key(key)?.to_path_buf();
        if self.clock.utc().timestamp() > expires {
            return Err(ObjectStorageError::invalid_signature());
        }
        let provided =
            hex::decode(signature).map_err(|_| ObjectStorageError::invalid_signature())?;
        self.mac_for(key, expires)?
            .verify_slice(&provided)
            .map_err(|_| ObjectStorageError::invalid_signature())?;

        let root = Arc::clone(&self.root);
        let owned_key = key.to_owned();
        blocking(move || {
            root.read(&path).map_err(|error| match error.kind() {
                std::io::ErrorKind::NotFound => ObjectStorageError::not_found(owned_key),
                _ => io_error(&path, error),
            })
        })
        .await
    }
}
