use std::future::Future;

use super::key::SnapshotKey;
use super::record::SnapshotMetadata;

/// Errors raised by a snapshot store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("snapshot store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("invalid application namespace: {0:?}")]
    InvalidNamespace(String),
    #[error("application namespace does not exist: {0}")]
    MissingNamespace(String),
    #[error("snapshot not found: {application}/{key}")]
    NotFound { application: String, key: SnapshotKey },
    #[error("snapshot metadata is corrupt: {0}")]
    Metadata(String),
    #[error("snapshot store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot store backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Metadata(err.to_string())
    }
}

/// Persistence backend for snapshots, keyed by `(application, key)`.
///
/// Each application gets its own namespace (a blob container, a directory, a
/// map). Writes are last-writer-wins; there is no coordination between
/// concurrent writers of the same key.
///
/// Every method reports backend failures as `Err`. Deciding what a failure
/// *means* for a request is left to [`SnapshotCache`](super::SnapshotCache).
pub trait SnapshotStore: Send + Sync {
    /// Provision the namespace for `application` if it does not exist yet,
    /// making stored snapshots publicly readable. Idempotent.
    fn ensure_namespace(
        &self,
        application: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Whether a snapshot (content) exists for the key.
    fn exists(
        &self,
        application: &str,
        key: &SnapshotKey,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Fetch the metadata of a stored snapshot.
    ///
    /// `Ok(None)` means the content exists but metadata was never published.
    fn metadata(
        &self,
        application: &str,
        key: &SnapshotKey,
    ) -> impl Future<Output = Result<Option<SnapshotMetadata>, StoreError>> + Send;

    /// Read the stored content bytes.
    fn read(
        &self,
        application: &str,
        key: &SnapshotKey,
    ) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;

    /// Store (or overwrite) content as UTF-8 `text/html`.
    fn write(
        &self,
        application: &str,
        key: &SnapshotKey,
        content: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Stamp the content type and the metadata fields on an existing snapshot.
    fn set_metadata(
        &self,
        application: &str,
        key: &SnapshotKey,
        metadata: &SnapshotMetadata,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete a snapshot. Returns true if one existed.
    fn delete(
        &self,
        application: &str,
        key: &SnapshotKey,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}
