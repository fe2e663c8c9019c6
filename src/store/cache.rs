use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::key::SnapshotKey;
use super::record::SnapshotMetadata;
use super::store::{SnapshotStore, StoreError};

/// Freshness of a snapshot relative to a point in time. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No snapshot is stored for the key.
    Missing,
    /// A snapshot exists and has not reached its expiration date.
    Fresh,
    /// A snapshot exists but its expiration date has passed.
    Expired,
}

impl CacheState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheState::Missing => "missing",
            CacheState::Fresh => "fresh",
            CacheState::Expired => "expired",
        }
    }

    /// Whether the request must go to the renderer.
    pub fn needs_render(&self) -> bool {
        !matches!(self, CacheState::Fresh)
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-facing view over a [`SnapshotStore`].
///
/// Backend errors on the freshness path never reach the caller. Each query
/// swallows them with its own policy:
///
/// | query              | on backend error        |
/// |--------------------|-------------------------|
/// | `ensure_namespace` | `false`                 |
/// | `exists`           | absent (fail-open)      |
/// | `is_expired`       | not expired (fail-safe) |
///
/// `exists` fails toward re-rendering; `is_expired` fails toward serving the
/// existing snapshot, so a flaky metadata fetch does not turn every request
/// into a render. The two are intentionally different.
#[derive(Clone)]
pub struct SnapshotCache<S> {
    store: S,
}

impl<S: SnapshotStore> SnapshotCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn ensure_namespace(&self, application: &str) -> bool {
        match self.store.ensure_namespace(application).await {
            Ok(()) => true,
            Err(e) => {
                warn!(application, error = %e, "failed to provision snapshot namespace");
                false
            }
        }
    }

    /// Existence check. Errors count as absent.
    pub async fn exists(&self, application: &str, key: &SnapshotKey) -> bool {
        match self.store.exists(application, key).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(
                    application,
                    %key,
                    error = %e,
                    "snapshot existence check failed; treating as absent"
                );
                false
            }
        }
    }

    /// Expiration check against `now`. Errors count as not expired.
    ///
    /// A snapshot whose metadata was never published (content written, metadata
    /// write lost) is expired: it has no expiration date to honor.
    pub async fn is_expired(
        &self,
        application: &str,
        key: &SnapshotKey,
        now: DateTime<Utc>,
    ) -> bool {
        match self.store.metadata(application, key).await {
            Ok(Some(metadata)) => metadata.is_expired_at(now),
            Ok(None) => true,
            Err(e) => {
                warn!(
                    application,
                    %key,
                    error = %e,
                    "snapshot metadata fetch failed; treating as not expired"
                );
                false
            }
        }
    }

    pub async fn state(
        &self,
        application: &str,
        key: &SnapshotKey,
        now: DateTime<Utc>,
    ) -> CacheState {
        if !self.exists(application, key).await {
            CacheState::Missing
        } else if self.is_expired(application, key, now).await {
            CacheState::Expired
        } else {
            CacheState::Fresh
        }
    }

    /// Read stored content. Assumes a prior existence check; does not re-check freshness.
    pub async fn read(&self, application: &str, key: &SnapshotKey) -> Result<Vec<u8>, StoreError> {
        let content = self.store.read(application, key).await?;
        info!(application, %key, bytes = content.len(), "snapshot read");
        Ok(content)
    }

    /// Write content, then metadata. The snapshot counts as published only
    /// once both calls succeed; a failure in between leaves content without
    /// fresh metadata, which the next freshness check reports as expired.
    pub async fn publish(
        &self,
        application: &str,
        key: &SnapshotKey,
        content: &str,
        metadata: &SnapshotMetadata,
    ) -> Result<(), StoreError> {
        self.store.write(application, key, content).await?;
        self.store.set_metadata(application, key, metadata).await?;
        info!(
            application,
            %key,
            url = %metadata.url,
            expires = %metadata.expiration_date.to_rfc3339(),
            "snapshot saved"
        );
        Ok(())
    }

    pub async fn delete(&self, application: &str, key: &SnapshotKey) -> Result<bool, StoreError> {
        let existed = self.store.delete(application, key).await?;
        if existed {
            info!(application, %key, "snapshot deleted");
        }
        Ok(existed)
    }
}
