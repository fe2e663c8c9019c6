use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::key::SnapshotKey;
use super::record::{SnapshotMetadata, SnapshotRecord, HTML_CONTENT_TYPE};
use super::store::{SnapshotStore, StoreError};

type Namespaces = HashMap<String, HashMap<SnapshotKey, SnapshotRecord>>;

/// In-memory snapshot store backed by `Arc<RwLock<HashMap>>`.
///
/// Clone-friendly (cloning shares the same underlying storage). Namespaces
/// behave like blob containers: writing into an application that was never
/// provisioned fails with [`StoreError::MissingNamespace`].
#[derive(Clone)]
pub struct InMemorySnapshotStore {
    storage: Arc<RwLock<Namespaces>>,
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Snapshot of a stored record, including its metadata.
    pub fn record(
        &self,
        application: &str,
        key: &SnapshotKey,
    ) -> Result<Option<SnapshotRecord>, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("snapshot read"))?;
        Ok(storage
            .get(application)
            .and_then(|namespace| namespace.get(key))
            .cloned())
    }

    /// Number of snapshots stored for an application.
    pub fn len(&self, application: &str) -> usize {
        self.storage
            .read()
            .map(|storage| storage.get(application).map_or(0, HashMap::len))
            .unwrap_or(0)
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    async fn ensure_namespace(&self, application: &str) -> Result<(), StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("namespace create"))?;
        storage.entry(application.to_string()).or_default();
        Ok(())
    }

    async fn exists(&self, application: &str, key: &SnapshotKey) -> Result<bool, StoreError> {
        Ok(self.record(application, key)?.is_some())
    }

    async fn metadata(
        &self,
        application: &str,
        key: &SnapshotKey,
    ) -> Result<Option<SnapshotMetadata>, StoreError> {
        let record = self
            .record(application, key)?
            .ok_or_else(|| not_found(application, key))?;
        Ok(record.metadata)
    }

    async fn read(&self, application: &str, key: &SnapshotKey) -> Result<Vec<u8>, StoreError> {
        let record = self
            .record(application, key)?
            .ok_or_else(|| not_found(application, key))?;
        Ok(record.content)
    }

    async fn write(
        &self,
        application: &str,
        key: &SnapshotKey,
        content: &str,
    ) -> Result<(), StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("snapshot write"))?;
        let namespace = storage
            .get_mut(application)
            .ok_or_else(|| StoreError::MissingNamespace(application.to_string()))?;
        // Overwriting content keeps the previous metadata, as a blob upload does.
        match namespace.get_mut(key) {
            Some(record) => {
                record.content = content.as_bytes().to_vec();
                record.content_type = HTML_CONTENT_TYPE.to_string();
            }
            None => {
                namespace.insert(key.clone(), SnapshotRecord::html(content));
            }
        }
        Ok(())
    }

    async fn set_metadata(
        &self,
        application: &str,
        key: &SnapshotKey,
        metadata: &SnapshotMetadata,
    ) -> Result<(), StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("metadata write"))?;
        let record = storage
            .get_mut(application)
            .and_then(|namespace| namespace.get_mut(key))
            .ok_or_else(|| not_found(application, key))?;
        record.content_type = HTML_CONTENT_TYPE.to_string();
        record.metadata = Some(metadata.clone());
        Ok(())
    }

    async fn delete(&self, application: &str, key: &SnapshotKey) -> Result<bool, StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("snapshot delete"))?;
        Ok(storage
            .get_mut(application)
            .map_or(false, |namespace| namespace.remove(key).is_some()))
    }
}

fn not_found(application: &str, key: &SnapshotKey) -> StoreError {
    StoreError::NotFound {
        application: application.to_string(),
        key: key.clone(),
    }
}
