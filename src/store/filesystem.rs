use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::fs;

use super::key::SnapshotKey;
use super::record::SnapshotMetadata;
use super::store::{SnapshotStore, StoreError};

const CONTENT_EXTENSION: &str = "html";
const METADATA_EXTENSION: &str = "meta.json";

/// Snapshot store on the local filesystem.
///
/// Layout: one directory per application under `root`, holding
/// `<key>.html` (content) and `<key>.meta.json` (metadata). Keys have a
/// fixed length, so file names stay within filesystem limits for any URL.
/// Files are replaced by writing a uniquely named temporary sibling and
/// renaming it over the target, so readers never observe a half-written
/// snapshot.
#[derive(Clone, Debug)]
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_dir(&self, application: &str) -> Result<PathBuf, StoreError> {
        validate_namespace(application)?;
        Ok(self.root.join(application))
    }

    fn content_path(&self, application: &str, key: &SnapshotKey) -> Result<PathBuf, StoreError> {
        Ok(self
            .namespace_dir(application)?
            .join(format!("{}.{}", key, CONTENT_EXTENSION)))
    }

    fn metadata_path(&self, application: &str, key: &SnapshotKey) -> Result<PathBuf, StoreError> {
        Ok(self
            .namespace_dir(application)?
            .join(format!("{}.{}", key, METADATA_EXTENSION)))
    }

    async fn require_namespace(&self, application: &str) -> Result<(), StoreError> {
        let dir = self.namespace_dir(application)?;
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::MissingNamespace(application.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::MissingNamespace(application.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Application names become directory names, so they are restricted to a
/// conservative alphabet and may not be `.` or `..`.
fn validate_namespace(application: &str) -> Result<(), StoreError> {
    let valid = !application.is_empty()
        && application != "."
        && application != ".."
        && application
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidNamespace(application.to_string()))
    }
}

/// Replace `path` with `contents` through a uniquely named sibling, so
/// concurrent writers of one key never share a temporary file.
async fn replace_file(path: &Path, contents: Vec<u8>) -> Result<(), StoreError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::Backend(format!("{} has no parent", path.display())))?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&contents)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file().set_permissions(std::fs::Permissions::from_mode(0o644))?;
        }
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| StoreError::Backend(format!("snapshot write task failed: {e}")))?
}

async fn remove_if_present(path: &Path) -> Result<bool, StoreError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

impl SnapshotStore for FileSnapshotStore {
    async fn ensure_namespace(&self, application: &str) -> Result<(), StoreError> {
        let dir = self.namespace_dir(application)?;
        fs::create_dir_all(&dir).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).await?;
        }
        Ok(())
    }

    async fn exists(&self, application: &str, key: &SnapshotKey) -> Result<bool, StoreError> {
        let path = self.content_path(application, key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn metadata(
        &self,
        application: &str,
        key: &SnapshotKey,
    ) -> Result<Option<SnapshotMetadata>, StoreError> {
        if !self.exists(application, key).await? {
            return Err(StoreError::NotFound {
                application: application.to_string(),
                key: key.clone(),
            });
        }
        let path = self.metadata_path(application, key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, application: &str, key: &SnapshotKey) -> Result<Vec<u8>, StoreError> {
        let path = self.content_path(application, key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound {
                application: application.to_string(),
                key: key.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(
        &self,
        application: &str,
        key: &SnapshotKey,
        content: &str,
    ) -> Result<(), StoreError> {
        self.require_namespace(application).await?;
        let path = self.content_path(application, key)?;
        replace_file(&path, content.as_bytes().to_vec()).await
    }

    async fn set_metadata(
        &self,
        application: &str,
        key: &SnapshotKey,
        metadata: &SnapshotMetadata,
    ) -> Result<(), StoreError> {
        if !self.exists(application, key).await? {
            return Err(StoreError::NotFound {
                application: application.to_string(),
                key: key.clone(),
            });
        }
        let path = self.metadata_path(application, key)?;
        let bytes = serde_json::to_vec_pretty(metadata)?;
        replace_file(&path, bytes).await
    }

    async fn delete(&self, application: &str, key: &SnapshotKey) -> Result<bool, StoreError> {
        let existed = remove_if_present(&self.content_path(application, key)?).await?;
        remove_if_present(&self.metadata_path(application, key)?).await?;
        Ok(existed)
    }
}
