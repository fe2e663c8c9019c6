use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content type stamped on every stored snapshot.
pub const HTML_CONTENT_TYPE: &str = "text/html";

/// Metadata attached to a stored snapshot.
///
/// Serialized with PascalCase field names (`UserAgent`, `Url`,
/// `ExpirationDate`); the expiration is always RFC 3339 in UTC.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnapshotMetadata {
    pub user_agent: String,
    pub url: String,
    pub expiration_date: DateTime<Utc>,
}

impl SnapshotMetadata {
    pub fn new(
        user_agent: impl Into<String>,
        url: impl Into<String>,
        expiration_date: DateTime<Utc>,
    ) -> Self {
        Self {
            user_agent: user_agent.into(),
            url: url.into(),
            expiration_date,
        }
    }

    /// A snapshot is expired once its expiration date lies strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date < now
    }
}

/// A persisted snapshot: HTML bytes, content type, and (once published) metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub content: Vec<u8>,
    pub content_type: String,
    pub metadata: Option<SnapshotMetadata>,
}

impl SnapshotRecord {
    pub fn html(content: &str) -> Self {
        Self {
            content: content.as_bytes().to_vec(),
            content_type: HTML_CONTENT_TYPE.to_string(),
            metadata: None,
        }
    }
}
