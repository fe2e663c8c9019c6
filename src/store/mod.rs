//! Snapshot persistence.
//!
//! [`SnapshotStore`] is the backend contract (blob container, directory,
//! in-memory map); [`SnapshotCache`] layers the request-time freshness
//! policies on top of it.

mod cache;
mod filesystem;
mod in_memory;
mod key;
mod record;
mod store;

pub use cache::{CacheState, SnapshotCache};
pub use filesystem::FileSnapshotStore;
pub use in_memory::InMemorySnapshotStore;
pub use key::SnapshotKey;
pub use record::{SnapshotMetadata, SnapshotRecord, HTML_CONTENT_TYPE};
pub use store::{SnapshotStore, StoreError};
