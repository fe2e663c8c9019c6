//! Pre-rendered HTML snapshots for pages that only produce content when
//! their scripts run.
//!
//! A request names an application and a URL. [`SnapshotService`] answers it
//! from a [`SnapshotStore`] while the stored snapshot is fresh, and otherwise
//! renders the page through a [`Renderer`] (by default an out-of-process
//! headless browser, see [`ProcessRenderer`]), optionally storing the result
//! until a caller-supplied expiration date.
//!
//! The renderer decides when a page is finished with the quiescence
//! heuristic in [`detector`].

pub mod config;
pub mod detector;
#[cfg(feature = "http")]
pub mod http;
pub mod logging;
pub mod orchestrator;
pub mod render;
pub mod sanitize;
pub mod store;

pub use detector::{Completion, CompletionDetector, DetectorConfig, PageEvent};
pub use orchestrator::{
    CredentialValidator, RequestError, SnapshotRequest, SnapshotResponse, SnapshotService,
    SnapshotSource, StaticCredentials,
};
pub use render::{ProcessRenderer, RenderFailure, RenderOutcome, Renderer, LOAD_FAILED_SENTINEL};
pub use sanitize::strip_fragment_marker;
pub use store::{
    CacheState, FileSnapshotStore, InMemorySnapshotStore, SnapshotCache, SnapshotKey,
    SnapshotMetadata, SnapshotRecord, SnapshotStore, StoreError,
};
