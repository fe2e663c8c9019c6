//! Cache orchestration: decides, per request, between serving a stored
//! snapshot and rendering a new one.
//!
//! ## Quick Start
//!
//! ```ignore
//! use snapcrawl::orchestrator::{SnapshotRequest, SnapshotService, StaticCredentials};
//! use snapcrawl::render::ProcessRenderer;
//! use snapcrawl::store::InMemorySnapshotStore;
//!
//! let service = SnapshotService::new(
//!     InMemorySnapshotStore::new(),
//!     ProcessRenderer::new("snapcrawl-render"),
//!     StaticCredentials::new().with_key("app1", "secret"),
//! );
//!
//! let request = SnapshotRequest::new("app1", "http://example.com/#!/home")
//!     .with_api_key("secret")
//!     .store_until(chrono::Utc::now() + chrono::Duration::days(3));
//! let response = service.handle(&request).await?;
//! println!("{} ({})", response.body, response.source.as_str());
//! ```

mod credentials;
mod inflight;
mod request;
mod service;

pub use credentials::{CredentialValidator, StaticCredentials};
pub use inflight::{InFlightGuard, InFlightRenders};
pub use request::{
    RequestError, SnapshotRequest, MISSING_EXPIRATION_MESSAGE, MISSING_URL_MESSAGE,
};
pub use service::{SnapshotResponse, SnapshotService, SnapshotSource};
