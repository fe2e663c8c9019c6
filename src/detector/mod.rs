//! Render-completion detection.
//!
//! A script-heavy page keeps fetching sub-resources long after the initial
//! document loads, and nothing tells us when it is "done". The detector
//! infers it: once no request has been outstanding for a quiescence window
//! the page is captured, and a hard deadline caps pages that never go quiet.
//!
//! ## Quick Start
//!
//! ```ignore
//! use snapcrawl::detector::{self, DetectorConfig, PageEvent};
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(64);
//! // forward browser network notifications into `tx`, paired up by a
//! // `RequestTracker` so redirects and reordering keep the count balanced ...
//! tx.send(PageEvent::LoadStarted).await?;
//! let completion = detector::run(DetectorConfig::default(), rx).await;
//! if completion.should_capture() {
//!     // print page content
//! }
//! ```

mod driver;
mod state;
mod tracker;

pub use driver::{run, PageEvent};
pub use state::{
    Completion, CompletionDetector, DetectorConfig, DEFAULT_DEADLINE, DEFAULT_QUIESCENCE,
};
pub use tracker::RequestTracker;
