//! Render invocation.
//!
//! A [`Renderer`] turns a URL into a [`RenderOutcome`]. The production
//! implementation is [`ProcessRenderer`], which runs an out-of-process
//! headless browser per request; tests substitute in-process fakes.

#[cfg(feature = "chromium")]
pub mod chromium;
mod outcome;
mod process;

use std::future::Future;

pub use outcome::{RenderFailure, RenderOutcome, LOAD_FAILED_SENTINEL};
pub use process::{ProcessRenderer, DEFAULT_RENDER_TIMEOUT};

/// Produces a rendered snapshot of a URL.
///
/// Implementations report every failure through [`RenderOutcome::Failed`];
/// rendering never errors out of band.
pub trait Renderer: Send + Sync {
    fn render(&self, url: &str) -> impl Future<Output = RenderOutcome> + Send;
}
