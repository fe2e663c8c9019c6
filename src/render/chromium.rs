//! Headless Chromium page driver.
//!
//! Loads one URL in a fresh browser, forwards the page's network activity
//! into the completion detector, and returns the captured document once the
//! detector finalizes. Backs the `snapcrawl-render` binary.
//!
//! Request notifications are paired by request id through a
//! [`RequestTracker`], so redirect hops count once and a request never stays
//! pending because its notifications arrived out of order.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::outcome::LOAD_FAILED_SENTINEL;
use crate::detector::{self, Completion, DetectorConfig, PageEvent, RequestTracker};

/// Browser window size used for rendering.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 1024,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("browser configuration rejected: {0}")]
    Config(String),
    #[error("browser protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
}

/// What the renderer should print to stdout for a finished load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub completion: Completion,
    pub output: String,
}

/// Render `url` and capture its document.
///
/// Navigation failure yields [`LOAD_FAILED_SENTINEL`] as the output. Errors
/// are reserved for the browser itself failing (launch, protocol).
pub async fn capture(
    url: &str,
    viewport: Viewport,
    config: DetectorConfig,
) -> Result<Capture, BrowserError> {
    let browser_config = BrowserConfig::builder()
        .window_size(viewport.width, viewport.height)
        .build()
        .map_err(BrowserError::Config)?;
    let (mut browser, mut handler) = Browser::launch(browser_config).await?;
    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    let result = capture_in(&browser, url, config).await;

    if let Err(e) = browser.close().await {
        warn!(error = %e, "failed to close browser");
    }
    handler_task.abort();
    result
}

/// Network notification relevant to completion detection.
enum Network {
    Sent { id: String, redirect: bool },
    Settled { id: String },
}

async fn capture_in(
    browser: &Browser,
    url: &str,
    config: DetectorConfig,
) -> Result<Capture, BrowserError> {
    let page = browser.new_page("about:blank").await?;
    page.execute(EnableParams::default()).await?;

    // Notifications are paired on this task only; the tracker absorbs
    // reordering between the three streams.
    let sent = page
        .event_listener::<EventRequestWillBeSent>()
        .await?
        .map(|e| Network::Sent {
            id: e.request_id.inner().clone(),
            redirect: e.redirect_response.is_some(),
        });
    let finished = page
        .event_listener::<EventLoadingFinished>()
        .await?
        .map(|e| Network::Settled {
            id: e.request_id.inner().clone(),
        });
    let failed = page
        .event_listener::<EventLoadingFailed>()
        .await?
        .map(|e| Network::Settled {
            id: e.request_id.inner().clone(),
        });
    let mut network = stream::select_all([
        sent.boxed_local(),
        finished.boxed_local(),
        failed.boxed_local(),
    ]);

    let (tx, rx) = mpsc::channel(256);
    let mut detection = tokio::spawn(detector::run(config, rx));
    let mut tracker = RequestTracker::new();
    let _ = tx.send(PageEvent::LoadStarted).await;

    // Navigation races the detector: a hung load is still captured at the deadline.
    let navigation = page.goto(url);
    tokio::pin!(navigation);
    let mut navigating = true;

    let completion = loop {
        tokio::select! {
            joined = &mut detection => break joined.unwrap_or(Completion::LoadFailed),
            result = &mut navigation, if navigating => {
                navigating = false;
                if let Err(e) = result {
                    debug!(url, error = %e, "navigation failed");
                    let _ = tx.send(PageEvent::LoadFailed).await;
                }
            }
            Some(notification) = network.next() => {
                let event = match notification {
                    Network::Sent { id, redirect } => tracker.request_sent(id, redirect),
                    Network::Settled { id } => tracker.request_settled(id),
                };
                if let Some(event) = event {
                    let _ = tx.send(event).await;
                }
            }
        }
    };
    debug!(url, ?completion, in_flight = tracker.in_flight(), "page load finalized");

    let output = if completion.should_capture() {
        page.content().await?
    } else {
        LOAD_FAILED_SENTINEL.to_string()
    };
    Ok(Capture { completion, output })
}
