use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use super::state::{Completion, CompletionDetector, DetectorConfig};

/// Network activity reported by a page while it loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// Navigation to the target URL began.
    LoadStarted,
    /// The page issued a request (document, script, XHR, image, ...).
    RequestIssued,
    /// A response stage arrived; `complete` is set on the final stage only.
    ResponseReceived { complete: bool },
    /// The initial navigation failed.
    LoadFailed,
}

/// Run completion detection over a stream of page events.
///
/// Everything happens on the calling task: events and timer expiries are
/// handled one at a time, never concurrently. Returns once the load is
/// finalized. If the sender side is dropped before that, the load is
/// finalized as though the deadline fired.
pub async fn run(config: DetectorConfig, mut events: mpsc::Receiver<PageEvent>) -> Completion {
    let mut detector = CompletionDetector::new(config);
    loop {
        let wake = detector.next_wake();
        tokio::select! {
            biased;
            event = events.recv() => {
                let now = Instant::now();
                let completion = match event {
                    Some(event) => apply(&mut detector, event, now),
                    None => {
                        debug!(pending = detector.pending(), "page event stream closed");
                        detector.abandon()
                    }
                };
                if let Some(completion) = completion {
                    return completion;
                }
            }
            _ = wait_for(wake) => {
                if let Some(completion) = detector.poll(Instant::now()) {
                    debug!(?completion, "page load finalized");
                    return completion;
                }
            }
        }
    }
}

fn apply(detector: &mut CompletionDetector, event: PageEvent, now: Instant) -> Option<Completion> {
    match event {
        PageEvent::LoadStarted => detector.load_started(now),
        PageEvent::RequestIssued => detector.request_issued(now),
        PageEvent::ResponseReceived { complete } => detector.response_received(now, complete),
        PageEvent::LoadFailed => return detector.load_failed(),
    }
    debug!(?event, pending = detector.pending(), "page event");
    None
}

async fn wait_for(wake: Option<Instant>) {
    match wake {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
