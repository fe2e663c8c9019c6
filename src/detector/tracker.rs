use std::collections::HashSet;
use std::hash::Hash;

use super::driver::PageEvent;

/// Pairs browser request notifications by request id so the detector sees a
/// balanced stream: one [`PageEvent::RequestIssued`] and at most one final
/// [`PageEvent::ResponseReceived`] per request.
///
/// Browsers report a redirect as another "request sent" carrying the same id,
/// followed by a single "finished". Notifications for one request may also
/// arrive out of order when they come from separate event streams; a request
/// that settles before it is seen to be sent is never counted.
#[derive(Debug)]
pub struct RequestTracker<K> {
    in_flight: HashSet<K>,
    settled_early: HashSet<K>,
}

impl<K> Default for RequestTracker<K> {
    fn default() -> Self {
        Self {
            in_flight: HashSet::new(),
            settled_early: HashSet::new(),
        }
    }
}

impl<K: Eq + Hash> RequestTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A request was sent. `redirect` marks a redirect hop of a request that
    /// was already reported.
    pub fn request_sent(&mut self, id: K, redirect: bool) -> Option<PageEvent> {
        if redirect || self.in_flight.contains(&id) || self.settled_early.remove(&id) {
            return None;
        }
        self.in_flight.insert(id);
        Some(PageEvent::RequestIssued)
    }

    /// A request finished loading or failed.
    pub fn request_settled(&mut self, id: K) -> Option<PageEvent> {
        if self.in_flight.remove(&id) {
            Some(PageEvent::ResponseReceived { complete: true })
        } else {
            self.settled_early.insert(id);
            None
        }
    }

    /// Requests sent and not yet settled.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
