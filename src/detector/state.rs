use std::time::Duration;

use tokio::time::Instant;

/// Default dwell time with zero in-flight requests before a page counts as settled.
pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(300);
/// Default upper bound on how long a page may keep loading before it is captured anyway.
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(10_000);

/// The two tunables of render-completion detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Quiescence window: silence required after the last response.
    pub quiescence: Duration,
    /// Hard deadline measured from page-load start.
    pub deadline: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            quiescence: DEFAULT_QUIESCENCE,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

impl DetectorConfig {
    pub fn with_quiescence(mut self, quiescence: Duration) -> Self {
        self.quiescence = quiescence;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Why a page load was finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// No sub-resource activity for a full quiescence window.
    Quiescent,
    /// The deadline fired first; `pending` requests were still in flight.
    DeadlineReached { pending: usize },
    /// The initial navigation failed.
    LoadFailed,
}

impl Completion {
    /// Whether the page content should be captured (as opposed to reporting failure).
    pub fn should_capture(&self) -> bool {
        !matches!(self, Completion::LoadFailed)
    }
}

/// Debounced-quiescence state machine for a single page load.
///
/// Time is passed in explicitly, which keeps the machine deterministic; the
/// [`run`](super::run) driver feeds it from a real (or paused) clock.
///
/// Two timers are tracked as deadlines: the finalize timer, armed whenever
/// the in-flight count drops to zero and cancelled by any new request, and
/// the deadline timer, armed once at load start. Whichever is due first
/// finalizes the load; after that every input is ignored.
#[derive(Debug)]
pub struct CompletionDetector {
    config: DetectorConfig,
    pending: usize,
    finalize_at: Option<Instant>,
    deadline_at: Option<Instant>,
    completed: Option<Completion>,
}

impl CompletionDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            pending: 0,
            finalize_at: None,
            deadline_at: None,
            completed: None,
        }
    }

    pub fn config(&self) -> DetectorConfig {
        self.config
    }

    /// Number of requests issued but not yet fully answered.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn completion(&self) -> Option<Completion> {
        self.completed
    }

    pub fn is_finished(&self) -> bool {
        self.completed.is_some()
    }

    /// Navigation started: arm the deadline. Later calls do not re-arm it.
    pub fn load_started(&mut self, now: Instant) {
        if self.is_finished() || self.deadline_at.is_some() {
            return;
        }
        self.deadline_at = Some(now + self.config.deadline);
    }

    /// The page issued a request. Any imminent finalize is cancelled.
    pub fn request_issued(&mut self, _now: Instant) {
        if self.is_finished() {
            return;
        }
        self.pending += 1;
        self.finalize_at = None;
    }

    /// A response stage arrived. Only the final stage of a response counts.
    ///
    /// Responses with no matching outstanding request are ignored rather than
    /// driving the count below zero.
    pub fn response_received(&mut self, now: Instant, complete: bool) {
        if self.is_finished() || !complete || self.pending == 0 {
            return;
        }
        self.pending -= 1;
        if self.pending == 0 {
            self.finalize_at = Some(now + self.config.quiescence);
        }
    }

    /// The initial navigation failed. Finalizes immediately, bypassing both timers.
    ///
    /// Returns `None` if the load was already finalized.
    pub fn load_failed(&mut self) -> Option<Completion> {
        self.finish(Completion::LoadFailed)
    }

    /// The event source went away before the page settled: finalize as if
    /// the deadline had fired.
    pub fn abandon(&mut self) -> Option<Completion> {
        let pending = self.pending;
        self.finish(Completion::DeadlineReached { pending })
    }

    /// The earliest instant at which [`poll`](Self::poll) could finalize.
    pub fn next_wake(&self) -> Option<Instant> {
        if self.is_finished() {
            return None;
        }
        match (self.finalize_at, self.deadline_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire whichever timer is due at `now`.
    ///
    /// Returns the completion exactly once; a finalize timer due no later than
    /// the deadline wins the tie.
    pub fn poll(&mut self, now: Instant) -> Option<Completion> {
        if self.is_finished() {
            return None;
        }
        let finalize_due = self.finalize_at.filter(|at| *at <= now);
        let deadline_due = self.deadline_at.filter(|at| *at <= now);
        match (finalize_due, deadline_due) {
            (Some(finalize), Some(deadline)) if finalize <= deadline => {
                self.finish(Completion::Quiescent)
            }
            (_, Some(_)) => {
                let pending = self.pending;
                self.finish(Completion::DeadlineReached { pending })
            }
            (Some(_), None) => self.finish(Completion::Quiescent),
            (None, None) => None,
        }
    }

    fn finish(&mut self, completion: Completion) -> Option<Completion> {
        if self.is_finished() {
            return None;
        }
        self.completed = Some(completion);
        self.finalize_at = None;
        self.deadline_at = None;
        Some(completion)
    }
}
