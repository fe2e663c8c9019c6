use std::time::Duration;

/// Literal a renderer prints instead of page content when navigation fails.
pub const LOAD_FAILED_SENTINEL: &str = "Error : Unable to load url";

/// Why a render produced no usable snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderFailure {
    /// The renderer reported that the page could not be loaded.
    #[error("renderer could not load the page")]
    LoadFailed,
    /// The renderer exited unsuccessfully.
    #[error("renderer exited with {}: {stderr}", exit_label(.code))]
    Exit { code: Option<i32>, stderr: String },
    /// The renderer exited successfully but printed nothing.
    #[error("renderer produced no output")]
    EmptyOutput,
    /// The watchdog killed a renderer that ran too long.
    #[error("renderer timed out after {0:?}")]
    TimedOut(Duration),
    /// The renderer process could not be started or awaited.
    #[error("renderer could not be run: {0}")]
    Spawn(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

/// Result of a single render invocation. Consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(String),
    Failed(RenderFailure),
}

impl RenderOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, RenderOutcome::Rendered(_))
    }

    /// Classify captured renderer output.
    ///
    /// A trailing line break is dropped (renderers print the document with a
    /// final newline). Output equal to [`LOAD_FAILED_SENTINEL`] is a failure.
    pub fn from_output(stdout: &str) -> Self {
        let html = stdout.trim_end_matches(&['\r', '\n'][..]);
        if html.trim() == LOAD_FAILED_SENTINEL {
            RenderOutcome::Failed(RenderFailure::LoadFailed)
        } else if html.trim().is_empty() {
            RenderOutcome::Failed(RenderFailure::EmptyOutput)
        } else {
            RenderOutcome::Rendered(html.to_string())
        }
    }
}
