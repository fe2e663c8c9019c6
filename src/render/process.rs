use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, info, warn};

use super::outcome::{RenderFailure, RenderOutcome};
use super::Renderer;
use crate::detector::DetectorConfig;

/// Default watchdog bound on a single renderer process.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Renders pages by running an external renderer program, one process per URL.
///
/// Command line: `program [args...] [--quiescence-ms N --deadline-ms M] -- <url>`.
/// The detector flags are only passed when configured via
/// [`with_detector`](Self::with_detector). Stdout carries the document;
/// stderr is kept for diagnostics. A process outliving the watchdog timeout
/// is killed and reported as [`RenderFailure::TimedOut`].
#[derive(Debug, Clone)]
pub struct ProcessRenderer {
    program: PathBuf,
    args: Vec<String>,
    detector: Option<DetectorConfig>,
    timeout: Duration,
}

impl ProcessRenderer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            detector: None,
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    /// Extra arguments placed before the URL (e.g. a script path for a
    /// script-hosting browser).
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Forward the completion-detector tunables to the renderer.
    pub fn with_detector(mut self, config: DetectorConfig) -> Self {
        self.detector = Some(config);
        self
    }

    /// Set the watchdog timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The full argument list for rendering `url`.
    pub fn command_args(&self, url: &str) -> Vec<String> {
        let mut args = self.args.clone();
        if let Some(config) = self.detector {
            args.push("--quiescence-ms".to_string());
            args.push(config.quiescence.as_millis().to_string());
            args.push("--deadline-ms".to_string());
            args.push(config.deadline.as_millis().to_string());
        }
        // Everything after `--` is positional, even a URL starting with `-`.
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    async fn run(&self, url: &str) -> RenderOutcome {
        let mut command = Command::new(&self.program);
        command
            .args(self.command_args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return RenderOutcome::Failed(RenderFailure::Spawn(format!(
                    "{}: {}",
                    self.program.display(),
                    e
                )))
            }
        };
        debug!(url, pid = child.id(), "renderer started");

        // Dropping the wait future on timeout drops the child, which kills it.
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => classify(
                output.status,
                &String::from_utf8_lossy(&output.stdout),
                &String::from_utf8_lossy(&output.stderr),
            ),
            Ok(Err(e)) => RenderOutcome::Failed(RenderFailure::Spawn(e.to_string())),
            Err(_) => RenderOutcome::Failed(RenderFailure::TimedOut(self.timeout)),
        }
    }
}

/// Classify a finished renderer process. A non-zero exit is a failure
/// whatever was printed; otherwise the output decides.
pub(crate) fn classify(status: ExitStatus, stdout: &str, stderr: &str) -> RenderOutcome {
    if !status.success() {
        return RenderOutcome::Failed(RenderFailure::Exit {
            code: status.code(),
            stderr: stderr.trim().to_string(),
        });
    }
    if !stderr.trim().is_empty() {
        debug!(stderr = stderr.trim(), "renderer diagnostics");
    }
    RenderOutcome::from_output(stdout)
}

impl Renderer for ProcessRenderer {
    async fn render(&self, url: &str) -> RenderOutcome {
        let started = Instant::now();
        let outcome = self.run(url).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            RenderOutcome::Rendered(html) => {
                info!(url, elapsed_ms, bytes = html.len(), "page rendered")
            }
            RenderOutcome::Failed(reason) => {
                warn!(url, elapsed_ms, error = %reason, "render failed")
            }
        }
        outcome
    }
}
