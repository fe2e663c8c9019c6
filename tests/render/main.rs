//! ProcessRenderer against real child processes (small `sh` scripts).

#![cfg(unix)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use snapcrawl::{
    DetectorConfig, InMemorySnapshotStore, ProcessRenderer, RenderFailure, RenderOutcome,
    Renderer, SnapshotRequest, SnapshotService, SnapshotSource, StaticCredentials,
    LOAD_FAILED_SENTINEL,
};
use tempfile::TempDir;

/// Write `body` as a shell script and return a renderer running it via `sh`.
fn script(dir: &TempDir, body: &str) -> ProcessRenderer {
    let path: PathBuf = dir.path().join("render.sh");
    std::fs::write(&path, body).unwrap();
    ProcessRenderer::new("sh").with_args([path.to_string_lossy().into_owned()])
}

#[tokio::test]
async fn stdout_becomes_the_snapshot() {
    let dir = TempDir::new().unwrap();
    // The URL is the last argument.
    let renderer = script(
        &dir,
        "for url; do :; done\nprintf '<html><body>%s</body></html>\\n' \"$url\"\n",
    );

    assert_eq!(
        renderer.render("http://x.test/a").await,
        RenderOutcome::Rendered("<html><body>http://x.test/a</body></html>".into())
    );
}

#[tokio::test]
async fn detector_flags_reach_the_renderer() {
    let dir = TempDir::new().unwrap();
    let config = DetectorConfig::default()
        .with_quiescence(Duration::from_millis(250))
        .with_deadline(Duration::from_millis(4_000));
    let renderer = script(&dir, "printf '%s\\n' \"$*\"\n").with_detector(config);

    assert_eq!(
        renderer.render("http://x.test/a").await,
        RenderOutcome::Rendered(
            "--quiescence-ms 250 --deadline-ms 4000 -- http://x.test/a".into()
        )
    );
}

#[tokio::test]
async fn dash_leading_url_reaches_the_renderer_as_a_positional() {
    let dir = TempDir::new().unwrap();
    let renderer = script(&dir, "printf '%s\\n' \"$*\"\n");

    assert_eq!(renderer.render("--help").await, RenderOutcome::Rendered("-- --help".into()));
}

#[tokio::test]
async fn sentinel_output_is_a_load_failure() {
    let dir = TempDir::new().unwrap();
    let renderer = script(&dir, &format!("echo '{LOAD_FAILED_SENTINEL}'\n"));

    assert_eq!(
        renderer.render("http://x.test/a").await,
        RenderOutcome::Failed(RenderFailure::LoadFailed)
    );
}

#[tokio::test]
async fn empty_output_is_a_failure() {
    let dir = TempDir::new().unwrap();
    let renderer = script(&dir, "exit 0\n");

    assert_eq!(
        renderer.render("http://x.test/a").await,
        RenderOutcome::Failed(RenderFailure::EmptyOutput)
    );
}

#[tokio::test]
async fn nonzero_exit_is_a_failure_with_stderr() {
    let dir = TempDir::new().unwrap();
    let renderer = script(&dir, "echo '<html></html>'\necho 'boom' >&2\nexit 3\n");

    assert_eq!(
        renderer.render("http://x.test/a").await,
        RenderOutcome::Failed(RenderFailure::Exit {
            code: Some(3),
            stderr: "boom".into(),
        })
    );
}

#[tokio::test]
async fn hung_renderer_is_killed_by_the_watchdog() {
    let dir = TempDir::new().unwrap();
    let timeout = Duration::from_millis(300);
    let renderer = script(&dir, "exec sleep 30\n").with_timeout(timeout);

    let started = Instant::now();
    let outcome = renderer.render("http://x.test/a").await;
    assert_eq!(outcome, RenderOutcome::Failed(RenderFailure::TimedOut(timeout)));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn missing_program_is_a_spawn_failure() {
    let renderer = ProcessRenderer::new("/nonexistent/snapcrawl-render");

    assert!(matches!(
        renderer.render("http://x.test/a").await,
        RenderOutcome::Failed(RenderFailure::Spawn(_))
    ));
}

#[tokio::test]
async fn service_caches_process_renders() {
    let dir = TempDir::new().unwrap();
    let counter = dir.path().join("count");
    let body = format!(
        "echo x >> '{}'\nprintf '<html><head><meta name=\"fragment\" content=\"!\"></head><body>ok</body></html>\\n'\n",
        counter.display()
    );
    let service = SnapshotService::new(
        InMemorySnapshotStore::new(),
        script(&dir, &body),
        StaticCredentials::new().with_key("app1", "key"),
    );
    let request = SnapshotRequest::new("app1", "http://x.test/a")
        .with_api_key("key")
        .store_until(Utc::now() + chrono::Duration::days(1));

    let first = service.handle(&request).await.unwrap();
    assert_eq!(
        first.body,
        r#"<html><head><meta name="fragment" content="!"></head><body>ok</body></html>"#
    );
    let second = service.handle(&request).await.unwrap();
    assert_eq!(second.source, SnapshotSource::Cached);
    assert_eq!(second.body, "<html><head></head><body>ok</body></html>");

    let runs = std::fs::read_to_string(&counter).unwrap();
    assert_eq!(runs.lines().count(), 1);
}
