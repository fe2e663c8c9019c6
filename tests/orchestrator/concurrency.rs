//! Concurrent requests for the same or different keys.

use std::time::Duration;

use chrono::Utc;
use snapcrawl::{CacheState, SnapshotRequest, SnapshotSource};
use tokio::time::Instant;

use crate::support::{
    build_service, page_html, page_html_without_marker, FakeRenderer, RecordingStore, API_KEY,
    APP, PAGE_URL,
};

const RENDER_TIME: Duration = Duration::from_millis(200);

fn storing(url: &str) -> SnapshotRequest {
    SnapshotRequest::new(APP, url)
        .with_api_key(API_KEY)
        .store_until(Utc::now() + chrono::Duration::days(1))
}

#[tokio::test(start_paused = true)]
async fn concurrent_misses_on_one_key_render_once() {
    let store = RecordingStore::new();
    let renderer = FakeRenderer::rendering(page_html("once")).with_delay(RENDER_TIME);
    let service = build_service(store.clone(), renderer.clone());

    let request = storing(PAGE_URL);
    let (first, second) = tokio::join!(service.handle(&request), service.handle(&request));
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(renderer.calls(), 1);
    assert_eq!(store.count(|c| &c.write), 1);

    let mut sources = [first.source.as_str(), second.source.as_str()];
    sources.sort_unstable();
    assert_eq!(sources, ["cached", "rendered"]);

    // The waiter is served the stored copy; the renderer's caller gets the raw render.
    let (rendered, cached) = if first.source == SnapshotSource::Cached {
        (second, first)
    } else {
        (first, second)
    };
    assert_eq!(rendered.body, page_html("once"));
    assert_eq!(cached.body, page_html_without_marker("once"));
}

#[tokio::test(start_paused = true)]
async fn concurrent_misses_without_store_each_render() {
    let store = RecordingStore::new();
    let renderer = FakeRenderer::rendering(page_html("x")).with_delay(RENDER_TIME);
    let service = build_service(store.clone(), renderer.clone());

    let request = SnapshotRequest::new(APP, PAGE_URL).with_api_key(API_KEY);
    let started = Instant::now();
    let (first, second) = tokio::join!(service.handle(&request), service.handle(&request));

    assert_eq!(first.unwrap().body, page_html("x"));
    assert_eq!(second.unwrap().body, page_html("x"));
    assert_eq!(renderer.calls(), 2);
    assert_eq!(store.count(|c| &c.write), 0);
    // Neither waited for the other.
    assert!(started.elapsed() < RENDER_TIME * 2);
}

#[tokio::test(start_paused = true)]
async fn non_storing_render_does_not_delay_a_storing_one() {
    let store = RecordingStore::new();
    let renderer = FakeRenderer::rendering(page_html("x")).with_delay(RENDER_TIME);
    let service = build_service(store.clone(), renderer.clone());

    let browsing = SnapshotRequest::new(APP, PAGE_URL).with_api_key(API_KEY);
    let persisting = storing(PAGE_URL);
    let started = Instant::now();
    let (first, second) = tokio::join!(service.handle(&browsing), service.handle(&persisting));

    first.unwrap();
    assert_eq!(
        second.unwrap().source,
        SnapshotSource::Rendered {
            previous: CacheState::Missing,
            persisted: true
        }
    );
    assert!(started.elapsed() < RENDER_TIME * 2);
    assert_eq!(store.count(|c| &c.write), 1);
}

#[tokio::test(start_paused = true)]
async fn different_keys_render_in_parallel() {
    let store = RecordingStore::new();
    let renderer = FakeRenderer::rendering("<html></html>").with_delay(RENDER_TIME);
    let service = build_service(store.clone(), renderer.clone());

    let started = Instant::now();
    let req_a = storing("http://x.test/a");
    let req_b = storing("http://x.test/b");
    let (a, b) = tokio::join!(service.handle(&req_a), service.handle(&req_b));
    a.unwrap();
    b.unwrap();

    assert_eq!(renderer.calls(), 2);
    assert!(started.elapsed() < RENDER_TIME * 2);
    assert_eq!(store.count(|c| &c.write), 2);
}

#[tokio::test(start_paused = true)]
async fn many_waiters_share_one_render() {
    let store = RecordingStore::new();
    let renderer = FakeRenderer::rendering(page_html("shared")).with_delay(RENDER_TIME);
    let service = std::sync::Arc::new(build_service(store.clone(), renderer.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.handle(&storing(PAGE_URL)).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(renderer.calls(), 1);
    assert_eq!(store.count(|c| &c.write), 1);
}
