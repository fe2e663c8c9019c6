//! HTTP transport integration tests.
//!
//! Starts an axum server and exercises it with reqwest.

#[path = "../support/mod.rs"]
mod support;

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use snapcrawl::http::{self, SNAPSHOT_PATH};
use snapcrawl::orchestrator::{MISSING_EXPIRATION_MESSAGE, MISSING_URL_MESSAGE};
use snapcrawl::{RenderFailure, RenderOutcome, SnapshotMetadata, LOAD_FAILED_SENTINEL};

use support::{
    build_service, page_html, page_html_without_marker, FakeRenderer, RecordingStore, API_KEY,
    APP, PAGE_URL,
};

/// Bind to port 0 and return the actual address.
async fn start_server(store: RecordingStore, renderer: FakeRenderer) -> String {
    let app = http::router(Arc::new(build_service(store, renderer)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn post(base: &str, body: serde_json::Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base}{SNAPSHOT_PATH}"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

fn source(resp: &reqwest::Response) -> &str {
    resp.headers()
        .get("x-snapshot-source")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn health_check() {
    let base = start_server(RecordingStore::new(), FakeRenderer::rendering("")).await;

    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn render_and_store_then_serve_from_cache() {
    let store = RecordingStore::new();
    let renderer = FakeRenderer::rendering(page_html("hi"));
    let base = start_server(store.clone(), renderer.clone()).await;
    let expiration = (Utc::now() + Duration::days(3)).to_rfc3339();
    let body = json!({
        "apiId": API_KEY,
        "application": APP,
        "url": PAGE_URL,
        "store": true,
        "expirationDate": expiration,
        "userAgent": "Googlebot/2.1",
    });

    let resp = post(&base, body.clone()).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(source(&resp), "rendered");
    let content_type = resp.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
    assert_eq!(resp.text().await.unwrap(), page_html("hi"));

    let resp = post(&base, body).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(source(&resp), "cached");
    assert_eq!(resp.text().await.unwrap(), page_html_without_marker("hi"));
    assert_eq!(renderer.calls(), 1);
    assert_eq!(
        store.stored_metadata(PAGE_URL).await.unwrap().user_agent,
        "Googlebot/2.1"
    );
}

#[tokio::test]
async fn api_key_alias_is_accepted() {
    let base = start_server(RecordingStore::new(), FakeRenderer::rendering("<html></html>")).await;

    let resp = post(
        &base,
        json!({ "apiKey": API_KEY, "application": APP, "url": PAGE_URL }),
    )
    .await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn wrong_credentials_are_forbidden_with_empty_body() {
    let store = RecordingStore::new();
    let renderer = FakeRenderer::rendering("<html></html>");
    let base = start_server(store.clone(), renderer.clone()).await;

    let resp = post(
        &base,
        json!({ "apiId": "nope", "application": APP, "url": PAGE_URL }),
    )
    .await;
    assert_eq!(resp.status(), 403);
    assert_eq!(resp.text().await.unwrap(), "");
    assert_eq!(renderer.calls(), 0);
    assert_eq!(store.calls.total(), 0);
}

#[tokio::test]
async fn missing_url_is_a_bad_request() {
    let base = start_server(RecordingStore::new(), FakeRenderer::rendering("")).await;

    let resp = post(&base, json!({ "apiId": API_KEY, "application": APP, "url": "  " })).await;
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), MISSING_URL_MESSAGE);
}

#[tokio::test]
async fn store_without_expiration_is_a_bad_request() {
    let store = RecordingStore::new();
    let base = start_server(store.clone(), FakeRenderer::rendering("")).await;

    let resp = post(
        &base,
        json!({ "apiId": API_KEY, "application": APP, "url": PAGE_URL, "store": true }),
    )
    .await;
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.text().await.unwrap(), MISSING_EXPIRATION_MESSAGE);
    assert_eq!(store.calls.total(), 0);
}

#[tokio::test]
async fn render_failure_is_ok_with_sentinel_body() {
    let store = RecordingStore::new();
    let renderer = FakeRenderer::with_outcome(RenderOutcome::Failed(RenderFailure::LoadFailed));
    let base = start_server(store.clone(), renderer).await;

    let resp = post(
        &base,
        json!({
            "apiId": API_KEY,
            "application": APP,
            "url": PAGE_URL,
            "store": true,
            "expirationDate": (Utc::now() + Duration::days(1)).to_rfc3339(),
        }),
    )
    .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(source(&resp), "render-failed");
    assert_eq!(resp.text().await.unwrap(), LOAD_FAILED_SENTINEL);
    assert!(store.stored_html(PAGE_URL).await.is_none());
}

#[tokio::test]
async fn fresh_snapshot_is_served_over_http() {
    let store = RecordingStore::new();
    store
        .seed(
            PAGE_URL,
            "<html>cached</html>",
            Some(SnapshotMetadata::new("", PAGE_URL, Utc::now() + Duration::days(1))),
        )
        .await;
    let renderer = FakeRenderer::rendering("<html>new</html>");
    let base = start_server(store, renderer.clone()).await;

    let resp = post(
        &base,
        json!({ "apiId": API_KEY, "application": APP, "url": PAGE_URL }),
    )
    .await;
    assert_eq!(source(&resp), "cached");
    assert_eq!(resp.text().await.unwrap(), "<html>cached</html>");
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let base = start_server(RecordingStore::new(), FakeRenderer::rendering("")).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}{SNAPSHOT_PATH}"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}
