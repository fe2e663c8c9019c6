//! HTTP transport: exposes a [`SnapshotService`] over axum.
//!
//! Requires the `http` feature.
//!
//! ## Routes
//!
//! - `POST /api/snapshot`: JSON [`SnapshotRequest`] body. Answers `200` with
//!   the HTML, `400` with a plain-text reason, or a bare `403`.
//! - `GET /health`: `{ "ok": true }`.
//!
//! Render failures are still `200`, with the failure sentinel as the body;
//! the `X-Snapshot-Source` header (`cached`, `rendered`, `render-failed`)
//! tells them apart.
//!
//! ## Example
//!
//! ```ignore
//! let service = Arc::new(SnapshotService::new(store, renderer, credentials));
//!
//! // Compose with other axum routes
//! let app = snapcrawl::http::router(service.clone());
//!
//! // Or serve directly
//! snapcrawl::http::serve(service, "0.0.0.0:8080").await?;
//! ```

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::orchestrator::{
    CredentialValidator, RequestError, SnapshotRequest, SnapshotResponse, SnapshotService,
};
use crate::render::Renderer;
use crate::store::SnapshotStore;

/// Path of the snapshot endpoint.
pub const SNAPSHOT_PATH: &str = "/api/snapshot";
/// Response header naming where the body came from.
pub const SOURCE_HEADER: HeaderName = HeaderName::from_static("x-snapshot-source");

const HTML_UTF8: &str = "text/html; charset=utf-8";

/// Build an axum `Router` serving snapshots from the given service.
pub fn router<S, R, V>(service: Arc<SnapshotService<S, R, V>>) -> Router
where
    S: SnapshotStore + 'static,
    R: Renderer + 'static,
    V: CredentialValidator + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route(SNAPSHOT_PATH, post(snapshot_handler::<S, R, V>))
        .with_state(service)
}

/// Serve the service over HTTP at the given address (e.g. `"0.0.0.0:8080"`).
pub async fn serve<S, R, V>(
    service: Arc<SnapshotService<S, R, V>>,
    addr: &str,
) -> Result<(), std::io::Error>
where
    S: SnapshotStore + 'static,
    R: Renderer + 'static,
    V: CredentialValidator + 'static,
{
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

/// `GET /health`
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// `POST /api/snapshot`
async fn snapshot_handler<S, R, V>(
    State(service): State<Arc<SnapshotService<S, R, V>>>,
    Json(request): Json<SnapshotRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
    R: Renderer + 'static,
    V: CredentialValidator + 'static,
{
    match service.handle(&request).await {
        Ok(response) => snapshot_response(response),
        Err(e) => error_response(e),
    }
}

fn snapshot_response(response: SnapshotResponse) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HTML_UTF8),
            (SOURCE_HEADER, response.source.as_str()),
        ],
        response.body,
    )
        .into_response()
}

fn error_response(err: RequestError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match err {
        RequestError::Forbidden => status.into_response(),
        _ => (status, err.to_string()).into_response(),
    }
}
