//! SnapshotService: the cache-or-render decision for one request.

use chrono::Utc;
use tracing::{debug, info, warn};

use super::credentials::CredentialValidator;
use super::inflight::InFlightRenders;
use super::request::{RequestError, SnapshotRequest};
use crate::render::{RenderFailure, RenderOutcome, Renderer, LOAD_FAILED_SENTINEL};
use crate::sanitize::strip_fragment_marker;
use crate::store::{
    CacheState, SnapshotCache, SnapshotKey, SnapshotMetadata, SnapshotStore, StoreError,
};

/// Where the body of a [`SnapshotResponse`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Served from a fresh stored snapshot.
    Cached,
    /// Freshly rendered; `previous` is the cache state that forced the render.
    Rendered { previous: CacheState, persisted: bool },
    /// The renderer failed. The body carries [`LOAD_FAILED_SENTINEL`].
    RenderFailed(RenderFailure),
}

impl SnapshotSource {
    /// Stable label, sent to HTTP callers in the `X-Snapshot-Source` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotSource::Cached => "cached",
            SnapshotSource::Rendered { .. } => "rendered",
            SnapshotSource::RenderFailed(_) => "render-failed",
        }
    }
}

/// Successful outcome of [`SnapshotService::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotResponse {
    pub body: String,
    pub source: SnapshotSource,
}

impl SnapshotResponse {
    pub fn is_render_failure(&self) -> bool {
        matches!(self.source, SnapshotSource::RenderFailed(_))
    }
}

/// Serves snapshots from a store, rendering on miss or expiry.
///
/// Generic over `S` (store), `R` (renderer) and `V` (credential validator);
/// all three are injected at construction, and the hosting layer owns their
/// lifecycle.
///
/// Per request:
///
/// 1. credentials, URL and `store ⇒ expiration` are validated, in that order;
/// 2. the application namespace is provisioned;
/// 3. a fresh snapshot is returned as-is;
/// 4. otherwise the URL is rendered and, if the render succeeded and the
///    request asked to store, the snapshot (minus its fragment marker) is
///    written back. The caller always receives the unmodified render.
///
/// Storing requests for one key render one at a time; a request that waited
/// is served the snapshot the previous one stored. Requests that do not
/// store never wait.
pub struct SnapshotService<S, R, V> {
    cache: SnapshotCache<S>,
    renderer: R,
    credentials: V,
    in_flight: InFlightRenders,
}

impl<S, R, V> SnapshotService<S, R, V>
where
    S: SnapshotStore,
    R: Renderer,
    V: CredentialValidator,
{
    pub fn new(store: S, renderer: R, credentials: V) -> Self {
        Self {
            cache: SnapshotCache::new(store),
            renderer,
            credentials,
            in_flight: InFlightRenders::new(),
        }
    }

    pub fn cache(&self) -> &SnapshotCache<S> {
        &self.cache
    }

    pub fn store(&self) -> &S {
        self.cache.store()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Handle one snapshot request.
    ///
    /// Only validation failures are errors. Store failures are absorbed by the
    /// cache policies, and render failures come back as
    /// [`SnapshotSource::RenderFailed`].
    pub async fn handle(
        &self,
        request: &SnapshotRequest,
    ) -> Result<SnapshotResponse, RequestError> {
        let application = request.application.as_str();
        if !self.credentials.validate(&request.api_key, application) {
            warn!(application, "snapshot request rejected: invalid credentials");
            return Err(RequestError::Forbidden);
        }
        let url = request.target_url()?;
        let persist_until = request.persist_until()?;
        if let Some(expiration) = persist_until {
            if expiration <= Utc::now() {
                warn!(
                    application,
                    url,
                    expiration = %expiration.to_rfc3339(),
                    "storing a snapshot that is already expired"
                );
            }
        }

        let key = SnapshotKey::from_url(url);
        self.cache.ensure_namespace(application).await;

        let state = self.cache.state(application, &key, Utc::now()).await;
        debug!(application, url, %state, "cache state");
        if state == CacheState::Fresh {
            if let Some(body) = self.read_cached(application, &key).await {
                return Ok(SnapshotResponse {
                    body,
                    source: SnapshotSource::Cached,
                });
            }
        }

        // Only storing renders are serialized per key.
        let guard = match persist_until {
            Some(_) => Some(self.in_flight.acquire(application, &key).await),
            None => None,
        };
        if guard.as_ref().is_some_and(|g| g.waited())
            && self.cache.state(application, &key, Utc::now()).await == CacheState::Fresh
        {
            // Another request rendered and stored this key while we waited.
            if let Some(body) = self.read_cached(application, &key).await {
                return Ok(SnapshotResponse {
                    body,
                    source: SnapshotSource::Cached,
                });
            }
        }

        let outcome = self.renderer.render(url).await;
        let response = match outcome {
            RenderOutcome::Rendered(html) => {
                let persisted = match persist_until {
                    Some(expiration) => {
                        let metadata = SnapshotMetadata::new(
                            request.user_agent.clone().unwrap_or_default(),
                            url,
                            expiration,
                        );
                        self.persist(application, &key, &html, &metadata).await.is_ok()
                    }
                    None => false,
                };
                SnapshotResponse {
                    body: html,
                    source: SnapshotSource::Rendered {
                        previous: state,
                        persisted,
                    },
                }
            }
            RenderOutcome::Failed(reason) => SnapshotResponse {
                body: LOAD_FAILED_SENTINEL.to_string(),
                source: SnapshotSource::RenderFailed(reason),
            },
        };
        drop(guard);
        Ok(response)
    }

    /// Remove a stored snapshot. Not part of the request flow.
    pub async fn delete(&self, application: &str, url: &str) -> Result<bool, StoreError> {
        self.cache.delete(application, &SnapshotKey::from_url(url)).await
    }

    async fn read_cached(&self, application: &str, key: &SnapshotKey) -> Option<String> {
        match self.cache.read(application, key).await {
            Ok(bytes) => {
                info!(application, %key, "serving cached snapshot");
                Some(String::from_utf8_lossy(&bytes).into_owned())
            }
            Err(e) => {
                warn!(application, %key, error = %e, "cached snapshot unreadable; re-rendering");
                None
            }
        }
    }

    async fn persist(
        &self,
        application: &str,
        key: &SnapshotKey,
        html: &str,
        metadata: &SnapshotMetadata,
    ) -> Result<(), StoreError> {
        let stripped = strip_fragment_marker(html);
        let result = self.cache.publish(application, key, &stripped, metadata).await;
        if let Err(e) = &result {
            warn!(application, %key, error = %e, "failed to store snapshot");
        }
        result
    }
}
