use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `"Url is required for crawl"` rejections.
pub const MISSING_URL_MESSAGE: &str = "Url is required for crawl";
/// Body of `store` requests that carry no expiration.
pub const MISSING_EXPIRATION_MESSAGE: &str =
    "Can't store the crawl result without an expiration date";

/// A request for a snapshot of `url` within `application`.
///
/// Deserialized directly from the HTTP body; every field is optional on the
/// wire so that validation (not the JSON decoder) decides what a missing
/// value means.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRequest {
    /// API key checked against the credential validator before anything else.
    #[serde(rename = "apiId", alias = "apiKey", default)]
    pub api_key: String,
    #[serde(default)]
    pub application: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Persist the rendered snapshot on success.
    #[serde(default)]
    pub store: bool,
    /// Required when `store` is set.
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Recorded as snapshot metadata; not used for rendering.
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl SnapshotRequest {
    pub fn new(application: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Ask for the result to be stored until `expiration`.
    pub fn store_until(mut self, expiration: DateTime<Utc>) -> Self {
        self.store = true;
        self.expiration_date = Some(expiration);
        self
    }

    pub fn with_store(mut self, store: bool) -> Self {
        self.store = store;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// The target URL, rejecting absent or blank values.
    pub fn target_url(&self) -> Result<&str, RequestError> {
        match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(RequestError::MissingUrl),
        }
    }

    /// The expiration to persist with, or `None` when the request does not store.
    pub fn persist_until(&self) -> Result<Option<DateTime<Utc>>, RequestError> {
        match (self.store, self.expiration_date) {
            (false, _) => Ok(None),
            (true, Some(expiration)) => Ok(Some(expiration)),
            (true, None) => Err(RequestError::MissingExpiration),
        }
    }
}

/// Reasons a request is rejected before it reaches the cache or the renderer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("forbidden")]
    Forbidden,
    #[error("{}", MISSING_URL_MESSAGE)]
    MissingUrl,
    #[error("{}", MISSING_EXPIRATION_MESSAGE)]
    MissingExpiration,
}

impl RequestError {
    /// Map this error to an HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            RequestError::Forbidden => 403,
            RequestError::MissingUrl => 400,
            RequestError::MissingExpiration => 400,
        }
    }
}
