use std::collections::{HashMap, HashSet};

/// Decides whether an API key may request snapshots for an application.
///
/// Implemented for any `Fn(&str, &str) -> bool` (arguments: api key,
/// application), so a closure can stand in for a real credential store.
pub trait CredentialValidator: Send + Sync {
    fn validate(&self, api_key: &str, application: &str) -> bool;
}

impl<F> CredentialValidator for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn validate(&self, api_key: &str, application: &str) -> bool {
        self(api_key, application)
    }
}

/// Fixed table of application → accepted API keys.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    keys: HashMap<String, HashSet<String>>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `api_key` for `application`. Builder-style.
    pub fn with_key(mut self, application: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.insert(application, api_key);
        self
    }

    pub fn insert(&mut self, application: impl Into<String>, api_key: impl Into<String>) {
        self.keys
            .entry(application.into())
            .or_default()
            .insert(api_key.into());
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl CredentialValidator for StaticCredentials {
    fn validate(&self, api_key: &str, application: &str) -> bool {
        !api_key.is_empty()
            && self
                .keys
                .get(application)
                .is_some_and(|keys| keys.contains(api_key))
    }
}
