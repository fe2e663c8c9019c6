use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ConfigError, ConfigResult};
use crate::detector::DetectorConfig;
use crate::orchestrator::StaticCredentials;
use crate::render::ProcessRenderer;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapcrawlConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub renderer: RendererConfig,
    pub credentials: Vec<CredentialEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Default tracing filter; `RUST_LOG` takes precedence.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Filesystem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Root directory of the filesystem backend.
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Filesystem,
            root: PathBuf::from("./snapshots"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub program: PathBuf,
    /// Arguments placed before the detector flags and the URL.
    pub args: Vec<String>,
    /// Watchdog: the renderer process is killed after this long.
    pub timeout_ms: u64,
    pub quiescence_ms: u64,
    pub deadline_ms: u64,
    /// Pass `--quiescence-ms`/`--deadline-ms` to the renderer. Disable for
    /// renderers that do not accept them.
    pub forward_timing: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("snapcrawl-render"),
            args: Vec::new(),
            timeout_ms: 30_000,
            quiescence_ms: 300,
            deadline_ms: 10_000,
            forward_timing: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub application: String,
    pub api_key: String,
}

impl SnapcrawlConfig {
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `SNAPCRAWL_*` overrides, reading variables through `var`.
    pub fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = var("SNAPCRAWL_BIND") {
            self.server.bind = bind;
        }
        if let Some(level) = var("SNAPCRAWL_LOG_LEVEL") {
            self.server.log_level = level;
        }
        if let Some(root) = var("SNAPCRAWL_STORE_ROOT") {
            self.store.root = PathBuf::from(root);
        }
        if let Some(program) = var("SNAPCRAWL_RENDERER") {
            self.renderer.program = PathBuf::from(program);
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let renderer = &self.renderer;
        if renderer.program.as_os_str().is_empty() {
            return Err(invalid("renderer.program must not be empty"));
        }
        if renderer.quiescence_ms == 0 || renderer.deadline_ms == 0 || renderer.timeout_ms == 0 {
            return Err(invalid("renderer timings must be greater than zero"));
        }
        if renderer.quiescence_ms >= renderer.deadline_ms {
            return Err(invalid(format!(
                "renderer.quiescence_ms ({}) must be below renderer.deadline_ms ({})",
                renderer.quiescence_ms, renderer.deadline_ms
            )));
        }
        if renderer.timeout_ms <= renderer.deadline_ms {
            return Err(invalid(format!(
                "renderer.timeout_ms ({}) must exceed renderer.deadline_ms ({})",
                renderer.timeout_ms, renderer.deadline_ms
            )));
        }
        if self.server.bind.trim().is_empty() {
            return Err(invalid("server.bind must not be empty"));
        }
        if self.store.backend == StoreBackend::Filesystem && self.store.root.as_os_str().is_empty()
        {
            return Err(invalid("store.root must not be empty"));
        }
        if let Some(entry) = self
            .credentials
            .iter()
            .find(|c| c.application.is_empty() || c.api_key.is_empty())
        {
            return Err(invalid(format!(
                "credential entry for {:?} has an empty field",
                entry.application
            )));
        }
        Ok(())
    }

    pub fn detector(&self) -> DetectorConfig {
        DetectorConfig::default()
            .with_quiescence(Duration::from_millis(self.renderer.quiescence_ms))
            .with_deadline(Duration::from_millis(self.renderer.deadline_ms))
    }

    pub fn process_renderer(&self) -> ProcessRenderer {
        let renderer = ProcessRenderer::new(self.renderer.program.clone())
            .with_args(self.renderer.args.iter().cloned())
            .with_timeout(Duration::from_millis(self.renderer.timeout_ms));
        if self.renderer.forward_timing {
            renderer.with_detector(self.detector())
        } else {
            renderer
        }
    }

    pub fn static_credentials(&self) -> StaticCredentials {
        self.credentials
            .iter()
            .fold(StaticCredentials::new(), |credentials, entry| {
                credentials.with_key(entry.application.clone(), entry.api_key.clone())
            })
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}
