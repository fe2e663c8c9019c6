//! Service configuration.
//!
//! Loaded in three tiers, each overriding the previous one:
//! 1. TOML file (`snapcrawl.toml`, or the path in `SNAPCRAWL_CONFIG`);
//! 2. environment variables (`SNAPCRAWL_BIND`, `SNAPCRAWL_LOG_LEVEL`,
//!    `SNAPCRAWL_STORE_ROOT`, `SNAPCRAWL_RENDERER`);
//! 3. command-line flags, applied by the binary.
//!
//! Every field has a default, so an absent file yields a runnable (if
//! credential-less) configuration.

mod types;

use std::path::{Path, PathBuf};

pub use types::{
    CredentialEntry, RendererConfig, ServerConfig, SnapcrawlConfig, StoreBackend, StoreConfig,
};

/// Default file name searched for in the working directory.
pub const CONFIG_FILE_NAME: &str = "snapcrawl.toml";
/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "SNAPCRAWL_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Locate, parse, override and validate the configuration.
///
/// With an explicit `path` the file must exist. Otherwise `SNAPCRAWL_CONFIG`
/// is consulted, then `./snapcrawl.toml`; if neither exists the defaults are used.
pub fn load_config(path: Option<&Path>) -> ConfigResult<SnapcrawlConfig> {
    let file = match path {
        Some(path) => Some(require_file(path.to_path_buf())?),
        None => match std::env::var_os(CONFIG_PATH_ENV) {
            Some(env_path) => Some(require_file(PathBuf::from(env_path))?),
            None => Some(PathBuf::from(CONFIG_FILE_NAME)).filter(|p| p.is_file()),
        },
    };

    let mut config = match file {
        Some(file) => SnapcrawlConfig::from_toml_str(&std::fs::read_to_string(file)?)?,
        None => SnapcrawlConfig::default(),
    };
    config.apply_overrides(|name| std::env::var(name).ok());
    config.validate()?;
    Ok(config)
}

fn require_file(path: PathBuf) -> ConfigResult<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(ConfigError::FileNotFound(path))
    }
}
