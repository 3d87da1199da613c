//! Configuration loading and data folder resolution
//!
//! Both binaries read the same optional TOML file. Each one only looks at
//! its own section; absent files or sections fall back to compiled defaults.
//!
//! Config file resolution order:
//! 1. Command-line argument (highest priority)
//! 2. `TLM_CONFIG` environment variable
//! 3. `<config dir>/tlm/config.toml` if it exists
//! 4. No file: compiled defaults

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TLM_CONFIG";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub board: BoardConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[gateway]` section: bind address, credentials and upstream overrides
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub igdb_client_id: Option<String>,
    pub igdb_client_secret: Option<String>,
    pub google_books_api_key: Option<String>,
    pub bangumi_access_token: Option<String>,
    pub twitch_token_url: Option<String>,
    pub igdb_base_url: Option<String>,
    pub google_books_base_url: Option<String>,
    pub bangumi_base_url: Option<String>,
}

/// `[board]` section: where the board is saved and which gateway it talks to
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardConfig {
    pub data_dir: Option<PathBuf>,
    pub gateway_url: Option<String>,
}

/// Pick the config file to read, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory, only when the file is there
    default_config_path().filter(|p| p.exists())
}

/// `<config dir>/tlm/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tlm").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read {}: {}", path.display(), e))
    })?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Configuration plus the file it was read from
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    /// `None` when compiled defaults are in use
    pub source: Option<PathBuf>,
}

impl LoadedConfig {
    /// Report where the configuration came from
    ///
    /// Call once tracing is initialized; loading happens before that because
    /// the log level itself is configured here.
    pub fn log_source(&self) {
        match &self.source {
            Some(path) => info!("Loaded configuration from {}", path.display()),
            None => info!("No configuration file found, using defaults"),
        }
    }
}

/// Resolve and load the configuration
///
/// No config file at all is not an error. A file that was named explicitly
/// but cannot be read or parsed is.
pub fn load_config(cli_arg: Option<&Path>) -> Result<LoadedConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) => Ok(LoadedConfig {
            config: load_toml_config(&path)?,
            source: Some(path),
        }),
        None => Ok(LoadedConfig::default()),
    }
}

/// OS-dependent default folder for saved boards
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tlm"))
        .unwrap_or_else(|| PathBuf::from("./tlm_data"))
}
