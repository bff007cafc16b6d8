//! Pingpong configuration types and loading

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main pingpong configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener configuration
    pub server: ServerConfig,

    /// Peer and authority client configuration
    pub relay: RelayConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.relay.forward_timeout_ms == 0 {
            return Err(eyre::eyre!("relay.forward-timeout-ms must be greater than zero"));
        }
        if self.relay.report_timeout_ms == 0 {
            return Err(eyre::eyre!("relay.report-timeout-ms must be greater than zero"));
        }
        reqwest::Url::parse(&self.relay.base_url)
            .context(format!("relay.base-url is not a valid URL: {}", self.relay.base_url))?;
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidates() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are ignored here; `load` reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let paths = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::candidates(),
        };
        paths
            .into_iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(&p).ok())
            .and_then(|config| config.log_level)
    }

    /// Project-local then user config
    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".pingpong.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("pingpong").join("pingpong.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the service listens on
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
        }
    }
}

/// Peer and authority client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Base URL under which `/ping/`, `/pong/` and `/status/` live
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Bound on a forward to the opposite peer, in milliseconds
    #[serde(rename = "forward-timeout-ms")]
    pub forward_timeout_ms: u64,

    /// Bound on a progress report or status read, in milliseconds
    #[serde(rename = "report-timeout-ms")]
    pub report_timeout_ms: u64,

    /// Report progress over HTTP instead of to the in-process store
    #[serde(rename = "remote-authority")]
    pub remote_authority: bool,
}

impl RelayConfig {
    pub fn forward_timeout(&self) -> Duration {
        Duration::from_millis(self.forward_timeout_ms)
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_millis(self.report_timeout_ms)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            forward_timeout_ms: 30_000,
            report_timeout_ms: 2_000,
            remote_authority: false,
        }
    }
}
