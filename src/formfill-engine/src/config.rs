//! Configuration management for formfill.
//!
//! Loading order:
//! - Built-in defaults
//! - `formfill.toml` in the working directory, or the file named by `FORMFILL_CONFIG`
//! - `FORMFILL_API_URL` for the event source address
//! - Command line flags (applied by the caller)

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};

/// Configuration file name.
pub const CONFIG_FILE: &str = "formfill.toml";

/// Environment variable for custom config file path.
pub const FORMFILL_CONFIG_ENV: &str = "FORMFILL_CONFIG";

/// Environment variable overriding the event source address.
pub const FORMFILL_API_URL_ENV: &str = "FORMFILL_API_URL";

/// Address used when the configured base address is empty.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Event source settings.
    pub server: ServerConfig,
    /// Typing animation settings.
    pub animation: AnimationConfig,
}

/// How events are fetched from the event source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Persistent event-stream connection, one event per message.
    #[default]
    Push,
    /// One response holding every record, replayed in order.
    Bulk,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push => write!(f, "push"),
            Self::Bulk => write!(f, "bulk"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "push" | "sse" => Ok(Self::Push),
            "bulk" | "fetch" => Ok(Self::Bulk),
            _ => Err(format!("Unknown transport: {s} (expected push or bulk)")),
        }
    }
}

/// Event source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base address of the event source. Empty means the default address.
    pub base_url: String,
    /// Transport strategy.
    pub transport: TransportKind,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            transport: TransportKind::Push,
            connect_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    /// Base address with the empty-means-default rule applied.
    pub fn effective_base_url(&self) -> &str {
        crate::source::base_url_or_default(&self.base_url)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Typing animation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Delay between two typed characters, in milliseconds.
    pub char_delay_ms: u64,
    /// Pause after clearing a field and after its last character, in milliseconds.
    pub settle_delay_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            char_delay_ms: 14,
            settle_delay_ms: 120,
        }
    }
}

impl AnimationConfig {
    pub fn char_delay(&self) -> Duration {
        Duration::from_millis(self.char_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl EngineConfig {
    /// Override the event source address if `url` is set and non-empty.
    pub fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            debug!(url = %url, "Overriding event source address");
            self.server.base_url = url;
        }
        self
    }
}

/// Parse configuration from TOML text.
pub fn parse_config_content(content: &str) -> Result<EngineConfig> {
    Ok(toml::from_str(content)?)
}

/// Resolve which config file to read, if any.
///
/// An explicit path (argument or `FORMFILL_CONFIG`) must exist; the default
/// `formfill.toml` is optional.
fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    let explicit = explicit.map(Path::to_path_buf).or_else(|| {
        std::env::var(FORMFILL_CONFIG_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    });

    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(EngineError::ConfigNotFound { path });
        }
        return Ok(Some(path));
    }

    let default_path = std::env::current_dir()?.join(CONFIG_FILE);
    Ok(default_path.is_file().then_some(default_path))
}

/// Load configuration from disk and environment.
pub fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    let config = match resolve_config_path(explicit)? {
        Some(path) => {
            debug!(path = %path.display(), "Loading config");
            let content = std::fs::read_to_string(&path)?;
            parse_config_content(&content)?
        }
        None => EngineConfig::default(),
    };

    Ok(config.with_api_url_override(std::env::var(FORMFILL_API_URL_ENV).ok()))
}
