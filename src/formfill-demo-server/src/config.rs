//! Demo server settings.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default listen address, matching the client's default base address.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";

/// Default pause between two pushed events, in milliseconds.
pub const DEFAULT_EVENT_DELAY_MS: u64 = 150;

/// How `/run` delivers its records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreamMode {
    /// One event-stream message per event, paced by the event delay.
    #[default]
    Push,
    /// The whole record body in a single response.
    Bulk,
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push => write!(f, "push"),
            Self::Bulk => write!(f, "bulk"),
        }
    }
}

impl FromStr for StreamMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "push" | "sse" => Ok(Self::Push),
            "bulk" => Ok(Self::Bulk),
            _ => Err(format!("Unknown mode: {s} (expected push or bulk)")),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoServerConfig {
    pub listen_addr: String,
    pub mode: StreamMode,
    pub event_delay: Duration,
}

impl Default for DemoServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            mode: StreamMode::Push,
            event_delay: Duration::from_millis(DEFAULT_EVENT_DELAY_MS),
        }
    }
}
