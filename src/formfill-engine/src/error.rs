//! Error types for the formfill engine.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for the engine.
///
/// Per-record problems (malformed payloads, unknown kinds, unknown fields) are
/// not errors at this level: the router reports them as log entries and keeps
/// going. Everything here either ends a session or prevents one from starting.
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // Transport errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from event source: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Invalid event source address: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Session misuse
    #[error("Instruction is empty")]
    EmptyInstruction,

    #[error("A run is already in progress")]
    AlreadyRunning,
}

impl EngineError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a stream error.
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream(message.into())
    }

    /// Whether this error came from talking to the event source.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::HttpStatus { .. } | Self::Stream(_) | Self::InvalidUrl(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(EngineError::stream("reset by peer").is_transport());
        assert!(
            EngineError::HttpStatus {
                status: 502,
                body: String::new()
            }
            .is_transport()
        );
        assert!(!EngineError::EmptyInstruction.is_transport());
        assert!(!EngineError::config("bad").is_transport());
    }

    #[test]
    fn test_http_status_message() {
        let err = EngineError::HttpStatus {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500 from event source: boom");
    }
}
