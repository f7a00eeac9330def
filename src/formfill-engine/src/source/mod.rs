//! Event sources.
//!
//! An event source turns an instruction into an ordered stream of raw record
//! payloads. Two transports reach the same producer endpoint:
//! - [`SseSource`] keeps an event-stream connection open and yields each
//!   message as it arrives
//! - [`BulkSource`] fetches the whole body in one response and replays the
//!   records in order
//!
//! [`ReplaySource`] serves a recorded body without any network, for offline
//! runs and tests.

mod bulk;
mod push;
mod replay;

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use reqwest::Client;
use url::Url;

use crate::config::{DEFAULT_BASE_URL, ServerConfig, TransportKind};
use crate::error::{EngineError, Result};

pub use bulk::BulkSource;
pub use push::SseSource;
pub use replay::ReplaySource;

/// Ordered stream of raw record payloads, one item per record.
pub type PayloadStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("formfill/", env!("CARGO_PKG_VERSION"));

/// Path of the producer endpoint, relative to the base address.
pub const RUN_PATH: &str = "run";

/// Query parameter carrying the instruction.
pub const INSTRUCTION_PARAM: &str = "user_text";

/// Longest response body excerpt kept in an HTTP status error.
const BODY_PREVIEW_LEN: usize = 200;

/// Something that can produce the event stream for an instruction.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Open a stream for `instruction`.
    ///
    /// Errors here mean the stream never started. Errors yielded by the
    /// stream itself mean it broke part way.
    async fn open(&self, instruction: &str) -> Result<PayloadStream>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Build the producer address: `{base}/run?user_text={instruction}`.
///
/// A trailing slash on `base` is ignored. The instruction is query-encoded.
pub fn endpoint_url(base: &str, instruction: &str) -> Result<Url> {
    let base = base.trim().trim_end_matches('/');
    let url = Url::parse_with_params(
        &format!("{base}/{RUN_PATH}"),
        &[(INSTRUCTION_PARAM, instruction)],
    )?;
    Ok(url)
}

/// `base` trimmed, or the default address when it is empty.
pub fn base_url_or_default(base: &str) -> &str {
    let trimmed = base.trim();
    if trimmed.is_empty() {
        DEFAULT_BASE_URL
    } else {
        trimmed
    }
}

/// HTTP client shared by the network sources.
pub(crate) fn http_client(connect_timeout: Duration) -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(connect_timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to build HTTP client: {}, using fallback", e);
            Client::new()
        })
}

/// Turn a non-success response into [`EngineError::HttpStatus`].
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    tracing::error!(status = %status, body = %body, "Event source request failed");
    Err(EngineError::HttpStatus {
        status: status.as_u16(),
        body: preview(&body),
    })
}

fn preview(body: &str) -> String {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Build the network source selected by `config`.
pub fn source_from_config(config: &ServerConfig) -> Arc<dyn EventSource> {
    let base_url = config.effective_base_url().to_string();
    let client = http_client(config.connect_timeout());
    match config.transport {
        TransportKind::Push => Arc::new(SseSource::with_client(client, base_url)),
        TransportKind::Bulk => Arc::new(BulkSource::with_client(client, base_url)),
    }
}
