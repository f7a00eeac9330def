//! Push transport over an event-stream connection.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use eventsource_stream::Eventsource;
use formfill_protocol::split_message_data;
use futures::{StreamExt, future, stream};
use reqwest::Client;
use reqwest::header::{ACCEPT, CACHE_CONTROL};

use super::{EventSource, PayloadStream, base_url_or_default, check_status, endpoint_url, http_client};
use crate::error::{EngineError, Result};

/// Appended after the last body chunk so a final message that is not
/// followed by a blank line still gets dispatched.
const END_OF_STREAM: &[u8] = b"\n\n";

/// Event source reading `text/event-stream` messages as they arrive.
///
/// Every line of a message's `data` is one record payload, so records sent
/// on consecutive `data:` lines are not merged. Messages with empty data
/// (keep-alives) yield nothing. The connection closes when the returned
/// stream is dropped.
#[derive(Debug, Clone)]
pub struct SseSource {
    client: Client,
    base_url: String,
}

impl SseSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(http_client(Duration::from_secs(10)), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url_or_default(&base_url.into()).to_string(),
        }
    }
}

#[async_trait]
impl EventSource for SseSource {
    async fn open(&self, instruction: &str) -> Result<PayloadStream> {
        let url = endpoint_url(&self.base_url, instruction)?;
        tracing::debug!(url = %url, "Opening event stream");

        let resp = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        let resp = check_status(resp).await?;
        tracing::debug!(status = %resp.status(), "Event stream connected");

        let stream = resp
            .bytes_stream()
            .chain(stream::once(future::ready(Ok(Bytes::from_static(
                END_OF_STREAM,
            )))))
            .eventsource()
            .flat_map(|event| {
                let payloads: Vec<Result<String>> = match event {
                    Ok(event) => split_message_data(&event.data)
                        .map(|payload| Ok(payload.to_string()))
                        .collect(),
                    Err(e) => vec![Err(EngineError::stream(e.to_string()))],
                };
                stream::iter(payloads)
            });

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &'static str {
        "push"
    }
}
