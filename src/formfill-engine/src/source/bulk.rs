//! Bulk transport: one request, one body, every record replayed in order.

use std::time::Duration;

use async_trait::async_trait;
use formfill_protocol::split_records;
use reqwest::Client;

use super::{EventSource, PayloadStream, base_url_or_default, check_status, endpoint_url, http_client};
use crate::error::Result;

/// Event source that downloads the full record body before yielding.
///
/// Used where the hosting environment cannot keep a connection open. Nothing
/// is visible until the body has arrived; after that the sequence of records
/// is the same as the push transport's.
#[derive(Debug, Clone)]
pub struct BulkSource {
    client: Client,
    base_url: String,
}

impl BulkSource {
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
impl EventSource for BulkSource {
    async fn open(&self, instruction: &str) -> Result<PayloadStream> {
        let url = endpoint_url(&self.base_url, instruction)?;
        tracing::debug!(url = %url, "Fetching record body");

        let resp = self.client.get(url).send().await?;
        let body = check_status(resp).await?.text().await?;

        let payloads: Vec<Result<String>> = split_records(&body)
            .map(|payload| Ok(payload.to_string()))
            .collect();
        tracing::debug!(bytes = body.len(), records = payloads.len(), "Record body received");

        Ok(Box::pin(futures::stream::iter(payloads)))
    }

    fn name(&self) -> &'static str {
        "bulk"
    }
}
