use std::path::Path;

use async_trait::async_trait;
use formfill_protocol::split_records;

use super::{EventSource, PayloadStream};
use crate::error::Result;

/// Replays a recorded record body, ignoring the instruction.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    payloads: Vec<String>,
}

impl ReplaySource {
    /// Records in the same framing the bulk transport receives.
    pub fn new(body: &str) -> Self {
        Self {
            payloads: split_records(body).map(str::to_string).collect(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let body = std::fs::read_to_string(path)?;
        Ok(Self::new(&body))
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

#[async_trait]
impl EventSource for ReplaySource {
    async fn open(&self, _instruction: &str) -> Result<PayloadStream> {
        let items: Vec<Result<String>> = self.payloads.iter().cloned().map(Ok).collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}
