//! Upstream HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::error::FetchError;
use super::types::{HistoryEnvelope, RawChatRecord};

/// Source of chat records for the poll loop.
///
/// The production implementation is [`UpstreamClient`]; tests drive the
/// loop with scripted sources.
#[async_trait]
pub trait ChatSource: Send + Sync {
    /// Fetch the current batch of chat records from upstream.
    async fn fetch(&self) -> Result<Vec<RawChatRecord>, FetchError>;
}

/// Client for the public chat-history endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    /// HTTP client, shared across all requests.
    client: Client,
    /// Endpoint URL polled each cycle.
    url: String,
}

impl UpstreamClient {
    /// Create a new upstream client with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ChatSource for UpstreamClient {
    async fn fetch(&self) -> Result<Vec<RawChatRecord>, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let envelope: HistoryEnvelope = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        if !envelope.success {
            return Err(FetchError::Upstream);
        }

        let data = envelope
            .data
            .ok_or_else(|| FetchError::Decode("missing data object".to_string()))?;

        // Decode entries one by one so a malformed record is skipped
        // without rejecting its neighbors.
        let mut records = Vec::with_capacity(data.content.len());
        for entry in data.content {
            match serde_json::from_value::<RawChatRecord>(entry) {
                Ok(record) => records.push(record),
                Err(e) => debug!("skipping malformed chat entry: {}", e),
            }
        }

        Ok(records)
    }
}
