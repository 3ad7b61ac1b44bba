//! Wire types for the upstream chat-history endpoint.

use serde::Deserialize;
use serde_json::Value;

/// A chat record as it arrives from upstream, before the local timestamp
/// is derived. `level` defaults to 0 when the field is absent.
#[derive(Debug, Clone, Deserialize)]
pub struct RawChatRecord {
    pub id: u64,
    pub username: String,
    pub content: String,
    #[serde(default)]
    pub level: u8,
    pub timestamp: i64,
}

/// Top-level response envelope: `{ success, data: { content: [...] } }`.
#[derive(Debug, Deserialize)]
pub(super) struct HistoryEnvelope {
    #[serde(default)]
    pub success: bool,
    pub data: Option<HistoryData>,
}

/// Entries are kept as raw JSON so one malformed record can be skipped
/// without rejecting the whole batch.
#[derive(Debug, Deserialize)]
pub(super) struct HistoryData {
    #[serde(default)]
    pub content: Vec<Value>,
}
