//! Bounded chat history with identifier-based deduplication.
//!
//! Single writer: only the poll loop mutates the store. Consumers get
//! immutable snapshots, rebuilt after every ingest that changed the
//! buffer, so a reader never observes a partially-updated window.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::upstream::RawChatRecord;

/// An accepted chat record, immutable once ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: u64,
    pub username: String,
    pub content: String,
    pub level: u8,
    /// Unix seconds, upstream clock.
    pub timestamp: i64,
    /// Local-time rendering of `timestamp` (fixed UTC offset applied at
    /// ingestion), formatted `YYYY-MM-DD HH:MM:SS`.
    pub timestamp_wib: String,
}

/// Outcome of one ingest call.
#[derive(Debug, Clone)]
pub struct IngestResult {
    /// Whether this batch added at least one record.
    pub changed: bool,
    /// The buffer contents after the batch, oldest first. Always present,
    /// whether or not anything changed.
    pub snapshot: Arc<[ChatRecord]>,
}

/// Deduplicating, bounded history of accepted chat records.
pub struct HistoryStore {
    /// Every id ever accepted. Grows without bound; ids are compact and
    /// arrival rate is a human chatroom, so this is an accepted trade-off
    /// over re-admitting evicted ids as new.
    seen: HashSet<u64>,
    /// Accepted records in arrival order, capped at `cap`.
    buffer: VecDeque<ChatRecord>,
    /// Published view of `buffer`, rebuilt on change.
    snapshot: Arc<[ChatRecord]>,
    cap: usize,
    utc_offset_secs: i64,
}

impl HistoryStore {
    pub fn new(cap: usize, utc_offset_secs: i64) -> Self {
        Self {
            seen: HashSet::new(),
            buffer: VecDeque::new(),
            snapshot: Vec::new().into(),
            cap,
            utc_offset_secs,
        }
    }

    /// Ingest one fetched batch in arrival order.
    ///
    /// Records whose id was seen before are skipped silently; dedup is by
    /// identity only, never by position, so re-fetched or interleaved
    /// records are harmless. On overflow the oldest records are evicted
    /// until the buffer fits the cap (tail-keep).
    pub fn ingest(&mut self, records: Vec<RawChatRecord>) -> IngestResult {
        let mut changed = false;

        for raw in records {
            if self.seen.contains(&raw.id) {
                continue;
            }
            self.seen.insert(raw.id);
            self.buffer.push_back(ChatRecord {
                timestamp_wib: local_time_string(raw.timestamp, self.utc_offset_secs),
                id: raw.id,
                username: raw.username,
                content: raw.content,
                level: raw.level,
                timestamp: raw.timestamp,
            });
            changed = true;
        }

        while self.buffer.len() > self.cap {
            self.buffer.pop_front();
        }

        if changed {
            self.snapshot = self.buffer.iter().cloned().collect::<Vec<_>>().into();
        }

        IngestResult {
            changed,
            snapshot: Arc::clone(&self.snapshot),
        }
    }

    /// Current snapshot, oldest first.
    pub fn snapshot(&self) -> Arc<[ChatRecord]> {
        Arc::clone(&self.snapshot)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Render `timestamp + utc_offset_secs` as a `YYYY-MM-DD HH:MM:SS` string.
///
/// Out-of-range timestamps render as an empty string rather than failing
/// the ingest.
pub fn local_time_string(timestamp: i64, utc_offset_secs: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp.saturating_add(utc_offset_secs), 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: u64) -> RawChatRecord {
        RawChatRecord {
            id,
            username: format!("user{}", id),
            content: format!("message {}", id),
            level: 0,
            timestamp: 1700000000 + id as i64,
        }
    }

    fn ids(snapshot: &[ChatRecord]) -> Vec<u64> {
        snapshot.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_ingest_appends_in_arrival_order() {
        let mut store = HistoryStore::new(1000, 25200);
        let result = store.ingest(vec![raw(1), raw(2), raw(3)]);
        assert!(result.changed);
        assert_eq!(ids(&result.snapshot), vec![1, 2, 3]);
    }

    #[test]
    fn test_ingest_is_idempotent_per_id() {
        let mut store = HistoryStore::new(1000, 25200);
        store.ingest(vec![raw(1), raw(2)]);
        let result = store.ingest(vec![raw(2), raw(1)]);
        assert!(!result.changed);
        assert_eq!(ids(&result.snapshot), vec![1, 2]);
    }

    #[test]
    fn test_ingest_dedupes_within_batch() {
        let mut store = HistoryStore::new(1000, 25200);
        let result = store.ingest(vec![raw(7), raw(7), raw(8)]);
        assert!(result.changed);
        assert_eq!(ids(&result.snapshot), vec![7, 8]);
    }

    #[test]
    fn test_interleaved_known_records_are_skipped() {
        let mut store = HistoryStore::new(1000, 25200);
        store.ingest(vec![raw(1), raw(2)]);
        let result = store.ingest(vec![raw(2), raw(3)]);
        assert!(result.changed);
        assert_eq!(ids(&result.snapshot), vec![1, 2, 3]);
    }

    #[test]
    fn test_buffer_never_exceeds_cap() {
        let mut store = HistoryStore::new(5, 25200);
        for batch_start in (0..50).step_by(10) {
            store.ingest((batch_start..batch_start + 10).map(raw).collect());
            assert!(store.len() <= 5);
        }
    }

    #[test]
    fn test_eviction_is_fifo_and_preserves_order() {
        let mut store = HistoryStore::new(3, 25200);
        store.ingest(vec![raw(1), raw(2), raw(3)]);
        let result = store.ingest(vec![raw(4), raw(5)]);
        // oldest two dropped, survivors keep their relative order
        assert_eq!(ids(&result.snapshot), vec![3, 4, 5]);
    }

    #[test]
    fn test_unchanged_ingest_still_returns_snapshot() {
        let mut store = HistoryStore::new(1000, 25200);
        store.ingest(vec![raw(1)]);
        let result = store.ingest(vec![]);
        assert!(!result.changed);
        assert_eq!(ids(&result.snapshot), vec![1]);
    }

    #[test]
    fn test_local_time_string_applies_offset() {
        // 1700000000 is 2023-11-14 22:13:20 UTC; +7h crosses midnight.
        assert_eq!(
            local_time_string(1700000000, 25200),
            "2023-11-15 05:13:20"
        );
        assert_eq!(local_time_string(1700000000, 0), "2023-11-14 22:13:20");
    }

    #[test]
    fn test_local_time_string_out_of_range() {
        assert_eq!(local_time_string(i64::MAX, 25200), "");
    }

    #[test]
    fn test_record_serialization_fields() {
        let mut store = HistoryStore::new(10, 25200);
        let result = store.ingest(vec![raw(1)]);
        let json = serde_json::to_value(&result.snapshot[0]).unwrap();
        for field in ["id", "username", "content", "level", "timestamp", "timestamp_wib"] {
            assert!(json.get(field).is_some(), "missing field {}", field);
        }
    }
}
