//! Connection registry and broadcast fan-out.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Utf8Bytes;
use dashmap::DashMap;
use log::{info, warn};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Size of the per-connection send buffer.
const CONNECTION_BUFFER_SIZE: usize = 64;

/// A sender for encoded frames to a specific viewer connection.
pub type WsSender = mpsc::Sender<Utf8Bytes>;

/// Hub tracking all live viewer connections.
///
/// Registration and removal can race an in-flight broadcast sweep; the
/// map is concurrency-safe and removals are keyed by connection id, so a
/// concurrent join is neither skipped nor double-removed.
pub struct WsHub {
    /// Connection ID -> its frame sender.
    connections: DashMap<u64, WsSender>,

    /// Monotonic connection id source.
    next_id: AtomicU64,
}

impl WsHub {
    /// Create a new hub with no connections.
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a new viewer connection.
    ///
    /// The initial snapshot frame is queued on the connection's channel
    /// before the connection joins broadcast scope, so a viewer never
    /// waits for the next poll tick to see existing history.
    pub fn register(&self, initial: Utf8Bytes) -> (u64, mpsc::Receiver<Utf8Bytes>) {
        let conn_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER_SIZE);

        if tx.try_send(initial).is_err() {
            warn!("failed to queue initial snapshot for connection {}", conn_id);
        }
        self.connections.insert(conn_id, tx);

        info!("registered viewer connection {}", conn_id);
        (conn_id, rx)
    }

    /// Unregister a viewer connection. Unknown ids are a no-op.
    pub fn unregister(&self, conn_id: u64) {
        if self.connections.remove(&conn_id).is_some() {
            info!("unregistered viewer connection {}", conn_id);
        }
    }

    /// Number of currently registered connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Fan one encoded frame out to every registered connection.
    ///
    /// A connection whose delivery fails (closed, or its buffer is full
    /// because the peer stopped draining) is marked and removed after the
    /// sweep; the sweep itself never aborts and never retries. Returns
    /// the number of connections the frame was queued for.
    pub fn broadcast(&self, frame: Utf8Bytes) -> usize {
        let mut delivered = 0;
        let mut stale = Vec::new();

        for entry in self.connections.iter() {
            match entry.value().try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!("viewer connection {} is not draining, dropping it", entry.key());
                    stale.push(*entry.key());
                }
                Err(TrySendError::Closed(_)) => {
                    stale.push(*entry.key());
                }
            }
        }

        for conn_id in stale {
            self.unregister(conn_id);
        }

        delivered
    }
}

impl Default for WsHub {
    fn default() -> Self {
        Self::new()
    }
}
