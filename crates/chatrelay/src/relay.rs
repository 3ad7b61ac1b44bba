//! Poll loop driving fetch -> dedupe -> fan-out.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::history::{ChatRecord, HistoryStore};
use crate::settings::Settings;
use crate::upstream::ChatSource;
use crate::ws::{WsFrame, WsHub};

/// Owns the history store, the connection hub, and the background poll
/// task. Created once at startup, shared through the app state, stopped
/// on shutdown.
pub struct RelayService {
    source: Arc<dyn ChatSource>,
    /// Mutated only by the poll task; handlers take short read locks for
    /// snapshots.
    history: Mutex<HistoryStore>,
    hub: Arc<WsHub>,
    poll_interval: Duration,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RelayService {
    pub fn new(source: Arc<dyn ChatSource>, settings: &Settings) -> Self {
        Self {
            source,
            history: Mutex::new(HistoryStore::new(
                settings.retention_cap,
                settings.utc_offset_secs,
            )),
            hub: Arc::new(WsHub::new()),
            poll_interval: settings.poll_interval(),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// The viewer connection hub.
    pub fn hub(&self) -> &Arc<WsHub> {
        &self.hub
    }

    /// Current history snapshot, oldest first.
    pub async fn snapshot(&self) -> Arc<[ChatRecord]> {
        self.history.lock().await.snapshot()
    }

    /// Spawn the poll task. A no-op if it is already running.
    pub async fn start(self: Arc<Self>) {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return;
        }
        let service = Arc::clone(&self);
        *task = Some(tokio::spawn(async move { service.run().await }));
    }

    /// Cancel the poll task and wait for it to wind down.
    ///
    /// Cancellation is observed between awaits, never mid-ingest, so the
    /// buffer can't be left partially updated.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("poller task ended abnormally: {}", e);
            }
        }
    }

    async fn run(&self) {
        info!("chat poller started (interval {:?})", self.poll_interval);

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = self.poll_cycle() => {}
            }
        }

        info!("chat poller stopped");
    }

    /// One fetch -> ingest -> broadcast cycle.
    ///
    /// Any fetch failure is logged and turns the cycle into a no-op; the
    /// fixed-cadence re-poll is the only retry mechanism. The broadcast
    /// is skipped when nothing changed or nobody is connected.
    async fn poll_cycle(&self) {
        let records = match self.source.fetch().await {
            Ok(records) => records,
            Err(e) if e.is_transport() => {
                warn!("upstream fetch failed: {}", e);
                return;
            }
            Err(e) => {
                warn!("upstream protocol error: {}", e);
                return;
            }
        };

        let result = self.history.lock().await.ingest(records);

        if result.changed && self.hub.connection_count() > 0 {
            match WsFrame::history(&result.snapshot).encode() {
                Ok(frame) => {
                    let delivered = self.hub.broadcast(frame);
                    debug!(
                        "broadcast {} records to {} viewers",
                        result.snapshot.len(),
                        delivered
                    );
                }
                Err(e) => warn!("failed to encode history frame: {}", e),
            }
        }
    }
}

impl Drop for RelayService {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;

    use super::*;
    use crate::upstream::{FetchError, RawChatRecord};

    /// Replays a fixed sequence of fetch outcomes, then empty batches.
    struct ScriptedSource {
        batches: Mutex<VecDeque<Result<Vec<RawChatRecord>, FetchError>>>,
    }

    impl ScriptedSource {
        fn new(batches: Vec<Result<Vec<RawChatRecord>, FetchError>>) -> Self {
            Self {
                batches: Mutex::new(batches.into_iter().collect()),
            }
        }
    }

    #[async_trait]
    impl ChatSource for ScriptedSource {
        async fn fetch(&self) -> Result<Vec<RawChatRecord>, FetchError> {
            self.batches
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn raw(id: u64) -> RawChatRecord {
        RawChatRecord {
            id,
            username: format!("user{}", id),
            content: format!("message {}", id),
            level: 0,
            timestamp: 1700000000 + id as i64,
        }
    }

    fn relay_with(batches: Vec<Result<Vec<RawChatRecord>, FetchError>>) -> Arc<RelayService> {
        Arc::new(RelayService::new(
            Arc::new(ScriptedSource::new(batches)),
            &Settings::default(),
        ))
    }

    fn snapshot_ids(text: &str) -> Vec<u64> {
        let value: serde_json::Value = serde_json::from_str(text).unwrap();
        value["history"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["id"].as_u64().unwrap())
            .collect()
    }

    async fn register_viewer(
        relay: &Arc<RelayService>,
    ) -> tokio::sync::mpsc::Receiver<axum::extract::ws::Utf8Bytes> {
        let initial = WsFrame::history(&relay.snapshot().await).encode().unwrap();
        let (_, rx) = relay.hub().register(initial);
        rx
    }

    #[tokio::test]
    async fn test_two_cycles_broadcast_once_each() {
        let relay = relay_with(vec![
            Ok(vec![raw(1), raw(2)]),
            Ok(vec![raw(2), raw(3)]),
        ]);
        let mut rx = register_viewer(&relay).await;
        assert_eq!(snapshot_ids(rx.recv().await.unwrap().as_str()), Vec::<u64>::new());

        relay.poll_cycle().await;
        assert_eq!(snapshot_ids(rx.recv().await.unwrap().as_str()), vec![1, 2]);

        relay.poll_cycle().await;
        assert_eq!(snapshot_ids(rx.recv().await.unwrap().as_str()), vec![1, 2, 3]);

        // exactly one broadcast per cycle
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unchanged_cycle_does_not_broadcast() {
        let relay = relay_with(vec![
            Ok(vec![raw(1)]),
            Ok(vec![raw(1)]),
        ]);
        let mut rx = register_viewer(&relay).await;
        rx.recv().await.unwrap();

        relay.poll_cycle().await;
        rx.recv().await.unwrap();

        relay.poll_cycle().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_fetch_error_cycle_is_a_noop() {
        let relay = relay_with(vec![
            Err(FetchError::Upstream),
            Ok(vec![raw(1)]),
        ]);
        let mut rx = register_viewer(&relay).await;
        rx.recv().await.unwrap();

        relay.poll_cycle().await;
        assert!(rx.try_recv().is_err());
        assert!(relay.snapshot().await.is_empty());

        relay.poll_cycle().await;
        assert_eq!(snapshot_ids(rx.recv().await.unwrap().as_str()), vec![1]);
    }

    #[tokio::test]
    async fn test_ingest_happens_even_with_no_viewers() {
        let relay = relay_with(vec![Ok(vec![raw(1), raw(2)])]);
        relay.poll_cycle().await;
        assert_eq!(relay.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let relay = relay_with(vec![Ok(vec![raw(1)])]);
        Arc::clone(&relay).start().await;
        // second start is a no-op while the task runs
        Arc::clone(&relay).start().await;
        relay.stop().await;
        // stopping again is harmless
        relay.stop().await;
    }
}
