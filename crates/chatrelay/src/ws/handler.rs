//! WebSocket handler for viewer connections.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use log::{info, warn};

use crate::api::AppState;
use crate::relay::RelayService;

use super::types::WsFrame;

/// WebSocket upgrade handler.
///
/// GET /ws
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let relay = state.relay.clone();
    let ping_interval = state.settings.ping_interval();

    ws.on_upgrade(move |socket| handle_socket(socket, relay, ping_interval))
}

/// Drive one viewer connection until it closes or delivery fails.
async fn handle_socket(socket: WebSocket, relay: Arc<RelayService>, ping_interval: Duration) {
    let (mut sender, mut receiver) = socket.split();

    // Full current snapshot goes out first, before the connection joins
    // broadcast scope.
    let snapshot = relay.snapshot().await;
    let initial = match WsFrame::history(&snapshot).encode() {
        Ok(frame) => frame,
        Err(e) => {
            warn!("failed to encode initial snapshot: {}", e);
            return;
        }
    };
    let ping = match WsFrame::ping().encode() {
        Ok(frame) => frame,
        Err(e) => {
            warn!("failed to encode ping frame: {}", e);
            return;
        }
    };

    let (conn_id, mut frames) = relay.hub().register(initial);

    // First ping fires one full interval after connect, then on cadence,
    // independent of the poll loop.
    let mut ping_timer = tokio::time::interval_at(
        tokio::time::Instant::now() + ping_interval,
        ping_interval,
    );

    loop {
        tokio::select! {
            maybe_frame = frames.recv() => {
                let Some(frame) = maybe_frame else { break };
                if sender.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }

            _ = ping_timer.tick() => {
                if sender.send(Message::Text(ping.clone())).await.is_err() {
                    break;
                }
            }

            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    // Viewers are read-only; drain anything else they send.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("websocket error on connection {}: {}", conn_id, e);
                        break;
                    }
                }
            }
        }
    }

    relay.hub().unregister(conn_id);
    info!("viewer connection {} closed", conn_id);
}
