//! Server-to-client frame types.

use axum::extract::ws::Utf8Bytes;
use serde::Serialize;

use crate::history::ChatRecord;

/// Frames pushed to viewers.
///
/// Serialized untagged: a data frame is `{"history": [...]}`, a liveness
/// ping is `{"ping": true}`. Clients tell them apart by which key is
/// present, so the two variants must never share one.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum WsFrame<'a> {
    History { history: &'a [ChatRecord] },
    Ping { ping: bool },
}

impl<'a> WsFrame<'a> {
    /// Data frame carrying a full history snapshot, oldest first.
    pub fn history(history: &'a [ChatRecord]) -> Self {
        WsFrame::History { history }
    }

    /// Liveness ping; carries no chat payload.
    pub fn ping() -> WsFrame<'static> {
        WsFrame::Ping { ping: true }
    }

    /// Encode to the JSON text sent over the socket.
    pub fn encode(&self) -> Result<Utf8Bytes, serde_json::Error> {
        serde_json::to_string(self).map(Utf8Bytes::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64) -> ChatRecord {
        ChatRecord {
            id,
            username: "alice".to_string(),
            content: "hello".to_string(),
            level: 1,
            timestamp: 1700000000,
            timestamp_wib: "2023-11-15 05:13:20".to_string(),
        }
    }

    #[test]
    fn test_history_frame_shape() {
        let records = vec![record(1), record(2)];
        let text = WsFrame::history(&records).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();

        assert!(value.get("ping").is_none());
        let history = value.get("history").unwrap().as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["id"], 1);
        assert_eq!(history[0]["timestamp_wib"], "2023-11-15 05:13:20");
    }

    #[test]
    fn test_ping_frame_shape() {
        let text = WsFrame::ping().encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();

        assert_eq!(value.get("ping"), Some(&serde_json::Value::Bool(true)));
        assert!(value.get("history").is_none());
    }

    #[test]
    fn test_empty_history_frame() {
        let text = WsFrame::history(&[]).encode().unwrap();
        assert_eq!(text.as_str(), r#"{"history":[]}"#);
    }
}
