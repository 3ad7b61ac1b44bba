//! Chatroom Relay Library
//!
//! Polls an upstream chat-history API, deduplicates records into a bounded
//! buffer, and fans snapshots out to connected WebSocket viewers.

pub mod api;
pub mod history;
pub mod relay;
pub mod settings;
pub mod upstream;
pub mod ws;
