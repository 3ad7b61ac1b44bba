//! WebSocket push channel for viewers.
//!
//! Each viewer holds one persistent connection. The hub tracks live
//! connections and fans history snapshots out to all of them; every
//! connection's socket task also emits periodic liveness pings. Frames
//! are structurally disjoint: data frames carry a `history` key, ping
//! frames only `{"ping": true}`.

mod handler;
mod hub;
mod types;

pub use handler::ws_handler;
pub use hub::WsHub;
pub use types::WsFrame;
