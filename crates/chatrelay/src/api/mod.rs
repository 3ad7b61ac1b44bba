//! HTTP surface: viewer page, WebSocket endpoint, health probe.

mod page;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
