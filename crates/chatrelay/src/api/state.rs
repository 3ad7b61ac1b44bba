//! Application state shared across handlers.

use std::sync::Arc;

use crate::relay::RelayService;
use crate::settings::Settings;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Relay service owning the history store and the connection hub.
    pub relay: Arc<RelayService>,
    /// Loaded runtime settings.
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create new application state.
    pub fn new(relay: Arc<RelayService>, settings: Settings) -> Self {
        Self {
            relay,
            settings: Arc::new(settings),
        }
    }
}
