//! Layered configuration: defaults, optional TOML file, environment overrides.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

fn default_upstream_url() -> String {
    "https://indodax.com/api/v2/chatroom/history".to_string()
}
fn default_poll_interval_secs() -> u64 {
    1
}
fn default_retention_cap() -> usize {
    1000
}
fn default_ping_interval_secs() -> u64 {
    30
}
fn default_utc_offset_secs() -> i64 {
    7 * 3600
}
fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

/// Runtime settings for the relay server.
///
/// Every tunable has a default; a TOML file and `CHATRELAY_*` environment
/// variables can override any of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Upstream chat-history endpoint polled for new records.
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,
    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Maximum number of chat records retained and pushed to viewers.
    #[serde(default = "default_retention_cap")]
    pub retention_cap: usize,
    /// Seconds between liveness pings on each viewer connection.
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    /// Offset applied to upstream unix timestamps when deriving the
    /// local-time string (default +7h, WIB).
    #[serde(default = "default_utc_offset_secs")]
    pub utc_offset_secs: i64,
    /// Per-request timeout for upstream fetches.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origin; empty disables the CORS layer.
    #[serde(default)]
    pub cors_origin: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            upstream_url: default_upstream_url(),
            poll_interval_secs: default_poll_interval_secs(),
            retention_cap: default_retention_cap(),
            ping_interval_secs: default_ping_interval_secs(),
            utc_offset_secs: default_utc_offset_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            host: default_host(),
            port: default_port(),
            cors_origin: String::new(),
        }
    }
}

impl Settings {
    /// Load settings, layering an optional config file under environment
    /// variables (`CHATRELAY_HOST`, `CHATRELAY_RETENTION_CAP`, ...).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        builder = match path {
            Some(path) => builder.add_source(File::from(path).format(FileFormat::Toml)),
            None => builder.add_source(File::with_name("chatrelay").required(false)),
        };

        builder = builder.add_source(Environment::with_prefix("CHATRELAY"));

        builder
            .build()
            .context("loading configuration")?
            .try_deserialize()
            .context("parsing configuration")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
