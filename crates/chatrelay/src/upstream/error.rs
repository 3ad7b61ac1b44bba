//! Fetch error types.

use thiserror::Error;

/// Errors from one upstream fetch.
///
/// `Transport` covers network-level failures (timeout, refused
/// connection); the remaining variants are protocol errors where the HTTP
/// exchange succeeded but the response was not usable.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed before a response was available.
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-success HTTP status.
    #[error("upstream returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// Upstream answered 200 but reported failure (`success != true`).
    #[error("upstream reported failure")]
    Upstream,

    /// Response body did not match the expected payload shape.
    #[error("unexpected upstream payload: {0}")]
    Decode(String),
}

impl FetchError {
    /// True for network-level failures, false for protocol errors.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
