//! Upstream chat-history fetching.
//!
//! One HTTP GET per poll cycle against the public chatroom endpoint,
//! decoded into raw chat records. All failures come back as values; the
//! poll loop never sees a panic from here.

mod client;
mod error;
mod types;

pub use client::{ChatSource, UpstreamClient};
pub use error::FetchError;
pub use types::RawChatRecord;
