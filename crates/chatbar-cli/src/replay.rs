//! Session transport that replays a recorded script from disk.

use std::path::PathBuf;

use async_trait::async_trait;
use chatbar_engine::{stream_from_events, EventStream, SessionTransport, TransportError};

use crate::wire;

/// Replays the same recorded script for every submitted prompt.
#[derive(Debug, Clone)]
pub struct ReplayTransport {
    path: PathBuf,
}

impl ReplayTransport {
    /// Create a transport reading from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionTransport for ReplayTransport {
    async fn open_turn(&self, prompt: &str) -> Result<EventStream, TransportError> {
        let script = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| TransportError::Connection(format!("{}: {e}", self.path.display())))?;

        let events = wire::decode_script(&script);
        tracing::debug!(
            path = %self.path.display(),
            prompt_len = prompt.len(),
            events = events.len(),
            "Replaying session script"
        );
        Ok(stream_from_events(events))
    }
}
