//! The inbound seam between a session transport and the engine.
//!
//! A transport opens one event stream per turn. The stream yields events in
//! delivery order; ending the stream is a normal turn end, yielding an
//! `Err` is a stream failure.

use async_trait::async_trait;
use chatbar_core::SessionEvent;
use futures::stream::BoxStream;
use thiserror::Error;

/// A turn's ordered stream of session events.
pub type EventStream = BoxStream<'static, Result<SessionEvent, TransportError>>;

/// Error type for transport operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Failed to connect or submit the prompt.
    #[error("connection failed: {0}")]
    Connection(String),

    /// An event could not be decoded.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The stream closed unexpectedly.
    #[error("stream closed: {0}")]
    Closed(String),
}

/// Opens event streams for submitted prompts.
///
/// Injected into the engine instead of being reached through a process-wide
/// shared session manager.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Submit a prompt and return the stream of events answering it.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Connection` if the prompt could not be
    /// submitted.
    async fn open_turn(&self, prompt: &str) -> Result<EventStream, TransportError>;
}

/// Wrap an in-memory list of events as an `EventStream`.
#[must_use]
pub fn stream_from_events<I>(events: I) -> EventStream
where
    I: IntoIterator<Item = Result<SessionEvent, TransportError>>,
    I::IntoIter: Send + 'static,
{
    Box::pin(futures::stream::iter(events))
}
