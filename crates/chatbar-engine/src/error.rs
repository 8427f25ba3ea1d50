//! Error types for the engine.
//!
//! Event classification is total and never fails; these errors only occur
//! at the seams: opening a turn's stream and loading configuration.

use chatbar_core::CoreError;
use thiserror::Error;

use crate::transport::TransportError;

/// A result type using `EngineError`.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur around the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A core type error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}
