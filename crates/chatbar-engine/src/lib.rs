//! Session event reconciliation engine for chatbar.
//!
//! This crate decides, from a streamed sequence of heterogeneous session
//! events, which steps a chat surface shows, and guarantees every turn ends
//! with something visible even when the server drops the stream or never
//! sends a final response.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 SessionTransport (EventStream)               │
//! └──────────────────────────────────────────────────────────────┘
//!                               │  one event at a time
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ConversationEngine                      │
//! │  ┌────────────┐ ┌────────────┐ ┌──────────┐ ┌─────────────┐  │
//! │  │ classifier │ │ visibility │ │   ack    │ │    guard    │  │
//! │  └────────────┘ └────────────┘ └──────────┘ └─────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!                               │  read-only
//!                               ▼
//!              StepsReader (primary / detail surfaces)
//! ```
//!
//! # Usage
//!
//! ```
//! use chatbar_core::SessionEvent;
//! use chatbar_engine::{stream_from_events, ConversationEngine};
//!
//! # async fn example() {
//! let engine = ConversationEngine::with_defaults();
//! let events = stream_from_events(vec![Ok(SessionEvent::final_response("Done"))]);
//! let summary = engine.run_turn("Do the thing", events).await;
//!
//! assert!(summary.terminal.is_some());
//! assert_eq!(engine.primary().len(), 2);
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ack;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod transport;
pub mod turn;
pub mod visibility;

pub use ack::AckState;
pub use classifier::{DiscardReason, Outcome};
pub use config::EngineConfig;
pub use engine::{Completion, ConversationEngine, SharedSteps, StepsReader, TurnSummary};
pub use error::{EngineError, Result};
pub use guard::StepList;
pub use transport::{stream_from_events, EventStream, SessionTransport, TransportError};
pub use turn::TurnState;
pub use visibility::{detail_projection, is_visible_in_detail, is_visible_in_primary, primary_projection};

// Re-export commonly used types from dependencies for convenience
pub use chatbar_core::{
    Role, SessionEvent, Step, StepId, StepKind, StepMetadata, StepOrigin, StepStatus, TurnId,
};
