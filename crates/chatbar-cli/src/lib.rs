//! Replay tooling for the chatbar engine.
//!
//! The `chatbar` binary feeds a recorded JSON-lines session through a
//! [`ConversationEngine`](chatbar_engine::ConversationEngine) and prints the
//! resulting surfaces. The pieces are exposed here so they can be tested
//! without spawning the binary.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod render;
pub mod replay;
pub mod wire;

pub use render::{Surface, Transcript};
pub use replay::ReplayTransport;
