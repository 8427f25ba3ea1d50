//! Core types for chatbar.
//!
//! This crate provides the data model shared by the reconciliation engine
//! and its front ends:
//!
//! - **Identifiers**: turn and step ids, and the [`StepOrigin`] provenance tag
//! - **Steps**: the canonical display records the engine maintains
//! - **Events**: the typed session events a transport delivers
//!
//! # Example
//!
//! ```
//! use chatbar_core::{Step, StepKind, TurnId};
//!
//! let turn = TurnId::generate();
//! let step = Step::user(turn, "What's the weather?");
//! assert_eq!(step.kind, StepKind::UserMessage);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod event;
pub mod ids;
pub mod step;

pub use error::{CoreError, Result};
pub use event::{Role, SessionEvent};
pub use ids::{IdError, StepId, StepOrigin, TurnId};
pub use step::{Step, StepKind, StepMetadata, StepStatus, ToolDetails};
