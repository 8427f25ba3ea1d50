//! Identifier types for chatbar.
//!
//! Turns and steps are keyed by random UUIDs. Where a step came from is not
//! encoded in its id; it is carried explicitly as a [`StepOrigin`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 16-byte turn identifier based on UUID v4.
///
/// A new turn ID is generated for every user submission.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TurnId(uuid::Uuid);

/// A 16-byte step identifier based on UUID v4.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StepId(uuid::Uuid);

impl TurnId {
    /// Create a new `TurnId` from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random `TurnId`.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Return the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl FromStr for TurnId {
    type Err = IdError;

    /// Parse a `TurnId` from a UUID string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
        Ok(Self(uuid))
    }
}

impl fmt::Debug for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TurnId({})", self.0)
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TurnId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TurnId> for String {
    fn from(id: TurnId) -> Self {
        id.0.to_string()
    }
}

impl StepId {
    /// Create a new `StepId` from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random `StepId`.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Return the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl FromStr for StepId {
    type Err = IdError;

    /// Parse a `StepId` from a UUID string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
        Ok(Self(uuid))
    }
}

impl fmt::Debug for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StepId({})", self.0)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for StepId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StepId> for String {
    fn from(id: StepId) -> Self {
        id.0.to_string()
    }
}

/// Which event path created a step.
///
/// Visibility and deduplication rules branch on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOrigin {
    /// Appended locally when the user submitted a prompt.
    UserSubmitted,
    /// Created from a generic `Message` event.
    MessageEvent,
    /// Created from a `ToolCall` event.
    ToolCall,
    /// The authoritative terminal response from a `FinalResponse` event.
    FinalResponse,
    /// Synthesized after a turn ended without a visible response.
    Fallback,
    /// The transient "working" placeholder.
    Acknowledgment,
    /// A transport or server error.
    StreamError,
}

impl StepOrigin {
    /// String prefix used when rendering a step id for display layers that
    /// key by string.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::UserSubmitted => "user-",
            Self::MessageEvent => "msg-",
            Self::ToolCall => "tool-",
            Self::FinalResponse => "final-",
            Self::Fallback => "fallback-",
            Self::Acknowledgment => "ack-",
            Self::StreamError => "error-",
        }
    }

    /// Whether steps of this origin count as a terminal response.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::FinalResponse | Self::Fallback)
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,
}
