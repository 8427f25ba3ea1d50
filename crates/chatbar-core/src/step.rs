//! The canonical unit of conversation content.
//!
//! Steps are created when an event is classified and may be mutated in
//! place later (a tool result completing its tool call, the acknowledgment
//! being rewritten at turn end). Only the acknowledgment is ever removed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{StepId, StepOrigin, TurnId};

// =============================================================================
// Step Enums
// =============================================================================

/// What a step represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// The user's own submitted text.
    UserMessage,
    /// Agent reasoning or progress output.
    Thought,
    /// A tool call and, once it arrives, its result.
    ToolInvocation,
    /// Assistant response content.
    Response,
}

impl StepKind {
    /// Human-readable display string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UserMessage => "User",
            Self::Thought => "Thought",
            Self::ToolInvocation => "Tool",
            Self::Response => "Response",
        }
    }
}

/// Lifecycle status of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Still in progress.
    Active,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl StepStatus {
    /// Human-readable display string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

/// Server-supplied visibility hint. Authoritative when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepMetadata {
    /// The step is transient progress output.
    #[serde(default)]
    pub is_status: bool,
    /// The step is a final answer.
    #[serde(default)]
    pub is_final: bool,
    /// Free-form server message type.
    #[serde(default)]
    pub message_type: String,
}

impl StepMetadata {
    /// Metadata attached to authoritative terminal responses.
    #[must_use]
    pub fn terminal_response() -> Self {
        Self {
            is_status: false,
            is_final: true,
            message_type: "response".to_string(),
        }
    }

    /// Metadata attached to the acknowledgment placeholder.
    #[must_use]
    pub fn acknowledgment() -> Self {
        Self {
            is_status: true,
            is_final: false,
            message_type: "acknowledgment".to_string(),
        }
    }
}

/// Tool call details, populated only for `ToolInvocation` steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDetails {
    /// Tool name.
    pub name: String,
    /// Tool parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    /// Tool output once the result has arrived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Tool error message if the call failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Server-assigned tool call id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
}

// =============================================================================
// Step
// =============================================================================

/// A displayable unit of conversation content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Unique step id.
    pub id: StepId,
    /// Turn this step belongs to.
    pub turn: TurnId,
    /// Which event path created the step.
    pub origin: StepOrigin,
    /// What the step represents.
    pub kind: StepKind,
    /// Display content, possibly markdown.
    pub text: String,
    /// Lifecycle status.
    pub status: StepStatus,
    /// Nested under the parent turn. Only tool calls are indented.
    pub is_indented: bool,
    /// Server visibility hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<StepMetadata>,
    /// Tool details for `ToolInvocation` steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolDetails>,
    /// Id of the server event this step was created from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Step {
    fn new(turn: TurnId, origin: StepOrigin, kind: StepKind, text: String) -> Self {
        Self {
            id: StepId::generate(),
            turn,
            origin,
            kind,
            text,
            status: StepStatus::Completed,
            is_indented: false,
            metadata: None,
            tool: None,
            source_id: None,
            created_at: Utc::now(),
        }
    }

    /// The user's submitted prompt.
    #[must_use]
    pub fn user(turn: TurnId, text: impl Into<String>) -> Self {
        Self::new(turn, StepOrigin::UserSubmitted, StepKind::UserMessage, text.into())
    }

    /// The transient "working" placeholder shown until the first event.
    #[must_use]
    pub fn acknowledgment(turn: TurnId, text: impl Into<String>) -> Self {
        let mut step = Self::new(turn, StepOrigin::Acknowledgment, StepKind::Response, text.into());
        step.status = StepStatus::Active;
        step.metadata = Some(StepMetadata::acknowledgment());
        step
    }

    /// An active thought from a message event.
    #[must_use]
    pub fn thought(
        turn: TurnId,
        text: impl Into<String>,
        source_id: Option<String>,
        metadata: Option<StepMetadata>,
    ) -> Self {
        let mut step = Self::new(turn, StepOrigin::MessageEvent, StepKind::Thought, text.into());
        step.status = StepStatus::Active;
        step.source_id = source_id;
        step.metadata = metadata;
        step
    }

    /// A response that arrived over the generic message channel.
    #[must_use]
    pub fn message_response(
        turn: TurnId,
        text: impl Into<String>,
        source_id: Option<String>,
        metadata: Option<StepMetadata>,
    ) -> Self {
        let mut step = Self::new(turn, StepOrigin::MessageEvent, StepKind::Response, text.into());
        step.source_id = source_id;
        step.metadata = metadata;
        step
    }

    /// Tool output that arrived as a plain message rather than a tool call.
    ///
    /// These are not indented, so they stay out of the primary surface.
    #[must_use]
    pub fn message_tool(
        turn: TurnId,
        text: impl Into<String>,
        source_id: Option<String>,
        metadata: Option<StepMetadata>,
    ) -> Self {
        let mut step = Self::new(
            turn,
            StepOrigin::MessageEvent,
            StepKind::ToolInvocation,
            text.into(),
        );
        step.source_id = source_id;
        step.metadata = metadata;
        step
    }

    /// An indented, active tool invocation.
    #[must_use]
    pub fn tool_call(
        turn: TurnId,
        call_id: impl Into<String>,
        name: impl Into<String>,
        parameters: BTreeMap<String, String>,
    ) -> Self {
        let name: String = name.into();
        let call_id: String = call_id.into();
        let mut step = Self::new(turn, StepOrigin::ToolCall, StepKind::ToolInvocation, name.clone());
        step.status = StepStatus::Active;
        step.is_indented = true;
        step.source_id = Some(call_id).filter(|id| !id.is_empty());
        step.tool = Some(ToolDetails {
            name,
            parameters,
            result: None,
            error_message: None,
            call_id: step.source_id.clone(),
        });
        step
    }

    /// The authoritative terminal response.
    #[must_use]
    pub fn final_response(turn: TurnId, text: impl Into<String>) -> Self {
        let mut step = Self::new(turn, StepOrigin::FinalResponse, StepKind::Response, text.into());
        step.metadata = Some(StepMetadata::terminal_response());
        step
    }

    /// A synthesized terminal response for a turn that produced none.
    #[must_use]
    pub fn fallback(turn: TurnId, text: impl Into<String>) -> Self {
        let mut step = Self::new(turn, StepOrigin::Fallback, StepKind::Response, text.into());
        step.metadata = Some(StepMetadata {
            is_status: false,
            is_final: true,
            message_type: "fallback".to_string(),
        });
        step
    }

    /// A failed response describing a transport or server error.
    #[must_use]
    pub fn stream_error(turn: TurnId, text: impl Into<String>) -> Self {
        let mut step = Self::new(turn, StepOrigin::StreamError, StepKind::Response, text.into());
        step.status = StepStatus::Failed;
        step
    }

    /// String id carrying the origin prefix, for display layers.
    #[must_use]
    pub fn display_id(&self) -> String {
        format!("{}{}", self.origin.prefix(), self.id)
    }

    /// Tool name for tool invocation steps.
    #[must_use]
    pub fn tool_name(&self) -> Option<&str> {
        self.tool.as_ref().map(|t| t.name.as_str())
    }
}
