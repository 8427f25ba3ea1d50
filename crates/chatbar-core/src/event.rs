//! Inbound session events.
//!
//! These are produced by the transport layer, already deserialized, and
//! delivered to the engine one at a time in arrival order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::step::StepMetadata;

/// Author of a `Message` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The user.
    User,
    /// The assistant.
    Assistant,
    /// Agent reasoning.
    Thought,
    /// Tool output delivered as a message.
    Tool,
    /// System or progress notices.
    System,
}

/// Server -> client: one event of a streamed session turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A generic message.
    Message {
        /// Server message id.
        #[serde(default)]
        id: String,
        /// Message author.
        role: Role,
        /// Message content.
        content: String,
        /// Optional visibility hint.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metadata: Option<StepMetadata>,
    },
    /// A tool call was issued.
    ToolCall {
        /// Unique tool invocation id.
        #[serde(default)]
        id: String,
        /// Name of the tool being executed.
        tool_name: String,
        /// Tool parameters.
        #[serde(default)]
        parameters: BTreeMap<String, String>,
    },
    /// A tool call finished.
    ToolResult {
        /// Name of the tool that ran.
        tool_name: String,
        /// Whether the call succeeded.
        success: bool,
        /// Tool output.
        #[serde(default)]
        output: String,
        /// Error message when the call failed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        /// Id of the originating tool call, when the server sends it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        call_id: Option<String>,
    },
    /// The authoritative answer for the turn.
    FinalResponse {
        /// Response text.
        text: String,
    },
    /// The server reported an error for the turn.
    Error {
        /// Error message.
        message: String,
        /// Optional error code.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
    /// The server closed the stream.
    Disconnected,
}

impl SessionEvent {
    /// Short event name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Message { .. } => "message",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::FinalResponse { .. } => "final_response",
            Self::Error { .. } => "error",
            Self::Disconnected => "disconnected",
        }
    }

    /// Decode an event from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Decode` if the document is not a valid event.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::Decode(e.to_string()))
    }

    /// Build a message event.
    #[must_use]
    pub fn message(role: Role, content: impl Into<String>) -> Self {
        Self::Message {
            id: String::new(),
            role,
            content: content.into(),
            metadata: None,
        }
    }

    /// Build a tool call event.
    #[must_use]
    pub fn tool_call(id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self::ToolCall {
            id: id.into(),
            tool_name: tool_name.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Build a successful tool result event.
    #[must_use]
    pub fn tool_success(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self::ToolResult {
            tool_name: tool_name.into(),
            success: true,
            output: output.into(),
            error: None,
            call_id: None,
        }
    }

    /// Build a final response event.
    #[must_use]
    pub fn final_response(text: impl Into<String>) -> Self {
        Self::FinalResponse { text: text.into() }
    }
}
