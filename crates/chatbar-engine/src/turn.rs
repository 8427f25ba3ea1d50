//! Per-turn transient state.
//!
//! Created when the user submits a prompt and dropped once the turn has been
//! finished. Nothing here outlives the turn.

use chatbar_core::{StepId, TurnId};

use crate::ack::AckState;
use crate::guard::{SeenSources, ToolCorrelation};

/// State for one user-submission-to-terminal-response cycle.
#[derive(Debug, Clone)]
pub struct TurnState {
    pub(crate) id: TurnId,
    pub(crate) user_step: StepId,
    pub(crate) ack: AckState,
    pub(crate) active_thought: Option<StepId>,
    pub(crate) correlation: ToolCorrelation,
    pub(crate) seen_messages: SeenSources,
    pub(crate) seen_tool_calls: SeenSources,
    pub(crate) terminal: Option<StepId>,
    pub(crate) events_seen: usize,
    pub(crate) discarded: usize,
}

impl TurnState {
    pub(crate) fn new(id: TurnId, user_step: StepId) -> Self {
        Self {
            id,
            user_step,
            ack: AckState::NoAck,
            active_thought: None,
            correlation: ToolCorrelation::default(),
            seen_messages: SeenSources::default(),
            seen_tool_calls: SeenSources::default(),
            terminal: None,
            events_seen: 0,
            discarded: 0,
        }
    }

    /// Turn id.
    #[must_use]
    pub const fn id(&self) -> TurnId {
        self.id
    }

    /// Id of the user's submitted step.
    #[must_use]
    pub const fn user_step(&self) -> StepId {
        self.user_step
    }

    /// Acknowledgment state.
    #[must_use]
    pub const fn ack(&self) -> AckState {
        self.ack
    }

    /// Whether an authoritative terminal response has been recorded.
    #[must_use]
    pub const fn has_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// The terminal response step, if one was recorded.
    #[must_use]
    pub const fn terminal(&self) -> Option<StepId> {
        self.terminal
    }

    /// The currently active thought step.
    #[must_use]
    pub const fn active_thought(&self) -> Option<StepId> {
        self.active_thought
    }

    /// Number of events applied so far.
    #[must_use]
    pub const fn events_seen(&self) -> usize {
        self.events_seen
    }
}
