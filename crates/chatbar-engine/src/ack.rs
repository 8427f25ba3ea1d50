//! Acknowledgment placeholder and fallback synthesis.
//!
//! # State Machine
//!
//! - `NoAck` → `Shown` when the turn starts
//! - `Shown` → `Removed` on the first substantive event
//! - `Shown` → `UpdatedTerminal` when the turn ends with the placeholder
//!   still present and no terminal response
//!
//! Independently of the placeholder, a turn that ends with no visible
//! response gets one synthesized, so the user never looks at a conversation
//! that just stops.

use chatbar_core::{Role, SessionEvent, Step, StepId, StepKind, StepOrigin, StepStatus, TurnId};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::guard::StepList;
use crate::turn::TurnState;
use crate::visibility::is_visible_in_primary;

/// Texts shorter than this that end in an ellipsis read as progress lines.
const SHORT_STATUS_LEN: usize = 60;

/// Lifecycle of the acknowledgment placeholder within one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum AckState {
    /// No placeholder has been shown.
    NoAck,
    /// The placeholder is in the step list.
    Shown(StepId),
    /// The placeholder was superseded and removed.
    Removed,
    /// The turn ended untouched and the placeholder was rewritten in place.
    UpdatedTerminal(StepId),
}

/// Append the placeholder and move to `Shown`.
///
/// Does nothing unless the turn is in `NoAck`.
pub fn show_acknowledgment(
    turn: &mut TurnState,
    steps: &mut StepList,
    config: &EngineConfig,
) -> Option<StepId> {
    if turn.ack != AckState::NoAck {
        return None;
    }
    let id = steps.append(Step::acknowledgment(turn.id, &config.acknowledgment_text));
    turn.ack = AckState::Shown(id);
    Some(id)
}

/// Whether an event is the server echoing the placeholder back.
#[must_use]
pub fn is_acknowledgment_echo(turn: &TurnState, steps: &StepList, event: &SessionEvent) -> bool {
    let AckState::Shown(ack_id) = turn.ack else {
        return false;
    };
    let SessionEvent::Message { id, role, content, .. } = event else {
        return false;
    };
    if *role == Role::User {
        return false;
    }
    if !id.is_empty() {
        let ack_str = ack_id.to_string();
        if *id == ack_str || *id == format!("{}{ack_str}", StepOrigin::Acknowledgment.prefix()) {
            return true;
        }
    }
    steps
        .get(ack_id)
        .is_some_and(|ack| ack.text.trim() == content.trim())
}

/// Remove the placeholder if `event` supersedes it.
///
/// User-role messages, a server disconnect and the placeholder's own echo
/// do not count. Returns
/// `true` if the placeholder was removed.
pub fn remove_on_first_event(
    turn: &mut TurnState,
    steps: &mut StepList,
    event: &SessionEvent,
) -> bool {
    let AckState::Shown(ack_id) = turn.ack else {
        return false;
    };
    if matches!(
        event,
        SessionEvent::Message { role: Role::User, .. } | SessionEvent::Disconnected
    ) {
        return false;
    }
    if is_acknowledgment_echo(turn, steps, event) {
        return false;
    }
    steps.remove(ack_id);
    turn.ack = AckState::Removed;
    tracing::debug!(turn = %turn.id, event = event.name(), "Acknowledgment removed");
    true
}

/// Run end-of-turn processing.
///
/// Completes the active thought, rewrites an untouched placeholder, and
/// synthesizes a fallback response when the turn has no visible response.
/// Returns the fallback step id if one was appended.
pub fn complete_turn(
    turn: &mut TurnState,
    steps: &mut StepList,
    config: &EngineConfig,
) -> Option<StepId> {
    if let Some(thought) = turn.active_thought.take() {
        if let Some(step) = steps.get_mut(thought) {
            step.status = StepStatus::Completed;
        }
    }

    if let AckState::Shown(ack_id) = turn.ack {
        if turn.terminal.is_none() {
            if let Some(step) = steps.get_mut(ack_id) {
                step.status = StepStatus::Completed;
                step.text.clone_from(&config.completion_text);
                if let Some(meta) = step.metadata.as_mut() {
                    meta.is_final = false;
                }
            }
            turn.ack = AckState::UpdatedTerminal(ack_id);
        }
    }

    if has_visible_response(turn.id, steps) {
        return None;
    }

    let text = fallback_text(turn.id, steps, config);
    let id = steps.append(Step::fallback(turn.id, text));
    tracing::warn!(turn = %turn.id, "Turn ended without a visible response, synthesized fallback");
    Some(id)
}

/// Whether a response of this turn is visible in the primary surface.
///
/// The user's own message does not count.
#[must_use]
pub fn has_visible_response(turn: TurnId, steps: &StepList) -> bool {
    steps
        .iter()
        .filter(|s| s.turn == turn && s.kind == StepKind::Response)
        .any(is_visible_in_primary)
}

/// Text for a fallback response: the most recent substantive content of the
/// turn, or the configured apology.
#[must_use]
pub fn fallback_text(turn: TurnId, steps: &StepList, config: &EngineConfig) -> String {
    steps
        .iter()
        .rev()
        .filter(|s| s.turn == turn)
        .filter(|s| !matches!(s.kind, StepKind::UserMessage | StepKind::ToolInvocation))
        .filter(|s| s.origin != StepOrigin::Acknowledgment)
        .filter(|s| !s.metadata.as_ref().is_some_and(|m| m.is_status))
        .map(|s| s.text.trim())
        .find(|text| !text.is_empty() && !looks_like_status(text, config))
        .map_or_else(|| config.apology_text.clone(), str::to_string)
}

/// Best-effort check for transient progress lines such as "Searching the
/// web...".
#[must_use]
pub fn looks_like_status(text: &str, config: &EngineConfig) -> bool {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();
    if config
        .status_prefixes
        .iter()
        .any(|prefix| lower.starts_with(&prefix.to_lowercase()))
    {
        return true;
    }
    let ellipsis = trimmed.ends_with("...") || trimmed.ends_with('…');
    ellipsis && trimmed.chars().count() < SHORT_STATUS_LEN
}
