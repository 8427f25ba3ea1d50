//! Event classification.
//!
//! Converts one inbound session event into at most one step mutation. Every
//! path is total: an event is appended, applied to an existing step, or
//! discarded with a reason. Nothing here returns an error.

use std::collections::BTreeMap;

use chatbar_core::{Role, SessionEvent, Step, StepId, StepMetadata, StepStatus};
use serde::Serialize;

use crate::ack;
use crate::config::EngineConfig;
use crate::guard::StepList;
use crate::turn::TurnState;

/// Result of classifying one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// A new step was appended.
    Appended {
        /// The new step.
        step: StepId,
    },
    /// An existing step was mutated in place.
    Updated {
        /// The mutated step.
        step: StepId,
    },
    /// The event produced no step.
    Discarded {
        /// Why the event was dropped.
        reason: DiscardReason,
    },
    /// The server closed the stream.
    Ended,
}

/// Why an event was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// User messages are appended locally at submission.
    UserEcho,
    /// Assistant content is only surfaced through `FinalResponse`.
    AssistantMessage,
    /// The server echoed the acknowledgment placeholder.
    AcknowledgmentEcho,
    /// The server event id was already turned into a step.
    DuplicateSource,
    /// A terminal response was already recorded for this turn.
    DuplicateTerminal,
    /// No tool call matched the result.
    OrphanToolResult,
}

/// Classify one event against the turn and step list.
pub fn classify(
    turn: &mut TurnState,
    steps: &mut StepList,
    event: SessionEvent,
    config: &EngineConfig,
) -> Outcome {
    turn.events_seen += 1;

    if ack::is_acknowledgment_echo(turn, steps, &event) {
        return discard(turn, DiscardReason::AcknowledgmentEcho);
    }
    ack::remove_on_first_event(turn, steps, &event);

    match event {
        SessionEvent::Message {
            id,
            role,
            content,
            metadata,
        } => classify_message(turn, steps, id, role, content, metadata),
        SessionEvent::ToolCall {
            id,
            tool_name,
            parameters,
        } => classify_tool_call(turn, steps, id, tool_name, parameters),
        SessionEvent::ToolResult {
            tool_name,
            success,
            output,
            error,
            call_id,
        } => {
            let result = ToolOutcome {
                success,
                output,
                error,
            };
            classify_tool_result(turn, steps, call_id.as_deref(), &tool_name, result, config)
        }
        SessionEvent::FinalResponse { text } => classify_final_response(turn, steps, text),
        SessionEvent::Error { message, code } => {
            tracing::warn!(turn = %turn.id, error = %message, code = ?code, "Server reported an error");
            let step = steps.append(Step::stream_error(turn.id, message));
            Outcome::Appended { step }
        }
        SessionEvent::Disconnected => {
            tracing::debug!(turn = %turn.id, "Server closed the stream");
            Outcome::Ended
        }
    }
}

fn discard(turn: &mut TurnState, reason: DiscardReason) -> Outcome {
    turn.discarded += 1;
    tracing::debug!(turn = %turn.id, reason = ?reason, "Event discarded");
    Outcome::Discarded { reason }
}

fn classify_message(
    turn: &mut TurnState,
    steps: &mut StepList,
    id: String,
    role: Role,
    content: String,
    metadata: Option<StepMetadata>,
) -> Outcome {
    match role {
        Role::User => return discard(turn, DiscardReason::UserEcho),
        Role::Assistant => return discard(turn, DiscardReason::AssistantMessage),
        Role::Thought | Role::System | Role::Tool => {}
    }

    if !turn.seen_messages.insert(&id) {
        return discard(turn, DiscardReason::DuplicateSource);
    }
    let source_id = Some(id).filter(|id| !id.is_empty());

    if role == Role::Tool {
        let step = steps.append(Step::message_tool(turn.id, content, source_id, metadata));
        return Outcome::Appended { step };
    }

    // A thought flagged final by the server is the answer, not reasoning.
    if metadata.as_ref().is_some_and(|m| m.is_final) {
        let step = steps.append(Step::message_response(turn.id, content, source_id, metadata));
        return Outcome::Appended { step };
    }

    complete_active_thought(turn, steps);
    let step = steps.append(Step::thought(turn.id, content, source_id, metadata));
    turn.active_thought = Some(step);
    Outcome::Appended { step }
}

fn classify_tool_call(
    turn: &mut TurnState,
    steps: &mut StepList,
    id: String,
    tool_name: String,
    parameters: BTreeMap<String, String>,
) -> Outcome {
    if !turn.seen_tool_calls.insert(&id) {
        return discard(turn, DiscardReason::DuplicateSource);
    }

    tracing::debug!(turn = %turn.id, tool = %tool_name, tool_id = %id, "Tool call started");
    let step = steps.append(Step::tool_call(turn.id, id.clone(), tool_name.clone(), parameters));
    turn.correlation.register(Some(id.as_str()), &tool_name, step);
    Outcome::Appended { step }
}

struct ToolOutcome {
    success: bool,
    output: String,
    error: Option<String>,
}

fn classify_tool_result(
    turn: &mut TurnState,
    steps: &mut StepList,
    call_id: Option<&str>,
    tool_name: &str,
    result: ToolOutcome,
    config: &EngineConfig,
) -> Outcome {
    let target = turn
        .correlation
        .resolve(call_id, tool_name, config.correlate_by_call_id);

    let Some(step) = target.and_then(|id| steps.get_mut(id)) else {
        tracing::warn!(
            turn = %turn.id,
            tool = %tool_name,
            call_id = ?call_id,
            "Tool result has no matching tool call, dropping"
        );
        return discard(turn, DiscardReason::OrphanToolResult);
    };

    step.status = if result.success {
        StepStatus::Completed
    } else {
        StepStatus::Failed
    };
    if let Some(tool) = step.tool.as_mut() {
        tool.result = Some(result.output);
        tool.error_message = result.error;
    }
    tracing::debug!(turn = %turn.id, tool = %tool_name, success = result.success, "Tool call completed");
    Outcome::Updated { step: step.id }
}

fn classify_final_response(turn: &mut TurnState, steps: &mut StepList, text: String) -> Outcome {
    if turn.terminal.is_some() {
        tracing::warn!(turn = %turn.id, "Duplicate final response, discarding");
        return discard(turn, DiscardReason::DuplicateTerminal);
    }

    complete_active_thought(turn, steps);
    let step = steps.append(Step::final_response(turn.id, text));
    turn.terminal = Some(step);
    Outcome::Appended { step }
}

fn complete_active_thought(turn: &mut TurnState, steps: &mut StepList) {
    if let Some(thought) = turn.active_thought.take() {
        if let Some(step) = steps.get_mut(thought) {
            step.status = StepStatus::Completed;
        }
    }
}

#[cfg(test)]
mod tests {
    use chatbar_core::{StepKind, StepOrigin, TurnId};

    use super::*;
    use crate::ack::AckState;

    struct Fixture {
        config: EngineConfig,
        steps: StepList,
        turn: TurnState,
    }

    impl Fixture {
        fn new() -> Self {
            let config = EngineConfig::default();
            let mut steps = StepList::new();
            let turn_id = TurnId::generate();
            let user = steps.append(Step::user(turn_id, "What is 6 x 7?"));
            let mut turn = TurnState::new(turn_id, user);
            ack::show_acknowledgment(&mut turn, &mut steps, &config);
            Self { config, steps, turn }
        }

        fn apply(&mut self, event: SessionEvent) -> Outcome {
            classify(&mut self.turn, &mut self.steps, event, &self.config)
        }

        fn step(&self, outcome: &Outcome) -> &Step {
            let id = match outcome {
                Outcome::Appended { step } | Outcome::Updated { step } => *step,
                other => panic!("Expected a step, got {other:?}"),
            };
            self.steps.get(id).unwrap()
        }
    }

    #[test]
    fn user_message_is_discarded() {
        let mut fx = Fixture::new();
        let outcome = fx.apply(SessionEvent::message(Role::User, "What is 6 x 7?"));
        assert_eq!(outcome, Outcome::Discarded { reason: DiscardReason::UserEcho });
        assert!(matches!(fx.turn.ack, AckState::Shown(_)));
    }

    #[test]
    fn assistant_message_is_discarded_but_removes_ack() {
        let mut fx = Fixture::new();
        let outcome = fx.apply(SessionEvent::message(Role::Assistant, "42"));
        assert_eq!(
            outcome,
            Outcome::Discarded { reason: DiscardReason::AssistantMessage }
        );
        assert_eq!(fx.turn.ack, AckState::Removed);
        assert_eq!(fx.steps.len(), 1);
    }

    #[test]
    fn acknowledgment_echo_is_discarded() {
        let mut fx = Fixture::new();
        let text = fx.config.acknowledgment_text.clone();
        let outcome = fx.apply(SessionEvent::message(Role::System, text));
        assert_eq!(
            outcome,
            Outcome::Discarded { reason: DiscardReason::AcknowledgmentEcho }
        );
        assert!(matches!(fx.turn.ack, AckState::Shown(_)));
    }

    #[test]
    fn thought_message_creates_active_thought() {
        let mut fx = Fixture::new();
        let meta = StepMetadata {
            is_status: true,
            is_final: false,
            message_type: "status".into(),
        };
        let outcome = fx.apply(SessionEvent::Message {
            id: "m1".into(),
            role: Role::Thought,
            content: "Thinking...".into(),
            metadata: Some(meta.clone()),
        });

        let step = fx.step(&outcome);
        assert_eq!(step.kind, StepKind::Thought);
        assert_eq!(step.status, StepStatus::Active);
        assert_eq!(step.metadata, Some(meta));
        assert_eq!(step.source_id.as_deref(), Some("m1"));
        assert_eq!(fx.turn.active_thought, Some(step.id));
    }

    #[test]
    fn new_thought_completes_previous() {
        let mut fx = Fixture::new();
        let first = fx.apply(SessionEvent::message(Role::Thought, "step one"));
        let first_id = fx.step(&first).id;
        fx.apply(SessionEvent::message(Role::System, "step two"));

        assert_eq!(fx.steps.get(first_id).unwrap().status, StepStatus::Completed);
    }

    #[test]
    fn repeated_message_id_is_discarded() {
        let mut fx = Fixture::new();
        let event = SessionEvent::Message {
            id: "m1".into(),
            role: Role::Thought,
            content: "hmm".into(),
            metadata: None,
        };
        fx.apply(event.clone());
        let outcome = fx.apply(event);
        assert_eq!(
            outcome,
            Outcome::Discarded { reason: DiscardReason::DuplicateSource }
        );
    }

    #[test]
    fn tool_call_may_reuse_message_id() {
        let mut fx = Fixture::new();
        fx.apply(SessionEvent::Message {
            id: "1".into(),
            role: Role::Thought,
            content: "Looking it up".into(),
            metadata: None,
        });
        let call = fx.apply(SessionEvent::tool_call("1", "search"));
        let call_id = match call {
            Outcome::Appended { step } => step,
            other => panic!("Expected Appended, got {other:?}"),
        };
        assert_eq!(fx.steps.get(call_id).unwrap().kind, StepKind::ToolInvocation);

        let result = fx.apply(SessionEvent::tool_success("search", "found"));
        assert_eq!(result, Outcome::Updated { step: call_id });
    }

    #[test]
    fn tool_role_message_is_flat_tool_step() {
        let mut fx = Fixture::new();
        let outcome = fx.apply(SessionEvent::message(Role::Tool, "raw output"));
        let step = fx.step(&outcome);
        assert_eq!(step.kind, StepKind::ToolInvocation);
        assert!(!step.is_indented);
    }

    #[test]
    fn final_flagged_thought_becomes_response() {
        let mut fx = Fixture::new();
        let outcome = fx.apply(SessionEvent::Message {
            id: String::new(),
            role: Role::Thought,
            content: "It is 42.".into(),
            metadata: Some(StepMetadata {
                is_final: true,
                ..StepMetadata::default()
            }),
        });
        let step = fx.step(&outcome);
        assert_eq!(step.kind, StepKind::Response);
        assert_eq!(step.origin, StepOrigin::MessageEvent);
    }

    #[test]
    fn tool_call_and_result_correlate() {
        let mut fx = Fixture::new();
        let call = fx.apply(SessionEvent::tool_call("t1", "search"));
        let call_id = fx.step(&call).id;
        {
            let step = fx.step(&call);
            assert!(step.is_indented);
            assert_eq!(step.status, StepStatus::Active);
        }

        let result = fx.apply(SessionEvent::tool_success("search", "42"));
        assert_eq!(result, Outcome::Updated { step: call_id });

        let step = fx.steps.get(call_id).unwrap();
        assert_eq!(step.status, StepStatus::Completed);
        assert_eq!(step.tool.as_ref().unwrap().result.as_deref(), Some("42"));
    }

    #[test]
    fn failed_tool_result_records_error() {
        let mut fx = Fixture::new();
        let call = fx.apply(SessionEvent::tool_call("t1", "fetch"));
        let call_id = fx.step(&call).id;
        fx.apply(SessionEvent::ToolResult {
            tool_name: "fetch".into(),
            success: false,
            output: String::new(),
            error: Some("timeout".into()),
            call_id: None,
        });

        let step = fx.steps.get(call_id).unwrap();
        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(step.tool.as_ref().unwrap().error_message.as_deref(), Some("timeout"));
    }

    #[test]
    fn concurrent_same_name_calls_resolve_by_call_id() {
        let mut fx = Fixture::new();
        let first = fx.apply(SessionEvent::tool_call("t1", "search"));
        let first_id = fx.step(&first).id;
        fx.apply(SessionEvent::tool_call("t2", "search"));

        fx.apply(SessionEvent::ToolResult {
            tool_name: "search".into(),
            success: true,
            output: "first".into(),
            error: None,
            call_id: Some("t1".into()),
        });

        let step = fx.steps.get(first_id).unwrap();
        assert_eq!(step.tool.as_ref().unwrap().result.as_deref(), Some("first"));
    }

    #[test]
    fn orphan_tool_result_is_dropped() {
        let mut fx = Fixture::new();
        let before = fx.steps.len();
        let outcome = fx.apply(SessionEvent::tool_success("missing", "x"));
        assert_eq!(
            outcome,
            Outcome::Discarded { reason: DiscardReason::OrphanToolResult }
        );
        // The acknowledgment was removed, but no orphan step was created.
        assert_eq!(fx.steps.len(), before - 1);
    }

    #[test]
    fn duplicate_tool_call_id_is_discarded() {
        let mut fx = Fixture::new();
        fx.apply(SessionEvent::tool_call("t1", "search"));
        let outcome = fx.apply(SessionEvent::tool_call("t1", "search"));
        assert_eq!(
            outcome,
            Outcome::Discarded { reason: DiscardReason::DuplicateSource }
        );
    }

    #[test]
    fn final_response_completes_thought_and_marks_terminal() {
        let mut fx = Fixture::new();
        let thought = fx.apply(SessionEvent::message(Role::Thought, "Working"));
        let thought_id = fx.step(&thought).id;

        let outcome = fx.apply(SessionEvent::final_response("Done"));
        let step = fx.step(&outcome);
        assert_eq!(step.origin, StepOrigin::FinalResponse);
        assert_eq!(step.metadata, Some(StepMetadata::terminal_response()));
        assert!(fx.turn.has_terminal());
        assert_eq!(fx.steps.get(thought_id).unwrap().status, StepStatus::Completed);
    }

    #[test]
    fn second_final_response_is_discarded() {
        let mut fx = Fixture::new();
        fx.apply(SessionEvent::final_response("A"));
        let outcome = fx.apply(SessionEvent::final_response("B"));
        assert_eq!(
            outcome,
            Outcome::Discarded { reason: DiscardReason::DuplicateTerminal }
        );
        let finals: Vec<&Step> = fx
            .steps
            .iter()
            .filter(|s| s.origin == StepOrigin::FinalResponse)
            .collect();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].text, "A");
    }

    #[test]
    fn server_error_appends_failed_step() {
        let mut fx = Fixture::new();
        let outcome = fx.apply(SessionEvent::Error {
            message: "rate limited".into(),
            code: Some("429".into()),
        });
        let step = fx.step(&outcome);
        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(step.origin, StepOrigin::StreamError);
        assert_eq!(step.text, "rate limited");
    }

    #[test]
    fn disconnect_ends_stream() {
        let mut fx = Fixture::new();
        assert_eq!(fx.apply(SessionEvent::Disconnected), Outcome::Ended);
    }
}
