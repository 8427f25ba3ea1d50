//! Visibility rules for the two display surfaces.
//!
//! The primary surface is the chat view the user reads. The detail surface
//! is an inspector that shows every step unfiltered.
//!
//! Primary visibility is decided in this order, first match wins:
//!
//! 1. User messages are always shown.
//! 2. Server metadata, when present: `is_status` hides, `is_final` shows.
//! 3. Indented tool invocations are shown; flat ones are hidden.
//! 4. Responses are shown only if they are a terminal response (final
//!    response or fallback). Responses from the generic message channel
//!    are hidden so the same content is not displayed twice.
//! 5. Everything else is hidden.

use chatbar_core::{Step, StepKind};

/// Whether a step belongs in the primary chat surface.
#[must_use]
pub fn is_visible_in_primary(step: &Step) -> bool {
    if step.kind == StepKind::UserMessage {
        return true;
    }

    if let Some(meta) = &step.metadata {
        if meta.is_status {
            return false;
        }
        if meta.is_final {
            return true;
        }
    }

    match step.kind {
        StepKind::ToolInvocation => step.is_indented,
        // Message-channel copies, acknowledgments and errors stay hidden.
        StepKind::Response => step.origin.is_terminal(),
        StepKind::Thought | StepKind::UserMessage => false,
    }
}

/// Whether a step belongs in the detail surface. Always true.
#[must_use]
pub const fn is_visible_in_detail(_step: &Step) -> bool {
    true
}

/// Steps shown in the primary surface, in arrival order.
pub fn primary_projection<'a, I>(steps: I) -> Vec<&'a Step>
where
    I: IntoIterator<Item = &'a Step>,
{
    steps.into_iter().filter(|s| is_visible_in_primary(s)).collect()
}

/// Steps shown in the detail surface, in arrival order.
pub fn detail_projection<'a, I>(steps: I) -> Vec<&'a Step>
where
    I: IntoIterator<Item = &'a Step>,
{
    steps.into_iter().filter(|s| is_visible_in_detail(s)).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chatbar_core::{StepMetadata, TurnId};

    use super::*;

    fn turn() -> TurnId {
        TurnId::generate()
    }

    #[test]
    fn user_messages_are_always_visible() {
        let mut step = Step::user(turn(), "hi");
        assert!(is_visible_in_primary(&step));

        // Even a status hint cannot hide the user's own message.
        step.metadata = Some(StepMetadata {
            is_status: true,
            ..StepMetadata::default()
        });
        assert!(is_visible_in_primary(&step));
    }

    #[test]
    fn indented_tools_visible_flat_tools_hidden() {
        let indented = Step::tool_call(turn(), "t1", "search", BTreeMap::new());
        assert!(is_visible_in_primary(&indented));

        let flat = Step::message_tool(turn(), "raw tool output", None, None);
        assert!(!is_visible_in_primary(&flat));
    }

    #[test]
    fn terminal_responses_visible() {
        assert!(is_visible_in_primary(&Step::final_response(turn(), "Done")));
        assert!(is_visible_in_primary(&Step::fallback(turn(), "Sorry")));
    }

    #[test]
    fn message_channel_responses_hidden() {
        let step = Step::message_response(turn(), "Done", Some("m1".into()), None);
        assert!(!is_visible_in_primary(&step));
    }

    #[test]
    fn acknowledgment_and_errors_hidden() {
        assert!(!is_visible_in_primary(&Step::acknowledgment(turn(), "...")));
        assert!(!is_visible_in_primary(&Step::stream_error(turn(), "boom")));
    }

    #[test]
    fn thoughts_hidden() {
        let step = Step::thought(turn(), "Thinking...", None, None);
        assert!(!is_visible_in_primary(&step));
    }

    #[test]
    fn metadata_final_overrides_provenance() {
        let meta = StepMetadata {
            is_final: true,
            ..StepMetadata::default()
        };
        let thought = Step::thought(turn(), "The answer is 42", None, Some(meta.clone()));
        assert!(is_visible_in_primary(&thought));

        let message = Step::message_response(turn(), "The answer", None, Some(meta));
        assert!(is_visible_in_primary(&message));
    }

    #[test]
    fn metadata_status_overrides_indentation() {
        let mut step = Step::tool_call(turn(), "t1", "search", BTreeMap::new());
        step.metadata = Some(StepMetadata {
            is_status: true,
            is_final: true,
            message_type: "progress".into(),
        });
        assert!(!is_visible_in_primary(&step));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let steps = [
            Step::user(turn(), "hi"),
            Step::thought(turn(), "hmm", None, None),
            Step::final_response(turn(), "ok"),
        ];
        for step in &steps {
            assert_eq!(is_visible_in_primary(step), is_visible_in_primary(step));
        }
    }

    #[test]
    fn projections_preserve_order() {
        let t = turn();
        let steps = vec![
            Step::user(t, "q"),
            Step::thought(t, "hmm", None, None),
            Step::tool_call(t, "t1", "search", BTreeMap::new()),
            Step::final_response(t, "a"),
        ];

        let primary: Vec<&str> = primary_projection(&steps).iter().map(|s| s.text.as_str()).collect();
        assert_eq!(primary, vec!["q", "search", "a"]);

        let detail = detail_projection(&steps);
        assert_eq!(detail.len(), 4);
    }
}
