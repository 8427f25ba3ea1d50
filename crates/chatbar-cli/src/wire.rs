//! JSON-lines codec for recorded session scripts.
//!
//! Each non-empty line is one `SessionEvent` object, tagged by `type`. One
//! extra line type is understood by the replayer only:
//!
//! ```text
//! {"type":"stream_error","message":"connection reset"}
//! ```
//!
//! which makes the stream fail at that point, the way a dropped connection
//! would. Blank lines and lines starting with `#` are skipped.

use chatbar_core::{CoreError, SessionEvent};
use chatbar_engine::TransportError;
use serde::Deserialize;

/// Tag of the simulated transport failure line.
pub const STREAM_ERROR_TYPE: &str = "stream_error";

#[derive(Debug, Deserialize)]
struct StreamErrorLine {
    #[serde(default)]
    message: String,
}

/// Decode one script line.
///
/// Returns `None` for blank and comment lines, `Some(Err(_))` for a
/// simulated failure or a line that does not decode.
#[must_use]
pub fn decode_line(line: &str) -> Option<Result<SessionEvent, TransportError>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => return Some(Err(TransportError::Decode(e.to_string()))),
    };

    if value.get("type").and_then(serde_json::Value::as_str) == Some(STREAM_ERROR_TYPE) {
        let message = serde_json::from_value::<StreamErrorLine>(value)
            .map(|l| l.message)
            .unwrap_or_default();
        return Some(Err(TransportError::Closed(message)));
    }

    Some(SessionEvent::from_json(line).map_err(|e| {
        tracing::debug!(error = %e, line = %line, "Failed to decode script line");
        match e {
            CoreError::Decode(message) => TransportError::Decode(message),
            other => TransportError::Decode(other.to_string()),
        }
    }))
}

/// Decode a whole script, in line order.
#[must_use]
pub fn decode_script(script: &str) -> Vec<Result<SessionEvent, TransportError>> {
    script.lines().filter_map(decode_line).collect()
}

/// Encode an event as one script line.
///
/// # Errors
///
/// Returns `TransportError::Decode` if the event cannot be serialized.
pub fn encode_line(event: &SessionEvent) -> Result<String, TransportError> {
    serde_json::to_string(event).map_err(|e| TransportError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use chatbar_core::Role;

    use super::*;

    #[test]
    fn skips_blank_and_comment_lines() {
        assert!(decode_line("").is_none());
        assert!(decode_line("   ").is_none());
        assert!(decode_line("# tool phase").is_none());
    }

    #[test]
    fn decodes_message_line() {
        let line = r#"{"type":"message","id":"m1","role":"thought","content":"Thinking..."}"#;
        match decode_line(line) {
            Some(Ok(SessionEvent::Message { id, role, content, .. })) => {
                assert_eq!(id, "m1");
                assert_eq!(role, Role::Thought);
                assert_eq!(content, "Thinking...");
            }
            other => panic!("Expected Message, got {other:?}"),
        }
    }

    #[test]
    fn stream_error_line_fails_stream() {
        let line = r#"{"type":"stream_error","message":"connection reset"}"#;
        match decode_line(line) {
            Some(Err(TransportError::Closed(message))) => assert_eq!(message, "connection reset"),
            other => panic!("Expected Closed, got {other:?}"),
        }
    }

    #[test]
    fn malformed_line_is_decode_error() {
        assert!(matches!(
            decode_line("{not json"),
            Some(Err(TransportError::Decode(_)))
        ));
        assert!(matches!(
            decode_line(r#"{"type":"telepathy"}"#),
            Some(Err(TransportError::Decode(_)))
        ));
    }

    #[test]
    fn script_keeps_line_order() {
        let script = r#"
# a short turn
{"type":"tool_call","id":"t1","tool_name":"search"}
{"type":"tool_result","tool_name":"search","success":true,"output":"42"}

{"type":"final_response","text":"It is 42."}
"#;
        let events = decode_script(script);
        assert_eq!(events.len(), 3);
        let names: Vec<&str> = events
            .iter()
            .map(|e| e.as_ref().map_or("error", SessionEvent::name))
            .collect();
        assert_eq!(names, vec!["tool_call", "tool_result", "final_response"]);
    }

    #[test]
    fn encoded_event_decodes_to_same_event() {
        let event = SessionEvent::final_response("Done");
        let line = encode_line(&event).unwrap();
        assert_eq!(decode_line(&line), Some(Ok(event)));
    }
}
