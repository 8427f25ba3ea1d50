//! Engine configuration.
//!
//! Placeholder texts and the status-line heuristic used by fallback
//! synthesis. Every field has a default so a partial JSON document is a
//! valid configuration.

use serde::Deserialize;

use crate::error::{EngineError, Result};

/// Configuration for the reconciliation engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Text of the placeholder shown while waiting for the first event.
    #[serde(default = "EngineConfig::default_acknowledgment_text")]
    pub acknowledgment_text: String,

    /// Text the placeholder is rewritten to when the turn ends untouched.
    #[serde(default = "EngineConfig::default_completion_text")]
    pub completion_text: String,

    /// Text of the fallback response when no usable content exists.
    #[serde(default = "EngineConfig::default_apology_text")]
    pub apology_text: String,

    /// Leading words that mark a line as transient progress output.
    #[serde(default = "EngineConfig::default_status_prefixes")]
    pub status_prefixes: Vec<String>,

    /// Correlate tool results by call id when the result carries one.
    #[serde(default = "EngineConfig::default_correlate_by_call_id")]
    pub correlate_by_call_id: bool,
}

impl EngineConfig {
    /// Parse a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` if the document is not valid JSON or a
    /// field has the wrong type.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))
    }

    fn default_acknowledgment_text() -> String {
        "Let me help you with that...".to_string()
    }

    fn default_completion_text() -> String {
        "Finished working on your request.".to_string()
    }

    fn default_apology_text() -> String {
        "Sorry, I wasn't able to complete that request. Please try again.".to_string()
    }

    fn default_status_prefixes() -> Vec<String> {
        [
            "thinking",
            "working",
            "processing",
            "analyzing",
            "searching",
            "running",
            "executing",
            "calling",
            "loading",
            "starting",
            "let me",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    const fn default_correlate_by_call_id() -> bool {
        true
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            acknowledgment_text: Self::default_acknowledgment_text(),
            completion_text: Self::default_completion_text(),
            apology_text: Self::default_apology_text(),
            status_prefixes: Self::default_status_prefixes(),
            correlate_by_call_id: Self::default_correlate_by_call_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.acknowledgment_text, "Let me help you with that...");
        assert!(config.correlate_by_call_id);
        assert!(config.status_prefixes.iter().any(|p| p == "thinking"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            EngineConfig::from_json(r#"{"apology_text":"Nope.","correlate_by_call_id":false}"#)
                .unwrap();
        assert_eq!(config.apology_text, "Nope.");
        assert!(!config.correlate_by_call_id);
        assert_eq!(config.completion_text, EngineConfig::default().completion_text);
        assert_eq!(config.status_prefixes, EngineConfig::default().status_prefixes);
    }

    #[test]
    fn wrong_field_type_is_config_error() {
        let result = EngineConfig::from_json(r#"{"status_prefixes":"thinking"}"#);
        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}
