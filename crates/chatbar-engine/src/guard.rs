//! Deduplication and ordering guard.
//!
//! The step list only ever grows at the end, in event arrival order. Tool
//! results are routed back to the step their call created, and repeated
//! server ids are recognised so the same event is never shown twice.

use std::collections::{HashMap, HashSet};

use chatbar_core::{Step, StepId};

// =============================================================================
// Step List
// =============================================================================

/// Ordered, append-mostly list of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepList {
    steps: Vec<Step>,
}

impl StepList {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step at the end and return its id.
    pub fn append(&mut self, step: Step) -> StepId {
        let id = step.id;
        self.steps.push(step);
        id
    }

    /// Look up a step by id.
    #[must_use]
    pub fn get(&self, id: StepId) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Look up a step by id for in-place mutation.
    pub fn get_mut(&mut self, id: StepId) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    /// Index of a step in arrival order.
    #[must_use]
    pub fn position(&self, id: StepId) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// Remove a step. Returns the removed step if it existed.
    ///
    /// Only the acknowledgment placeholder is ever removed; order of the
    /// remaining steps is preserved.
    pub fn remove(&mut self, id: StepId) -> Option<Step> {
        let idx = self.position(id)?;
        Some(self.steps.remove(idx))
    }

    /// Remove every step.
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Steps in arrival order.
    #[must_use]
    pub fn as_slice(&self) -> &[Step] {
        &self.steps
    }

    /// Iterate steps in arrival order.
    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<'a> IntoIterator for &'a StepList {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

// =============================================================================
// Tool Correlation
// =============================================================================

/// Maps tool calls to the steps they created, for the lifetime of one turn.
///
/// Lookup by name only resolves the most recently registered call of that
/// name. Results that carry the call id resolve exactly.
#[derive(Debug, Clone, Default)]
pub struct ToolCorrelation {
    by_call_id: HashMap<String, StepId>,
    by_name: HashMap<String, StepId>,
}

impl ToolCorrelation {
    /// Record a tool call.
    pub fn register(&mut self, call_id: Option<&str>, name: &str, step: StepId) {
        if let Some(call_id) = call_id.filter(|id| !id.is_empty()) {
            self.by_call_id.insert(call_id.to_string(), step);
        }
        self.by_name.insert(name.to_string(), step);
    }

    /// Find the step for a tool result.
    ///
    /// With `by_call_id` set and a call id present, the id decides. Otherwise
    /// the name decides.
    #[must_use]
    pub fn resolve(&self, call_id: Option<&str>, name: &str, by_call_id: bool) -> Option<StepId> {
        if by_call_id {
            if let Some(step) = call_id.and_then(|id| self.by_call_id.get(id)) {
                return Some(*step);
            }
        }
        self.by_name.get(name).copied()
    }
}

// =============================================================================
// Seen Sources
// =============================================================================

/// Server event ids already turned into steps during this turn.
#[derive(Debug, Clone, Default)]
pub struct SeenSources {
    ids: HashSet<String>,
}

impl SeenSources {
    /// Record an id. Returns `false` if it was already seen.
    ///
    /// Empty ids are never considered duplicates.
    pub fn insert(&mut self, id: &str) -> bool {
        if id.is_empty() {
            return true;
        }
        self.ids.insert(id.to_string())
    }

    /// Whether an id was already seen.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        !id.is_empty() && self.ids.contains(id)
    }
}
