//! The conversation engine and turn driver.
//!
//! The engine owns the step list. Renderers get a read-only [`StepsReader`]
//! and a watch channel for the highlighted step. All mutation goes through
//! the engine, one event at a time, so there is exactly one writer.

use std::future::Future;
use std::sync::Arc;

use chatbar_core::{SessionEvent, Step, StepId, TurnId};
use futures::StreamExt;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;

use crate::ack::{self, AckState};
use crate::classifier::{self, Outcome};
use crate::config::EngineConfig;
use crate::guard::StepList;
use crate::transport::{EventStream, SessionTransport, TransportError};
use crate::turn::TurnState;
use crate::visibility::{is_visible_in_primary, primary_projection};

/// Shared handle to the step list.
pub type SharedSteps = Arc<RwLock<StepList>>;

/// How a turn's event stream ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "completion", content = "detail", rename_all = "snake_case")]
pub enum Completion {
    /// The stream ended normally.
    Finished,
    /// The server sent a disconnect.
    Disconnected,
    /// The stream failed.
    Failed(String),
    /// The turn was cancelled before the stream ended.
    Cancelled,
}

/// What happened during one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnSummary {
    /// Turn id.
    pub turn: TurnId,
    /// How the stream ended.
    pub completion: Completion,
    /// The authoritative terminal response, if one arrived.
    pub terminal: Option<StepId>,
    /// The synthesized fallback response, if one was needed.
    pub fallback: Option<StepId>,
    /// Final acknowledgment state.
    pub ack: AckState,
    /// Number of events applied.
    pub events_seen: usize,
    /// Number of events that produced no step.
    pub discarded: usize,
}

// =============================================================================
// Read-only View
// =============================================================================

/// Read-only view of the step list for rendering layers.
#[derive(Debug, Clone)]
pub struct StepsReader {
    steps: SharedSteps,
}

impl StepsReader {
    /// Copy of every step, in arrival order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Step> {
        self.steps.read().as_slice().to_vec()
    }

    /// Copy of the primary surface.
    #[must_use]
    pub fn primary(&self) -> Vec<Step> {
        let steps = self.steps.read();
        primary_projection(steps.iter()).into_iter().cloned().collect()
    }

    /// Copy of the detail surface.
    #[must_use]
    pub fn detail(&self) -> Vec<Step> {
        self.snapshot()
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.read().len()
    }

    /// Whether there are no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.read().is_empty()
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Reconciles streamed session events into an ordered step list.
pub struct ConversationEngine {
    steps: SharedSteps,
    config: Arc<EngineConfig>,
    highlight: watch::Sender<Option<StepId>>,
}

impl ConversationEngine {
    /// Create an engine with the given configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let (highlight, _) = watch::channel(None);
        Self {
            steps: Arc::new(RwLock::new(StepList::new())),
            config: Arc::new(config),
            highlight,
        }
    }

    /// Create an engine with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A read-only view of the step list.
    #[must_use]
    pub fn reader(&self) -> StepsReader {
        StepsReader {
            steps: Arc::clone(&self.steps),
        }
    }

    /// Copy of every step, in arrival order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Step> {
        self.reader().snapshot()
    }

    /// Copy of the primary surface.
    #[must_use]
    pub fn primary(&self) -> Vec<Step> {
        self.reader().primary()
    }

    /// Copy of the detail surface.
    #[must_use]
    pub fn detail(&self) -> Vec<Step> {
        self.reader().detail()
    }

    /// The currently highlighted step.
    #[must_use]
    pub fn highlighted(&self) -> Option<StepId> {
        *self.highlight.borrow()
    }

    /// Subscribe to highlighted-step changes.
    #[must_use]
    pub fn subscribe_highlight(&self) -> watch::Receiver<Option<StepId>> {
        self.highlight.subscribe()
    }

    /// Drop the whole conversation.
    pub fn clear(&self) {
        self.steps.write().clear();
        self.highlight.send_replace(None);
    }

    // =========================================================================
    // Turn Steps
    // =========================================================================

    /// Start a turn: append the user's step and the acknowledgment.
    ///
    /// Runs synchronously so the user's message is in the list before any
    /// event of the turn can arrive.
    pub fn begin_turn(&self, text: &str) -> TurnState {
        let turn_id = TurnId::generate();
        let mut steps = self.steps.write();
        let user = steps.append(Step::user(turn_id, text));
        let mut turn = TurnState::new(turn_id, user);
        ack::show_acknowledgment(&mut turn, &mut steps, &self.config);
        drop(steps);

        self.highlight.send_replace(Some(user));
        tracing::info!(turn = %turn_id, "Turn started");
        turn
    }

    /// Apply one event to the turn.
    pub fn apply(&self, turn: &mut TurnState, event: SessionEvent) -> Outcome {
        let mut steps = self.steps.write();
        let outcome = classifier::classify(turn, &mut steps, event, &self.config);
        if let Outcome::Appended { step } = &outcome {
            if steps.get(*step).is_some_and(is_visible_in_primary) {
                self.highlight.send_replace(Some(*step));
            }
        }
        outcome
    }

    /// Record a stream failure as a failed response step.
    pub fn record_stream_error(&self, turn: &TurnState, error: &TransportError) -> StepId {
        tracing::warn!(turn = %turn.id, error = %error, "Session stream failed");
        self.steps
            .write()
            .append(Step::stream_error(turn.id, error.to_string()))
    }

    /// Finish a turn: rewrite an untouched acknowledgment and synthesize a
    /// fallback response if nothing visible was produced.
    ///
    /// Finishing an already finished turn adds nothing.
    pub fn finish_turn(&self, turn: &mut TurnState, completion: Completion) -> TurnSummary {
        let fallback = {
            let mut steps = self.steps.write();
            ack::complete_turn(turn, &mut steps, &self.config)
        };
        if let Some(id) = fallback {
            self.highlight.send_replace(Some(id));
        }

        tracing::info!(
            turn = %turn.id,
            completion = ?completion,
            events = turn.events_seen,
            discarded = turn.discarded,
            fallback = fallback.is_some(),
            "Turn finished"
        );

        TurnSummary {
            turn: turn.id,
            completion,
            terminal: turn.terminal,
            fallback,
            ack: turn.ack,
            events_seen: turn.events_seen,
            discarded: turn.discarded,
        }
    }

    // =========================================================================
    // Drivers
    // =========================================================================

    /// Run a whole turn over an event stream.
    pub async fn run_turn(&self, text: &str, events: EventStream) -> TurnSummary {
        self.run_turn_until(text, events, std::future::pending()).await
    }

    /// Run a whole turn, stopping early when `cancel` resolves.
    ///
    /// End-of-turn processing runs however the turn ends, including when
    /// this future is dropped mid-stream.
    pub async fn run_turn_until<C>(&self, text: &str, events: EventStream, cancel: C) -> TurnSummary
    where
        C: Future<Output = ()>,
    {
        let mut guard = TurnGuard::new(self, self.begin_turn(text));
        let completion = self.drive(&mut guard.turn, events, cancel).await;
        guard.finish(completion)
    }

    /// Submit a prompt through a transport and run the resulting turn.
    pub async fn submit(&self, transport: &dyn SessionTransport, text: &str) -> TurnSummary {
        let mut guard = TurnGuard::new(self, self.begin_turn(text));
        let completion = match transport.open_turn(text).await {
            Ok(events) => self.drive(&mut guard.turn, events, std::future::pending()).await,
            Err(e) => {
                self.record_stream_error(&guard.turn, &e);
                Completion::Failed(e.to_string())
            }
        };
        guard.finish(completion)
    }

    async fn drive<C>(&self, turn: &mut TurnState, mut events: EventStream, cancel: C) -> Completion
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);
        loop {
            tokio::select! {
                biased;
                () = &mut cancel => {
                    tracing::info!(turn = %turn.id, "Turn cancelled");
                    return Completion::Cancelled;
                }
                next = events.next() => match next {
                    Some(Ok(event)) => {
                        if self.apply(turn, event) == Outcome::Ended {
                            return Completion::Disconnected;
                        }
                    }
                    Some(Err(e)) => {
                        self.record_stream_error(turn, &e);
                        return Completion::Failed(e.to_string());
                    }
                    None => return Completion::Finished,
                },
            }
        }
    }
}

impl Default for ConversationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// =============================================================================
// Turn Guard
// =============================================================================

/// Finishes the turn on drop if the driver never got to.
struct TurnGuard<'a> {
    engine: &'a ConversationEngine,
    turn: TurnState,
    finished: bool,
}

impl<'a> TurnGuard<'a> {
    fn new(engine: &'a ConversationEngine, turn: TurnState) -> Self {
        Self {
            engine,
            turn,
            finished: false,
        }
    }

    fn finish(mut self, completion: Completion) -> TurnSummary {
        self.finished = true;
        self.engine.finish_turn(&mut self.turn, completion)
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.engine.finish_turn(&mut self.turn, Completion::Cancelled);
        }
    }
}
