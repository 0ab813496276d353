//! Event dispatcher — the session state machine.
//!
//! Consumes the inbound event sequence strictly sequentially (one event is
//! fully handled, including correlation-table mutation and render emission,
//! before the next is read), updates the tool correlation table, emits
//! ordered semantic render instructions, and drives the turn controller.
//!
//! # Ordering
//!
//! Text deltas are forwarded in emission order and never reordered. Tool
//! results may arrive later, in batches, and out of request order; resolved
//! results are parked in a buffer keyed by registration order and only the
//! contiguous ready prefix is emitted, so displayed tool output equals
//! registration order no matter how results are batched. A result that
//! never arrives can delay later ones but not block them: the turn-result
//! event flushes whatever is still parked, in registration order.
//!
//! # Failure policy
//!
//! Every per-event problem (malformed content, unknown invocation id,
//! unrecognized tag) is recovered locally — dropped and logged, never
//! fatal. Only transport-level failures abort the turn, through
//! [`TurnController::force_clear`], which also guarantees the input loop
//! cannot deadlock on a dead connection.

use crate::lifecycle::FaultMeter;
use crate::ports::history::{HistoryEvent, HistorySink};
use crate::ports::renderer::Renderer;
use crate::ports::transport::AgentTransport;
use crate::turn::{TurnController, TurnFault, TurnState};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tether_domain::{
    AttachOutcome, CorrelationTable, DeltaPayload, InboundEvent, RegisterOutcome,
    RenderInstruction, SessionStats, TurnOutcome,
};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// Session state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session-init event seen yet.
    Uninitialized,
    /// Session id known, no content in flight.
    Initialized,
    /// A text block is streaming.
    TextStreaming,
    /// Tool invocations are registered and awaiting results.
    ToolPending,
    /// Inbound stream ended cleanly.
    Closed,
    /// Unrecoverable transport failure.
    Errored,
}

/// Demultiplexes inbound events and reconstructs a stable display order.
pub struct EventDispatcher {
    phase: SessionPhase,
    correlation: CorrelationTable,
    /// Per-turn text accumulator, cleared at turn end.
    accumulator: String,
    /// Bytes of delta text seen this turn; lets assistant-turn text act as
    /// a fallback only when nothing was streamed.
    turn_delta_bytes: usize,
    /// Resolved tool results awaiting display, keyed by registration order.
    pending_results: BTreeMap<u64, RenderInstruction>,
    /// Next registration order to emit; emission never skips ahead of it
    /// until the turn ends.
    next_result_order: u64,
    /// Set when a deadline expiry abandons a turn; the abandoned turn's
    /// terminal event, should it still arrive, must not end a later turn.
    discard_stale_terminal: bool,
    stats: SessionStats,
    turn: Arc<TurnController>,
    renderer: Arc<dyn Renderer>,
    history: Arc<dyn HistorySink>,
    faults: Arc<FaultMeter>,
    session_tx: watch::Sender<Option<String>>,
    stats_tx: watch::Sender<SessionStats>,
}

impl EventDispatcher {
    pub fn new(
        turn: Arc<TurnController>,
        renderer: Arc<dyn Renderer>,
        history: Arc<dyn HistorySink>,
        faults: Arc<FaultMeter>,
    ) -> Self {
        let (session_tx, _) = watch::channel(None);
        let (stats_tx, _) = watch::channel(SessionStats::new());
        Self {
            phase: SessionPhase::Uninitialized,
            correlation: CorrelationTable::new(),
            accumulator: String::new(),
            turn_delta_bytes: 0,
            pending_results: BTreeMap::new(),
            next_result_order: 0,
            discard_stale_terminal: false,
            stats: SessionStats::new(),
            turn,
            renderer,
            history,
            faults,
            session_tx,
            stats_tx,
        }
    }

    /// Observe the session id (populated by the first session-init event).
    pub fn session_watch(&self) -> watch::Receiver<Option<String>> {
        self.session_tx.subscribe()
    }

    /// Observe cumulative session statistics.
    pub fn stats_watch(&self) -> watch::Receiver<SessionStats> {
        self.stats_tx.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Consume inbound events until the transport closes or fails.
    ///
    /// While a turn is in flight and `turn_deadline` is set, waiting for
    /// the next event is bounded; expiry force-clears the turn with a
    /// timeout fault and reading continues. The first terminal event seen
    /// after an expiry belongs to the abandoned turn and is discarded (the
    /// wire carries no turn id, so this is the closest correlation
    /// available).
    pub async fn run(mut self, transport: Arc<dyn AgentTransport>, turn_deadline: Option<Duration>) {
        loop {
            let next = match turn_deadline {
                Some(deadline) => {
                    let mut busy_rx = self.turn.subscribe();
                    tokio::select! {
                        event = transport.next_event() => Some(event),
                        _ = deadline_for_busy_turn(&mut busy_rx, deadline) => None,
                    }
                }
                None => Some(transport.next_event().await),
            };

            match next {
                None => {
                    warn!("Dispatcher: turn produced no terminal event within the deadline");
                    self.discard_stale_terminal = true;
                    self.turn.force_clear(TurnFault::Timeout);
                }
                Some(Ok(Some(event))) => self.handle_event(event),
                Some(Ok(None)) => {
                    info!("Dispatcher: inbound stream ended");
                    if self.turn.is_busy() {
                        self.turn
                            .force_clear(TurnFault::Transport("stream closed mid-turn".to_string()));
                    }
                    self.phase = SessionPhase::Closed;
                    break;
                }
                Some(Err(error)) => {
                    warn!("Dispatcher: transport failure: {}", error);
                    self.faults.record();
                    self.turn.force_clear(TurnFault::Transport(error.to_string()));
                    self.phase = SessionPhase::Errored;
                    break;
                }
            }
        }
    }

    /// Handle one inbound event. Infallible: per-event errors are recovered
    /// locally at this boundary.
    pub fn handle_event(&mut self, event: InboundEvent) {
        trace!("Dispatcher: {}", event.tag());
        match event {
            InboundEvent::SessionInit { session_id } => {
                if self.session_tx.borrow().is_some() {
                    debug!("Dispatcher: duplicate session-init ignored ({})", session_id);
                    return;
                }
                info!("Dispatcher: session initialized: {}", session_id);
                self.history.record(HistoryEvent::new(
                    "session_started",
                    serde_json::json!({ "session_id": session_id }),
                ));
                let _ = self.session_tx.send(Some(session_id));
                if self.phase == SessionPhase::Uninitialized {
                    self.phase = SessionPhase::Initialized;
                }
            }

            InboundEvent::StreamDelta(DeltaPayload::Text(text)) => {
                if text.is_empty() {
                    return;
                }
                self.phase = SessionPhase::TextStreaming;
                self.accumulator.push_str(&text);
                self.turn_delta_bytes += text.len();
                self.renderer.render(RenderInstruction::TextFragment { text });
            }

            InboundEvent::StreamDelta(DeltaPayload::PartialToolInput(_)) => {
                // Never assembled: the complete invocation arrives with
                // the assistant-turn event.
                trace!("Dispatcher: partial tool input discarded");
            }

            InboundEvent::BlockStart { kind } => {
                trace!("Dispatcher: block-start ({})", kind);
                if kind == "text" {
                    self.phase = SessionPhase::TextStreaming;
                }
            }

            InboundEvent::BlockStop { kind } => {
                trace!("Dispatcher: block-stop ({})", kind);
                if self.phase == SessionPhase::TextStreaming {
                    self.phase = SessionPhase::Initialized;
                }
            }

            InboundEvent::AssistantTurn {
                text,
                tool_invocations,
            } => {
                // Use the turn's complete text only when no deltas were
                // streamed, so nothing is ever rendered twice.
                if self.turn_delta_bytes == 0
                    && let Some(text) = text
                    && !text.is_empty()
                {
                    self.accumulator.push_str(&text);
                    self.renderer.render(RenderInstruction::TextFragment { text });
                }

                for invocation in tool_invocations {
                    let outcome = self.correlation.register(
                        invocation.id.clone(),
                        invocation.name.clone(),
                        invocation.input,
                    );
                    if let RegisterOutcome::Overwrote(order) = outcome {
                        warn!(
                            "Dispatcher: duplicate invocation id {} overwritten at order {}",
                            invocation.id, order
                        );
                    }
                    self.renderer.render(RenderInstruction::ToolCall {
                        name: invocation.name,
                        order: outcome.order(),
                    });
                    self.phase = SessionPhase::ToolPending;
                }
            }

            InboundEvent::ToolResultBatch { results } => {
                for result in results {
                    match self.correlation.attach_result(
                        &result.invocation_id,
                        result.content,
                        result.is_error,
                    ) {
                        AttachOutcome::Attached(order) => {
                            if let Some(record) = self.correlation.record(&result.invocation_id) {
                                self.pending_results.insert(
                                    order,
                                    RenderInstruction::ToolResult {
                                        name: record.name.clone(),
                                        order: record.order,
                                        content: record.result.clone().unwrap_or_default(),
                                        is_error: record.is_error,
                                    },
                                );
                            }
                        }
                        AttachOutcome::AlreadyResolved(order) => debug!(
                            "Dispatcher: duplicate result for {} (order {}) dropped",
                            result.invocation_id, order
                        ),
                        AttachOutcome::UnknownId => debug!(
                            "Dispatcher: result for unknown invocation {} dropped",
                            result.invocation_id
                        ),
                    }
                }
                self.emit_ready_results();
            }

            InboundEvent::TurnResult(outcome) => {
                if self.discard_stale_terminal {
                    self.discard_stale_terminal = false;
                    debug!("Dispatcher: terminal event from a timed-out turn discarded");
                    return;
                }
                self.finish_turn(outcome);
            }

            InboundEvent::ProgressNotice => {
                trace!("Dispatcher: progress notice");
            }

            InboundEvent::Unrecognized { tag } => {
                debug!("Dispatcher: unrecognized event '{}' ignored", tag);
            }
        }
    }

    /// Emit the contiguous run of resolved results starting at the next
    /// unemitted registration order. A gap (an earlier result not yet
    /// arrived) holds everything behind it until the gap fills or the turn
    /// ends.
    fn emit_ready_results(&mut self) {
        while let Some(instruction) = self.pending_results.remove(&self.next_result_order) {
            self.renderer.render(instruction);
            self.next_result_order += 1;
        }
    }

    fn finish_turn(&mut self, outcome: TurnOutcome) {
        // A result that never arrived must not hold back the ones that did:
        // emit everything still parked, in registration order.
        if !self.pending_results.is_empty() {
            debug!(
                "Dispatcher: flushing {} result(s) held back by a missing earlier result",
                self.pending_results.len()
            );
            for (_, instruction) in std::mem::take(&mut self.pending_results) {
                self.renderer.render(instruction);
            }
        }
        self.next_result_order = self.correlation.next_order();

        let success = match &outcome {
            TurnOutcome::Success(turn) => {
                self.stats.record_turn(turn);
                let _ = self.stats_tx.send(self.stats);
                self.renderer.render(RenderInstruction::summary(turn));
                self.faults.reset();
                true
            }
            TurnOutcome::Failure(failure) => {
                self.renderer
                    .render(RenderInstruction::error(&failure.error));
                false
            }
        };

        self.history.record(HistoryEvent::new(
            "turn_completed",
            serde_json::json!({
                "session_id": self.session_tx.borrow().clone(),
                "success": success,
                "text": self.accumulator,
            }),
        ));

        let pruned = self.correlation.end_of_turn_prune();
        if pruned > 0 {
            debug!("Dispatcher: pruned {} resolved invocation record(s)", pruned);
        }

        self.accumulator.clear();
        self.turn_delta_bytes = 0;
        self.phase = SessionPhase::Initialized;
        self.turn.end_turn();
    }
}

/// Resolves once a turn has been busy for `deadline` without interruption.
///
/// Waits for the busy flag, then arms the timer; any turn-state change
/// re-checks the flag, so the timer never fires for an already-ended turn.
async fn deadline_for_busy_turn(rx: &mut watch::Receiver<TurnState>, deadline: Duration) {
    loop {
        while !rx.borrow_and_update().busy {
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
        tokio::select! {
            _ = tokio::time::sleep(deadline) => {
                if rx.borrow().busy {
                    return;
                }
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        }
    }
}
