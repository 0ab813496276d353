//! Port for fire-and-forget session history persistence.
//!
//! The dispatcher notifies this sink of session and turn milestones so an
//! adapter can keep a transcript (e.g. a JSONL file). The port must never
//! block or fail the turn-processing path: the method is synchronous and
//! non-fallible, and adapter-side errors are caught and logged only.
//!
//! This is separate from `tracing`-based diagnostics: tracing carries
//! human-readable operational messages, this port carries the conversation
//! record.

use serde_json::Value;

/// A structured history event.
pub struct HistoryEvent {
    /// Event type identifier (e.g., "session_started", "turn_completed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl HistoryEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Receives history notifications, fire-and-forget.
pub trait HistorySink: Send + Sync {
    fn record(&self, event: HistoryEvent);
}

/// No-op implementation for tests and when persistence is disabled.
pub struct NoHistorySink;

impl HistorySink for NoHistorySink {
    fn record(&self, _event: HistoryEvent) {}
}
