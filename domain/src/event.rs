//! Inbound events from the agent service.
//!
//! [`InboundEvent`] is the tagged sum of everything the transport can hand
//! to the event dispatcher. The set is deliberately closed with an
//! [`Unrecognized`](InboundEvent::Unrecognized) arm: the wire protocol
//! evolves faster than this crate, and an unknown tag must never be fatal.

use serde::{Deserialize, Serialize};

/// A tool invocation request carried by an assistant-turn event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    /// Complete input snapshot. Partial fragments streamed ahead of the
    /// assistant-turn event are discarded, never assembled.
    pub input: serde_json::Value,
}

/// One result inside a tool-result batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultPayload {
    pub invocation_id: String,
    pub content: String,
    pub is_error: bool,
}

/// Token usage reported with a successful turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Stats carried by a successful turn-result event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnSuccess {
    pub duration_ms: u64,
    pub cost_usd: f64,
    pub usage: Usage,
}

/// Error carried by a failed turn-result event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnFailure {
    pub error: String,
}

/// Terminal outcome of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurnOutcome {
    Success(TurnSuccess),
    Failure(TurnFailure),
}

/// Payload of a stream-delta event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaPayload {
    /// A text fragment of the in-progress assistant message.
    Text(String),
    /// A fragment of structured tool input. Never assembled; the complete
    /// invocation arrives with the assistant-turn event.
    PartialToolInput(String),
}

/// A single inbound structured notification from the transport.
///
/// Consumed exactly once, in arrival order, by the event dispatcher.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// First event of a session; carries the session id.
    SessionInit { session_id: String },
    /// Incremental streaming payload.
    StreamDelta(DeltaPayload),
    /// A content block opened (text or tool input).
    BlockStart { kind: String },
    /// A content block closed.
    BlockStop { kind: String },
    /// A complete assistant turn: optional text plus zero or more tool
    /// invocation requests.
    AssistantTurn {
        text: Option<String>,
        tool_invocations: Vec<ToolInvocation>,
    },
    /// Results for one or more tool invocations, possibly out of request
    /// order and possibly covering only a subset of the open invocations.
    ToolResultBatch { results: Vec<ToolResultPayload> },
    /// Terminal event of a turn.
    TurnResult(TurnOutcome),
    /// Best-effort progress notice; ignorable.
    ProgressNotice,
    /// Forward compatibility: an event tag this build does not know.
    Unrecognized { tag: String },
}

impl InboundEvent {
    /// Returns true if this event terminates the current turn.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InboundEvent::TurnResult(_))
    }

    /// Short tag for logging.
    pub fn tag(&self) -> &str {
        match self {
            InboundEvent::SessionInit { .. } => "session-init",
            InboundEvent::StreamDelta(DeltaPayload::Text(_)) => "stream-delta(text)",
            InboundEvent::StreamDelta(DeltaPayload::PartialToolInput(_)) => {
                "stream-delta(partial-tool-input)"
            }
            InboundEvent::BlockStart { .. } => "block-start",
            InboundEvent::BlockStop { .. } => "block-stop",
            InboundEvent::AssistantTurn { .. } => "assistant-turn",
            InboundEvent::ToolResultBatch { .. } => "tool-result-batch",
            InboundEvent::TurnResult(_) => "turn-result",
            InboundEvent::ProgressNotice => "progress-notice",
            InboundEvent::Unrecognized { tag } => tag,
        }
    }
}
