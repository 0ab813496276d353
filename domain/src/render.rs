//! Semantic render instructions emitted by the event dispatcher.
//!
//! The dispatcher never formats anything. It emits these instructions in a
//! deterministic order and the presentation layer owns all visual concerns
//! (color, prefixes, truncation).

use crate::event::{TurnSuccess, Usage};

/// An ordered semantic output instruction for the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderInstruction {
    /// A fragment of in-progress assistant text, in emission order.
    TextFragment { text: String },
    /// A tool invocation was requested.
    ToolCall { name: String, order: u64 },
    /// A tool invocation resolved. Emitted monotonically in registration
    /// order within each batch.
    ToolResult {
        name: String,
        order: u64,
        content: String,
        is_error: bool,
    },
    /// Summary of a completed turn.
    TurnSummary {
        duration_ms: u64,
        cost_usd: f64,
        usage: Usage,
    },
    /// A single concise user-visible error line.
    ErrorLine { message: String },
}

impl RenderInstruction {
    pub fn summary(stats: &TurnSuccess) -> Self {
        RenderInstruction::TurnSummary {
            duration_ms: stats.duration_ms,
            cost_usd: stats.cost_usd,
            usage: stats.usage,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        RenderInstruction::ErrorLine {
            message: message.into(),
        }
    }
}
