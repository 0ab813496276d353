//! Domain layer for tether
//!
//! This crate contains the core session data model: outbound messages,
//! inbound events, tool invocation records, render instructions, and
//! cumulative session statistics. It has no dependencies on infrastructure
//! or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Turn
//!
//! One complete user-message-to-agent-response cycle, possibly containing
//! multiple tool invocations. Tether serializes exactly one active turn at
//! a time.
//!
//! ## Correlation
//!
//! Tool invocations are correlated by a unique id. Their results may arrive
//! later, in batches, or out of request order; the [`CorrelationTable`]
//! preserves registration order so display output stays deterministic.

pub mod correlation;
pub mod event;
pub mod message;
pub mod render;
pub mod stats;

// Re-export commonly used types
pub use correlation::{AttachOutcome, CorrelationTable, RegisterOutcome, ToolInvocationRecord};
pub use event::{
    DeltaPayload, InboundEvent, ToolInvocation, ToolResultPayload, TurnFailure, TurnOutcome,
    TurnSuccess, Usage,
};
pub use message::{ContentPart, OutboundMessage, Role};
pub use render::RenderInstruction;
pub use stats::SessionStats;
