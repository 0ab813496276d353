//! Application layer for tether
//!
//! This crate contains the coordination core of the session engine and the
//! ports through which it talks to the outside world:
//!
//! - [`bridge::BridgeQueue`] — turns push-style message submission into the
//!   pull-style feed the outbound transport consumes.
//! - [`turn::TurnController`] — enforces the single-in-flight-turn invariant.
//! - [`dispatcher::EventDispatcher`] — the session state machine that
//!   demultiplexes inbound events and reconstructs a stable display order
//!   for tool invocations.
//! - [`lifecycle::SessionEngine`] — owns the session id, the background
//!   tasks, and shutdown/cancellation sequencing.
//! - [`ports`] — traits implemented by infrastructure and presentation
//!   adapters (transport, renderer, history).

pub mod bridge;
pub mod dispatcher;
pub mod lifecycle;
pub mod ports;
pub mod turn;

// Re-export commonly used types
pub use bridge::BridgeQueue;
pub use dispatcher::{EventDispatcher, SessionPhase};
pub use lifecycle::{EngineOptions, FaultMeter, SessionEngine};
pub use ports::history::{HistoryEvent, HistorySink, NoHistorySink};
pub use ports::renderer::{NullRenderer, Renderer};
pub use ports::transport::{AgentTransport, TransportError};
pub use turn::{TurnController, TurnFault, TurnState};
