//! Agent transport port
//!
//! Defines the interface to the streaming agent service. The engine never
//! assumes a specific wire encoding: it hands over [`OutboundMessage`]s and
//! receives [`InboundEvent`]s, and everything byte-level belongs to the
//! adapter.

use async_trait::async_trait;
use tether_domain::{InboundEvent, OutboundMessage};
use thiserror::Error;

/// Errors that can occur at the transport boundary.
///
/// These are the only errors that abort a turn; everything event-level is
/// recovered inside the dispatcher.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Transport closed")]
    Closed,

    #[error("Cancellation not acknowledged")]
    CancelUnacknowledged,

    #[error("Other error: {0}")]
    Other(String),
}

/// Bidirectional streaming connection to the agent service.
///
/// One logical consumer calls [`next_event`](Self::next_event) sequentially;
/// the outbound pump calls [`send`](Self::send). Both sides may be driven
/// from different tasks, so implementations take `&self` and manage their
/// own interior synchronization.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Deliver one outbound message to the agent service.
    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError>;

    /// Receive the next inbound event.
    ///
    /// `Ok(None)` signals a clean end of the inbound stream. Must be
    /// cancel-safe: the dispatcher races it against the per-turn deadline.
    async fn next_event(&self) -> Result<Option<InboundEvent>, TransportError>;

    /// Best-effort cancellation signal (user interrupt or shutdown).
    ///
    /// `Ok` means the signal was delivered, not that the agent honored it;
    /// callers bound the wait with a grace period.
    async fn cancel(&self) -> Result<(), TransportError>;
}
