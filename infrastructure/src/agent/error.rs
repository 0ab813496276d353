//! Error types for the agent CLI adapter.
//!
//! Covers process setup only; once the transport is running, failures
//! surface as `TransportError` at the port boundary.

use thiserror::Error;

/// Errors that can occur while spawning the agent CLI
#[derive(Error, Debug)]
pub enum AgentCliError {
    #[error("Failed to spawn agent process: {0}")]
    SpawnError(#[from] std::io::Error),

    #[error("Agent process has no stdio pipe: {0}")]
    MissingPipe(&'static str),
}
