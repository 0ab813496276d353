//! Agent service adapter
//!
//! Implements [`AgentTransport`](tether_application::AgentTransport) against
//! an agent CLI subprocess speaking newline-delimited JSON over stdio.
//!
//! - [`wire`] — pure frame encoding/decoding (no I/O)
//! - [`process`] — subprocess lifecycle and the background reader task
//! - [`error`] — adapter error types

pub mod error;
pub mod process;
pub mod wire;

pub use error::AgentCliError;
pub use process::ProcessTransport;
