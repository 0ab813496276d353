//! Infrastructure layer for tether
//!
//! Adapters that implement the application-layer ports against the real
//! world: the agent subprocess transport, the JSONL history sink, and the
//! configuration loader.

pub mod agent;
pub mod config;
pub mod history;

pub use agent::{AgentCliError, ProcessTransport};
pub use config::{ConfigLoader, FileConfig};
pub use history::JsonlHistorySink;
