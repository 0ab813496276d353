//! Presentation layer for tether
//!
//! Everything the user sees and types: the console renderer that turns
//! semantic render instructions into terminal output, the interactive REPL,
//! and the clap CLI surface.

pub mod chat;
pub mod cli;
pub mod output;

pub use chat::ChatRepl;
pub use cli::Cli;
pub use output::ConsoleRenderer;
