//! Session history persistence adapters

pub mod jsonl;

pub use jsonl::JsonlHistorySink;
