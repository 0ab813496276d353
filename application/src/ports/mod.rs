//! Ports (interfaces) for external collaborators
//!
//! These traits define how the coordination core communicates with the
//! outside world. Implementations (adapters) live in the infrastructure and
//! presentation layers.

pub mod history;
pub mod renderer;
pub mod transport;
