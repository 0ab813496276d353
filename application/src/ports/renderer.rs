//! Renderer port
//!
//! The dispatcher emits ordered semantic [`RenderInstruction`]s; the
//! renderer owns all visual formatting. The method is intentionally
//! synchronous and non-fallible so rendering can never block or fail the
//! event-processing path.

use tether_domain::RenderInstruction;

/// Receives ordered semantic output instructions.
pub trait Renderer: Send + Sync {
    fn render(&self, instruction: RenderInstruction);
}

/// No-op implementation for tests and headless runs.
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&self, _instruction: RenderInstruction) {}
}
