//! # Render Module
//!
//! Replay phase: turns the bins of a finished cull traversal into an ordered
//! stream of matrix, state and draw commands.
//!
//! ```text
//! RenderVisitor::cull ──▶ bins ──▶ RenderVisitor::render ──▶ RenderSink
//! ```

mod commands;
mod replay;

pub use commands::{CommandBuffer, RenderCommand, RenderSink, RenderStats};
