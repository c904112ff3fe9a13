//! Rendering: draw-level registry, visibility culling and batched draw dispatch.
//!
//! # Invariants
//! - The draw phase reads the object registry; it never mutates it.
//! - Only drawables in the visible set reach a sink.
//! - Levels are emitted back to front, texture buckets in first-insertion order.
//!
//! # Workaround
//! Sprites are handed to a [`DrawSink`] rather than a GPU backend. The trait is
//! stable; swap in a real backend without changing the draw manager.

mod camera;
mod levels;
mod sink;

pub use camera::Camera;
pub use levels::{DepthTable, DrawLevelManager, DrawStats, drawable_circle, in_view};
pub use sink::{DebugCircle, DrawCommand, DrawSink, RecordingSink, TextSink};

pub fn crate_info() -> &'static str {
    "farspace-render v0.1.0"
}
