//! Developer tooling: inspector summaries and the debug overlay.
//!
//! # Invariants
//! - Tools only read simulation state.

mod inspector;
mod overlay;

pub use inspector::{EntityInfo, Representation, WorldInspector, WorldSummary};
pub use overlay::{CULLED_COLOR, VISIBLE_COLOR, draw_bounds};

pub fn crate_info() -> &'static str {
    "farspace-tools v0.1.0"
}
