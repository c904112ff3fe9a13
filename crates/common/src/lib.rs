//! Shared types for the farspace engine.
//!
//! # Invariants
//! - Everything here is a plain value: no physics or GPU resources.
//! - Drawables carry only relative placement; world placement comes from the owner.

mod draw;
mod remove;
mod types;

pub use draw::{DrawLevel, Drawable, TextureId, radius_of};
pub use remove::{NeverRemove, RemoveController, SharedRemover, should_remove};
pub use types::{EntityId, Kinematics};

pub use glam::{Vec2, Vec4};

pub fn crate_info() -> &'static str {
    "farspace-common v0.1.0"
}
