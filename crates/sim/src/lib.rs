//! Frame orchestration for a streamed 2D space world.
//!
//! Each fixed step runs the phases in this order:
//! 1. chunk streaming fills and retires chunks around the viewpoint,
//! 2. the object registry updates near objects and converts near/far,
//! 3. registry events are applied to the draw level manager, which then
//!    recomputes the visible set.
//!
//! Drawing reads the visible set and never mutates the registry.
//!
//! # Invariants
//! - Drawables of an object removed in a step are unregistered before that
//!   step's visibility pass.
//! - Shutdown releases every physics body, including ones queued for addition.

mod config;
mod simulation;

pub use config::{ConfigError, SimConfig};
pub use simulation::{Simulation, StepReport};

pub fn crate_info() -> &'static str {
    "farspace-sim v0.1.0"
}
