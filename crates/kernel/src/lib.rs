//! Farspace kernel: the canonical object registry and the near/far object protocol.
//!
//! # Invariants
//! - An entity is either near or far under one stable id, never both.
//! - All registry mutations flow through explicit operations and are logged as events.
//! - Far objects never own physics bodies.

mod asteroid;
mod decor;
mod far;
mod object;
mod physics;
mod registry;

pub use asteroid::Asteroid;
pub use decor::{ATMOSPHERE_HEIGHT, DecorativeBody};
pub use far::{BuildContext, FactoryError, FarKind, FarObject, KindTag, NearBuilder, ObjectFactory};
pub use object::{
    AllVisible, DrawableKey, DrawableSlot, GroundInfo, NearObject, UpdateContext, VisibilityQuery,
    slots_of,
};
pub use physics::{BodyDef, BodyHandle, KinematicWorld, PhysicsWorld};
pub use registry::{
    FAR_BEGIN_FACTOR, FAR_END_FACTOR, FrameContext, MAX_MOVE_SPEED, ObjectRegistry,
    RADIUS_RECALC_PERIOD, RegistryEvent, RemovalCause,
};

pub fn crate_info() -> &'static str {
    "farspace-kernel v0.1.0"
}
