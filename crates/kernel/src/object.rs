use farspace_common::{DrawLevel, Drawable, EntityId, Kinematics, TextureId};
use glam::Vec2;

use crate::far::{FarObject, KindTag};
use crate::physics::PhysicsWorld;

/// Identifies one drawable: the owning entity plus the drawable's index in
/// the owner's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableKey {
    pub entity: EntityId,
    pub index: u32,
}

impl DrawableKey {
    pub fn new(entity: EntityId, index: usize) -> Self {
        debug_assert!(u32::try_from(index).is_ok(), "drawable index {index} out of range");
        Self {
            entity,
            index: index as u32,
        }
    }

    /// Position of the drawable in its owner's list.
    pub fn slot(self) -> usize {
        self.index as usize
    }
}

/// Where a drawable is filed in the draw-level tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawableSlot {
    pub key: DrawableKey,
    pub level: DrawLevel,
    pub texture: TextureId,
}

/// Slots for every drawable of an object.
pub fn slots_of(entity: EntityId, drawables: &[Drawable]) -> Vec<DrawableSlot> {
    drawables
        .iter()
        .enumerate()
        .map(|(i, d)| DrawableSlot {
            key: DrawableKey::new(entity, i),
            level: d.level(),
            texture: d.texture(),
        })
        .collect()
}

/// Read access to last frame's visible set.
pub trait VisibilityQuery {
    fn is_in_cam(&self, key: DrawableKey) -> bool;
}

/// Treats every drawable as visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllVisible;

impl VisibilityQuery for AllVisible {
    fn is_in_cam(&self, _key: DrawableKey) -> bool {
        true
    }
}

/// The nearest large body with a surface, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundInfo {
    pub center: Vec2,
    pub ground_height: f32,
}

/// Per-object view of the frame handed to [`NearObject::update`].
pub struct UpdateContext<'a> {
    pub entity: EntityId,
    pub dt: f32,
    pub physics: &'a mut dyn PhysicsWorld,
    pub ground: Option<GroundInfo>,
    pub visibility: &'a dyn VisibilityQuery,
}

/// A fully simulated entity living in the object registry.
pub trait NearObject {
    fn kind(&self) -> KindTag;

    /// Per-tick behaviour. Drawable timers are advanced by the registry.
    fn update(&mut self, ctx: &mut UpdateContext<'_>);

    fn should_be_removed(&self) -> bool;

    /// Release physics bodies. Called exactly once when the object leaves
    /// the registry, whatever the reason.
    fn on_remove(&mut self, _physics: &mut dyn PhysicsWorld) {}

    /// Compact stand-in for this object, or `None` if the object is
    /// ephemeral and should simply vanish.
    fn to_far(&self) -> Option<FarObject>;

    fn position(&self) -> Vec2;

    fn velocity(&self) -> Vec2;

    fn angle(&self) -> f32;

    fn drawables(&self) -> &[Drawable];

    fn drawables_mut(&mut self) -> &mut [Drawable];

    /// Collision radius for objects that own a physics body.
    fn body_radius(&self) -> Option<f32> {
        None
    }

    fn kinematics(&self) -> Kinematics {
        Kinematics::at(self.position())
            .with_velocity(self.velocity())
            .with_angle(self.angle())
    }

    fn debug_label(&self) -> Option<String> {
        None
    }
}
