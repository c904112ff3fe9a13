use farspace_common::{Drawable, Kinematics, SharedRemover, TextureId, radius_of, should_remove};
use glam::Vec2;
use std::fmt;

use crate::asteroid::Asteroid;
use crate::decor::DecorativeBody;
use crate::object::NearObject;
use crate::physics::PhysicsWorld;

/// Which near kind a far object turns back into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KindTag {
    Asteroid,
    Decorative,
}

impl KindTag {
    pub const COUNT: usize = 2;

    pub const ALL: [KindTag; Self::COUNT] = [KindTag::Asteroid, KindTag::Decorative];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Kind-specific payload of a far object: just enough to rebuild the near
/// object, never a physics body.
#[derive(Debug, Clone, PartialEq)]
pub enum FarKind {
    Asteroid { texture: TextureId, size: f32 },
    Decorative { drawables: Vec<Drawable>, hide_near_ground: bool },
}

impl FarKind {
    pub fn tag(&self) -> KindTag {
        match self {
            FarKind::Asteroid { .. } => KindTag::Asteroid,
            FarKind::Decorative { .. } => KindTag::Decorative,
        }
    }
}

/// Compact stand-in for an entity outside simulation range.
#[derive(Clone)]
pub struct FarObject {
    pub kinematics: Kinematics,
    pub radius: f32,
    pub kind: FarKind,
    remover: Option<SharedRemover>,
}

impl FarObject {
    pub fn new(
        kinematics: Kinematics,
        radius: f32,
        kind: FarKind,
        remover: Option<SharedRemover>,
    ) -> Self {
        Self {
            kinematics,
            radius,
            kind,
            remover,
        }
    }

    /// A far decorative group; its radius is derived from the drawables.
    pub fn decorative(
        drawables: Vec<Drawable>,
        position: Vec2,
        velocity: Vec2,
        remover: Option<SharedRemover>,
        hide_near_ground: bool,
    ) -> Self {
        let radius = radius_of(&drawables);
        Self::new(
            Kinematics::at(position).with_velocity(velocity),
            radius,
            FarKind::Decorative {
                drawables,
                hide_near_ground,
            },
            remover,
        )
    }

    pub fn tag(&self) -> KindTag {
        self.kind.tag()
    }

    pub fn position(&self) -> Vec2 {
        self.kinematics.position
    }

    pub fn remover(&self) -> Option<&SharedRemover> {
        self.remover.as_ref()
    }

    pub fn should_be_removed(&self) -> bool {
        should_remove(self.remover.as_ref(), self.kinematics.position)
    }

    /// Parallax depth used to scale presence tests; taken from the first
    /// drawable's level.
    pub fn depth(&self) -> f32 {
        match &self.kind {
            FarKind::Decorative { drawables, .. } => {
                drawables.first().map_or(1.0, |d| d.level().depth())
            }
            FarKind::Asteroid { .. } => 1.0,
        }
    }

    pub fn has_body(&self) -> bool {
        matches!(self.kind, FarKind::Asteroid { .. })
    }
}

impl fmt::Debug for FarObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FarObject")
            .field("kinematics", &self.kinematics)
            .field("radius", &self.radius)
            .field("kind", &self.kind)
            .field("has_remover", &self.remover.is_some())
            .finish()
    }
}

/// Errors rebuilding near objects from far ones.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("no near-object builder registered for {0:?}")]
    NoBuilder(KindTag),
    #[error("builder for {expected:?} handed a {found:?} far object")]
    KindMismatch { expected: KindTag, found: KindTag },
}

/// World state a builder may need while recreating an object.
pub struct BuildContext<'a> {
    pub physics: &'a mut dyn PhysicsWorld,
    /// Circles (centre, radius) already taken by body-carrying objects.
    pub occupied: &'a [(Vec2, f32)],
}

pub type NearBuilder =
    fn(FarObject, &mut BuildContext<'_>) -> Result<Box<dyn NearObject>, FactoryError>;

/// Table from kind tag to the builder that recreates that kind.
#[derive(Clone)]
pub struct ObjectFactory {
    builders: [Option<NearBuilder>; KindTag::COUNT],
}

impl ObjectFactory {
    /// A factory with no builders.
    pub fn empty() -> Self {
        Self {
            builders: [None; KindTag::COUNT],
        }
    }

    /// A factory that can rebuild every kind in [`KindTag::ALL`].
    pub fn standard() -> Self {
        let mut factory = Self::empty();
        for tag in KindTag::ALL {
            let builder: NearBuilder = match tag {
                KindTag::Asteroid => Asteroid::from_far,
                KindTag::Decorative => DecorativeBody::from_far,
            };
            factory.register(tag, builder);
        }
        factory
    }

    pub fn register(&mut self, tag: KindTag, builder: NearBuilder) {
        self.builders[tag.index()] = Some(builder);
    }

    pub fn supports(&self, tag: KindTag) -> bool {
        self.builders[tag.index()].is_some()
    }

    pub fn build(
        &self,
        far: FarObject,
        ctx: &mut BuildContext<'_>,
    ) -> Result<Box<dyn NearObject>, FactoryError> {
        let tag = far.tag();
        let builder = self.builders[tag.index()].ok_or(FactoryError::NoBuilder(tag))?;
        builder(far, ctx)
    }
}

impl Default for ObjectFactory {
    fn default() -> Self {
        Self::standard()
    }
}
