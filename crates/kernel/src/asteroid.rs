use farspace_common::{
    DrawLevel, Drawable, Kinematics, SharedRemover, TextureId, Vec4, should_remove,
};
use glam::Vec2;

use crate::far::{BuildContext, FactoryError, FarKind, FarObject, KindTag};
use crate::object::{NearObject, UpdateContext};
use crate::physics::{BodyDef, BodyHandle, PhysicsWorld};

const DENSITY: f32 = 10.0;
/// Gap left between a rebuilt asteroid and the body it was pushed off.
const SEPARATION_MARGIN: f32 = 0.5;

/// A rock with a physics body and a single sprite.
pub struct Asteroid {
    body: BodyHandle,
    kinematics: Kinematics,
    texture: TextureId,
    size: f32,
    drawables: Vec<Drawable>,
    remover: Option<SharedRemover>,
}

impl Asteroid {
    /// Create the body and sprite for an asteroid of diameter `size`.
    pub fn spawn(
        physics: &mut dyn PhysicsWorld,
        kinematics: Kinematics,
        texture: TextureId,
        size: f32,
        remover: Option<SharedRemover>,
    ) -> Self {
        let body = physics.create_body(BodyDef {
            kinematics,
            radius: size / 2.0,
            density: DENSITY,
        });
        let sprite = Drawable::sprite(texture, size, Vec2::ZERO, DrawLevel::Bodies, 0.0, 0.0, Vec4::ONE);
        Self {
            body,
            kinematics,
            texture,
            size,
            drawables: vec![sprite],
            remover,
        }
    }

    pub fn from_far(
        far: FarObject,
        ctx: &mut BuildContext<'_>,
    ) -> Result<Box<dyn NearObject>, FactoryError> {
        let (texture, size) = match far.kind {
            FarKind::Asteroid { texture, size } => (texture, size),
            ref other => {
                return Err(FactoryError::KindMismatch {
                    expected: KindTag::Asteroid,
                    found: other.tag(),
                });
            }
        };
        let mut kinematics = far.kinematics;
        kinematics.position = clear_position(kinematics.position, size, ctx.occupied);
        let remover = far.remover().cloned();
        Ok(Box::new(Self::spawn(ctx.physics, kinematics, texture, size, remover)))
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }
}

/// Push `position` out of any occupied circle it overlaps.
fn clear_position(mut position: Vec2, size: f32, occupied: &[(Vec2, f32)]) -> Vec2 {
    for &(center, other_size) in occupied {
        let offset = position - center;
        let distance = offset.length();
        if distance <= other_size && distance <= size {
            let dir = offset.try_normalize().unwrap_or(Vec2::X);
            position = center + dir * (other_size.max(size) + SEPARATION_MARGIN);
        }
    }
    position
}

impl NearObject for Asteroid {
    fn kind(&self) -> KindTag {
        KindTag::Asteroid
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        if let Some(k) = ctx.physics.body(self.body) {
            self.kinematics = k;
        }
    }

    fn should_be_removed(&self) -> bool {
        should_remove(self.remover.as_ref(), self.kinematics.position)
    }

    fn on_remove(&mut self, physics: &mut dyn PhysicsWorld) {
        physics.destroy_body(self.body);
    }

    fn to_far(&self) -> Option<FarObject> {
        Some(FarObject::new(
            self.kinematics,
            self.size,
            FarKind::Asteroid {
                texture: self.texture,
                size: self.size,
            },
            self.remover.clone(),
        ))
    }

    fn position(&self) -> Vec2 {
        self.kinematics.position
    }

    fn velocity(&self) -> Vec2 {
        self.kinematics.velocity
    }

    fn angle(&self) -> f32 {
        self.kinematics.angle
    }

    fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    fn drawables_mut(&mut self) -> &mut [Drawable] {
        &mut self.drawables
    }

    fn body_radius(&self) -> Option<f32> {
        Some(self.size)
    }

    fn kinematics(&self) -> Kinematics {
        self.kinematics
    }

    fn debug_label(&self) -> Option<String> {
        Some(format!("asteroid {:.1}", self.size))
    }
}
