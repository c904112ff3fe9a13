use farspace_common::{Drawable, Kinematics, SharedRemover, radius_of, should_remove};
use glam::Vec2;

use crate::far::{BuildContext, FactoryError, FarKind, FarObject, KindTag};
use crate::object::{DrawableKey, NearObject, UpdateContext};

/// Height of the atmosphere band above a planet's ground.
pub const ATMOSPHERE_HEIGHT: f32 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    max: f32,
    left: f32,
}

/// A group of drawables with no gameplay behaviour: dust, drifting junk,
/// lingering explosion visuals.
pub struct DecorativeBody {
    drawables: Vec<Drawable>,
    position: Vec2,
    velocity: Vec2,
    remover: Option<SharedRemover>,
    temporary: bool,
    hide_near_ground: bool,
    fade: Option<Fade>,
}

impl DecorativeBody {
    /// `temporary` bodies are ephemeral: they never become far objects and
    /// are discarded once every drawable is done.
    pub fn new(
        drawables: Vec<Drawable>,
        position: Vec2,
        velocity: Vec2,
        remover: Option<SharedRemover>,
        temporary: bool,
        hide_near_ground: bool,
    ) -> Self {
        Self {
            drawables,
            position,
            velocity,
            remover,
            temporary,
            hide_near_ground,
            fade: None,
        }
    }

    pub fn from_far(
        far: FarObject,
        _ctx: &mut BuildContext<'_>,
    ) -> Result<Box<dyn NearObject>, FactoryError> {
        let remover = far.remover().cloned();
        match far.kind {
            FarKind::Decorative {
                drawables,
                hide_near_ground,
            } => Ok(Box::new(Self::new(
                drawables,
                far.kinematics.position,
                far.kinematics.velocity,
                remover,
                false,
                hide_near_ground,
            ))),
            other => Err(FactoryError::KindMismatch {
                expected: KindTag::Decorative,
                found: other.tag(),
            }),
        }
    }

    /// Start fading out over `seconds`; the body is removed when the fade ends.
    pub fn fade(&mut self, seconds: f32) {
        self.fade = Some(Fade {
            max: seconds,
            left: seconds,
        });
    }

    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    fn apply_ground_fade(&mut self, ctx: &UpdateContext<'_>) {
        let Some(ground) = ctx.ground else {
            return;
        };
        let gradient = 0.25 * ATMOSPHERE_HEIGHT;
        for (i, drawable) in self.drawables.iter_mut().enumerate() {
            if !ctx.visibility.is_in_cam(DrawableKey::new(ctx.entity, i)) {
                continue;
            }
            let pos = drawable.world_pos(self.position, 0.0);
            let dist = pos.distance(ground.center) - ground.ground_height - ATMOSPHERE_HEIGHT;
            drawable.set_alpha((dist / gradient).clamp(0.0, 1.0));
        }
    }

    fn fade_step(&mut self, dt: f32) {
        let Some(fade) = self.fade.as_mut() else {
            return;
        };
        fade.left -= dt;
        let perc = fade.left / fade.max;
        for drawable in &mut self.drawables {
            let alpha = (perc * drawable.base_alpha()).clamp(0.0, 1.0);
            drawable.set_alpha(alpha);
        }
    }
}

impl NearObject for DecorativeBody {
    fn kind(&self) -> KindTag {
        KindTag::Decorative
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        self.position += self.velocity * ctx.dt;
        if self.hide_near_ground {
            self.apply_ground_fade(ctx);
        } else if self.fade.is_some_and(|f| f.max > 0.0) {
            self.fade_step(ctx.dt);
        }
    }

    fn should_be_removed(&self) -> bool {
        if self.fade.is_some_and(|f| f.max > 0.0 && f.left <= 0.0) {
            return true;
        }
        if self.temporary && self.drawables.iter().all(Drawable::ok_to_remove) {
            return true;
        }
        should_remove(self.remover.as_ref(), self.position)
    }

    fn to_far(&self) -> Option<FarObject> {
        if self.temporary {
            return None;
        }
        Some(FarObject::new(
            Kinematics::at(self.position).with_velocity(self.velocity),
            radius_of(&self.drawables),
            FarKind::Decorative {
                drawables: self.drawables.clone(),
                hide_near_ground: self.hide_near_ground,
            },
            self.remover.clone(),
        ))
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn angle(&self) -> f32 {
        0.0
    }

    fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    fn drawables_mut(&mut self) -> &mut [Drawable] {
        &mut self.drawables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{AllVisible, GroundInfo, VisibilityQuery};
    use crate::physics::{KinematicWorld, PhysicsWorld};
    use farspace_common::{DrawLevel, EntityId, TextureId, Vec4};

    fn sprite(level: DrawLevel) -> Drawable {
        Drawable::sprite(TextureId(1), 1.0, Vec2::ZERO, level, 0.0, 0.0, Vec4::new(1.0, 1.0, 1.0, 0.8))
    }

    fn tick(body: &mut DecorativeBody, dt: f32, ground: Option<GroundInfo>, vis: &dyn VisibilityQuery) {
        let mut physics = KinematicWorld::new();
        let mut ctx = UpdateContext {
            entity: EntityId::new(),
            dt,
            physics: &mut physics,
            ground,
            visibility: vis,
        };
        body.update(&mut ctx);
        for d in body.drawables_mut() {
            d.update(dt);
        }
    }

    struct NothingVisible;

    impl VisibilityQuery for NothingVisible {
        fn is_in_cam(&self, _key: DrawableKey) -> bool {
            false
        }
    }

    #[test]
    fn temporary_body_is_ephemeral() {
        let body = DecorativeBody::new(vec![sprite(DrawLevel::Deco)], Vec2::ZERO, Vec2::ZERO, None, true, false);
        assert!(body.to_far().is_none());
    }

    #[test]
    fn round_trip_preserves_motion_and_drawables() {
        let body = DecorativeBody::new(
            vec![sprite(DrawLevel::FarDeco1), sprite(DrawLevel::FarDeco1)],
            Vec2::new(-4.0, 9.0),
            Vec2::new(0.1, -0.2),
            None,
            false,
            true,
        );
        let far = body.to_far().unwrap();
        assert_eq!(far.depth(), 1.5);

        let mut physics = KinematicWorld::new();
        let mut ctx = BuildContext {
            physics: &mut physics,
            occupied: &[],
        };
        let rebuilt = DecorativeBody::from_far(far, &mut ctx).unwrap();
        assert!(rebuilt.kinematics().approx_eq(&body.kinematics(), 1e-6));
        assert_eq!(rebuilt.drawables(), body.drawables());
        assert_eq!(physics.body_count(), 0);
    }

    #[test]
    fn drifts_with_velocity() {
        let mut body = DecorativeBody::new(vec![sprite(DrawLevel::Deco)], Vec2::ZERO, Vec2::new(2.0, 0.0), None, false, false);
        tick(&mut body, 0.5, None, &AllVisible);
        assert_eq!(body.position(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn fade_ramps_alpha_then_removes() {
        let mut body = DecorativeBody::new(vec![sprite(DrawLevel::Deco)], Vec2::ZERO, Vec2::ZERO, None, false, false);
        body.fade(1.0);
        tick(&mut body, 0.5, None, &AllVisible);
        assert!((body.drawables()[0].tint.w - 0.4).abs() < 1e-5);
        assert!(!body.should_be_removed());

        tick(&mut body, 0.6, None, &AllVisible);
        assert_eq!(body.drawables()[0].tint.w, 0.0);
        assert!(body.should_be_removed());
    }

    #[test]
    fn temporary_waits_for_lingering_drawables() {
        let lingering = sprite(DrawLevel::PartFg0).lingering(1.0);
        let mut body = DecorativeBody::new(vec![lingering], Vec2::ZERO, Vec2::ZERO, None, true, false);
        assert!(!body.should_be_removed());
        tick(&mut body, 1.5, None, &AllVisible);
        assert!(body.should_be_removed());
    }

    #[test]
    fn hides_when_close_to_ground() {
        let ground = GroundInfo {
            center: Vec2::ZERO,
            ground_height: 10.0,
        };
        let near_ground = Vec2::new(10.0 + ATMOSPHERE_HEIGHT + 1.75, 0.0);
        let mut body = DecorativeBody::new(vec![sprite(DrawLevel::FarDeco1)], near_ground, Vec2::ZERO, None, false, true);
        tick(&mut body, 0.0, Some(ground), &AllVisible);
        assert!((body.drawables()[0].tint.w - 0.5).abs() < 1e-5);

        let mut inside = DecorativeBody::new(vec![sprite(DrawLevel::FarDeco1)], Vec2::new(5.0, 0.0), Vec2::ZERO, None, false, true);
        tick(&mut inside, 0.0, Some(ground), &AllVisible);
        assert_eq!(inside.drawables()[0].tint.w, 0.0);
    }

    #[test]
    fn off_screen_drawables_keep_their_alpha() {
        let ground = GroundInfo {
            center: Vec2::ZERO,
            ground_height: 10.0,
        };
        let mut body = DecorativeBody::new(vec![sprite(DrawLevel::FarDeco1)], Vec2::new(5.0, 0.0), Vec2::ZERO, None, false, true);
        tick(&mut body, 0.0, Some(ground), &NothingVisible);
        assert_eq!(body.drawables()[0].tint.w, 0.8);
    }
}
