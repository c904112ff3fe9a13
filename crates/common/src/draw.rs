use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};

/// Opaque handle to a texture owned by the asset collaborator.
///
/// Drawables sharing a handle are batched together by the draw-level manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u32);

/// Ordered rendering pass, listed back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DrawLevel {
    Nebulae,
    Stars,
    FarDeco3,
    FarDeco2,
    FarDeco1,
    Atmosphere,
    PartBg,
    Ground,
    Deco,
    Projectiles,
    Bodies,
    Guns,
    PartFg0,
    PartFg1,
}

impl DrawLevel {
    pub const COUNT: usize = 14;

    /// Every level in back-to-front order.
    pub const ALL: [DrawLevel; Self::COUNT] = [
        DrawLevel::Nebulae,
        DrawLevel::Stars,
        DrawLevel::FarDeco3,
        DrawLevel::FarDeco2,
        DrawLevel::FarDeco1,
        DrawLevel::Atmosphere,
        DrawLevel::PartBg,
        DrawLevel::Ground,
        DrawLevel::Deco,
        DrawLevel::Projectiles,
        DrawLevel::Bodies,
        DrawLevel::Guns,
        DrawLevel::PartFg0,
        DrawLevel::PartFg1,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Parallax depth of the level. Everything in the simulated plane sits at
    /// 1; background layers are farther away and scroll slower.
    pub fn depth(self) -> f32 {
        match self {
            DrawLevel::Nebulae => 11.0,
            DrawLevel::Stars => 10.0,
            DrawLevel::FarDeco3 => 2.5,
            DrawLevel::FarDeco2 => 2.0,
            DrawLevel::FarDeco1 => 1.5,
            _ => 1.0,
        }
    }
}

/// A textured quad attached to an entity.
///
/// Position and angle are relative to the owning entity; world placement is
/// derived on demand from the owner's pose, so the drawable never holds a
/// reference back to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawable {
    texture: TextureId,
    level: DrawLevel,
    rel_pos: Vec2,
    pub rel_angle: f32,
    rot_speed: f32,
    size: f32,
    origin_perc: Vec2,
    tex_size: f32,
    radius: f32,
    pub tint: Vec4,
    base_alpha: f32,
    enabled: bool,
    additive: bool,
    linger: f32,
}

impl Drawable {
    /// A square sprite of world size `size`, centred on its origin.
    pub fn sprite(
        texture: TextureId,
        size: f32,
        rel_pos: Vec2,
        level: DrawLevel,
        rel_angle: f32,
        rot_speed: f32,
        tint: Vec4,
    ) -> Self {
        let mut drawable = Self {
            texture,
            level,
            rel_pos,
            rel_angle,
            rot_speed,
            size,
            origin_perc: Vec2::ZERO,
            tex_size: 0.0,
            radius: 0.0,
            tint,
            base_alpha: tint.w,
            enabled: true,
            additive: false,
            linger: 0.0,
        };
        drawable.set_size(size);
        drawable
    }

    /// Shift the rotation origin by a fraction of the sprite size.
    pub fn with_origin(mut self, origin_perc: Vec2) -> Self {
        self.origin_perc = origin_perc;
        self.set_size(self.size);
        self
    }

    pub fn additive(mut self) -> Self {
        self.additive = true;
        self
    }

    /// Keep the owner alive for `seconds` after it would otherwise be
    /// discarded (trailing particles and the like).
    pub fn lingering(mut self, seconds: f32) -> Self {
        self.linger = seconds;
        self
    }

    /// Resize; the on-screen size is divided by the level depth.
    pub fn set_size(&mut self, size: f32) {
        self.size = size;
        self.tex_size = size / self.level.depth();
        let rx = self.tex_size / 2.0 + self.tex_size * self.origin_perc.x.abs();
        let ry = self.tex_size / 2.0 + self.tex_size * self.origin_perc.y.abs();
        self.radius = (rx * rx + ry * ry).sqrt();
    }

    pub fn texture(&self) -> TextureId {
        self.texture
    }

    pub fn level(&self) -> DrawLevel {
        self.level
    }

    pub fn rel_pos(&self) -> Vec2 {
        self.rel_pos
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn tex_size(&self) -> f32 {
        self.tex_size
    }

    /// Pivot offset from the sprite centre, in world units.
    pub fn origin(&self) -> Vec2 {
        Vec2::splat(self.tex_size / 2.0) + self.origin_perc * self.tex_size
    }

    pub fn base_alpha(&self) -> f32 {
        self.base_alpha
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_additive(&self) -> bool {
        self.additive
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.tint.w = alpha;
    }

    /// World position given the owner's position and angle.
    pub fn world_pos(&self, base_pos: Vec2, base_angle: f32) -> Vec2 {
        base_pos + Vec2::from_angle(base_angle).rotate(self.rel_pos)
    }

    pub fn world_angle(&self, base_angle: f32) -> f32 {
        self.rel_angle + base_angle
    }

    /// Advance spin and linger timers.
    pub fn update(&mut self, dt: f32) {
        self.rel_angle += self.rot_speed * dt;
        if self.linger > 0.0 {
            self.linger -= dt;
        }
    }

    /// Whether the owner may be discarded without cutting this drawable short.
    pub fn ok_to_remove(&self) -> bool {
        self.linger <= 0.0
    }
}

/// Bounding radius of a group of drawables around their common origin.
pub fn radius_of(drawables: &[Drawable]) -> f32 {
    drawables
        .iter()
        .map(|d| d.rel_pos().length() + d.radius())
        .fold(0.0, f32::max)
}
