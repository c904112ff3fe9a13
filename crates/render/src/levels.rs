use std::collections::HashSet;

use farspace_common::{DrawLevel, Drawable, EntityId, TextureId};
use farspace_kernel::{
    DrawableKey, DrawableSlot, NearObject, ObjectRegistry, RegistryEvent, VisibilityQuery,
    slots_of,
};
use glam::Vec2;

use crate::camera::Camera;
use crate::sink::{DrawCommand, DrawSink};

/// Per-level depth factor, read from [`DrawLevel::depth`]. Scales both the
/// view distance used for culling and the parallax applied when drawing.
/// Sprite sizes and near/far hysteresis read the same factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthTable {
    factors: [f32; DrawLevel::COUNT],
}

impl Default for DepthTable {
    fn default() -> Self {
        Self {
            factors: DrawLevel::ALL.map(DrawLevel::depth),
        }
    }
}

impl DepthTable {
    pub fn get(&self, level: DrawLevel) -> f32 {
        self.factors[level.index()]
    }
}

/// Whether a circle at `pos` with radius `r` can be seen from `cam` given
/// `view_distance`. Exactly on the boundary counts as outside.
pub fn in_view(cam: Vec2, pos: Vec2, view_distance: f32, r: f32) -> bool {
    cam.distance(pos) - view_distance < r
}

/// Texture buckets of one level, kept in first-insertion order.
#[derive(Debug, Default)]
struct LevelBuckets {
    buckets: Vec<(TextureId, Vec<DrawableKey>)>,
    members: HashSet<DrawableKey>,
}

impl LevelBuckets {
    fn insert(&mut self, texture: TextureId, key: DrawableKey) -> bool {
        if !self.members.insert(key) {
            return false;
        }
        let bucket = match self.buckets.iter_mut().position(|(t, _)| *t == texture) {
            Some(i) => &mut self.buckets[i].1,
            None => {
                self.buckets.push((texture, Vec::new()));
                let last = self.buckets.len() - 1;
                &mut self.buckets[last].1
            }
        };
        bucket.push(key);
        true
    }

    fn remove(&mut self, texture: TextureId, key: DrawableKey) -> bool {
        if !self.members.remove(&key) {
            return false;
        }
        let Some((_, bucket)) = self.buckets.iter_mut().find(|(t, _)| *t == texture) else {
            return false;
        };
        let Some(i) = bucket.iter().position(|k| *k == key) else {
            return false;
        };
        bucket.remove(i);
        true
    }

    fn len(&self) -> usize {
        self.members.len()
    }
}

/// Statistics from one draw pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub levels_drawn: usize,
    pub sprites: usize,
    pub textures_bound: usize,
}

/// Side table of every registered drawable by level and texture, plus the
/// set currently in view. Holds keys only; the drawables stay with their
/// owners in the registry.
#[derive(Debug)]
pub struct DrawLevelManager {
    levels: Vec<LevelBuckets>,
    in_cam: HashSet<DrawableKey>,
    depths: DepthTable,
}

impl Default for DrawLevelManager {
    fn default() -> Self {
        Self::new(DepthTable::default())
    }
}

impl DrawLevelManager {
    pub fn new(depths: DepthTable) -> Self {
        Self {
            levels: DrawLevel::ALL.iter().map(|_| LevelBuckets::default()).collect(),
            in_cam: HashSet::new(),
            depths,
        }
    }

    pub fn depths(&self) -> &DepthTable {
        &self.depths
    }

    /// Register one drawable. Registering the same slot twice is a no-op.
    pub fn add_slot(&mut self, slot: DrawableSlot) {
        self.levels[slot.level.index()].insert(slot.texture, slot.key);
        self.in_cam.remove(&slot.key);
    }

    pub fn remove_slot(&mut self, slot: DrawableSlot) {
        self.levels[slot.level.index()].remove(slot.texture, slot.key);
        self.in_cam.remove(&slot.key);
    }

    pub fn add_all(&mut self, slots: &[DrawableSlot]) {
        for slot in slots {
            self.add_slot(*slot);
        }
    }

    pub fn remove_all(&mut self, slots: &[DrawableSlot]) {
        for slot in slots {
            self.remove_slot(*slot);
        }
    }

    pub fn object_added(&mut self, id: EntityId, drawables: &[Drawable]) {
        self.add_all(&slots_of(id, drawables));
    }

    pub fn object_removed(&mut self, id: EntityId, drawables: &[Drawable]) {
        self.remove_all(&slots_of(id, drawables));
    }

    /// Mirror registry membership changes. Far objects have no drawables on
    /// screen, so only near events matter.
    pub fn apply_events(&mut self, events: &[RegistryEvent]) {
        for event in events {
            match event {
                RegistryEvent::NearAdded { slots, .. } => self.add_all(slots),
                RegistryEvent::NearRemoved { slots, .. } => self.remove_all(slots),
                RegistryEvent::FarAdded { .. } | RegistryEvent::FarDropped { .. } => {}
            }
        }
    }

    /// Forget every drawable.
    pub fn clear(&mut self) {
        for level in &mut self.levels {
            *level = LevelBuckets::default();
        }
        self.in_cam.clear();
    }

    /// Recompute the visible set. Objects are tested first with their
    /// presence radius; only objects in view have their drawables tested.
    pub fn update(&mut self, registry: &ObjectRegistry, camera: &Camera) {
        let _span = tracing::info_span!("draw_update").entered();
        for (id, object) in registry.near_objects() {
            let drawables = object.drawables();
            let Some(first) = drawables.first() else {
                continue;
            };
            let view_distance = camera.view_distance * self.depths.get(first.level());
            let presence = registry.presence_radius(id).unwrap_or(0.0);
            let object_in_cam = in_view(camera.position, object.position(), view_distance, presence);

            for (i, drawable) in drawables.iter().enumerate() {
                let key = DrawableKey::new(id, i);
                if !object_in_cam || !drawable.is_enabled() {
                    self.in_cam.remove(&key);
                    continue;
                }
                let pos = drawable.world_pos(object.position(), object.angle());
                if in_view(camera.position, pos, view_distance, drawable.radius()) {
                    self.in_cam.insert(key);
                } else {
                    self.in_cam.remove(&key);
                }
            }
        }
        tracing::trace!(visible = self.in_cam.len(), "draw update complete");
    }

    /// Emit visible drawables level by level, texture bucket by texture
    /// bucket. Levels with nothing visible are skipped entirely.
    pub fn draw(
        &self,
        registry: &ObjectRegistry,
        camera: &Camera,
        sink: &mut dyn DrawSink,
    ) -> DrawStats {
        let _span = tracing::info_span!("draw").entered();
        let mut stats = DrawStats::default();
        sink.begin_frame(camera);

        for (level, buckets) in DrawLevel::ALL.iter().zip(&self.levels) {
            let any_visible = buckets
                .buckets
                .iter()
                .any(|(_, keys)| keys.iter().any(|k| self.in_cam.contains(k)));
            if !any_visible {
                continue;
            }
            stats.levels_drawn += 1;
            let depth = self.depths.get(*level);

            for (texture, keys) in &buckets.buckets {
                let mut bound = false;
                for key in keys {
                    if !self.in_cam.contains(key) {
                        continue;
                    }
                    let Some(owner) = registry.get(key.entity) else {
                        continue;
                    };
                    let Some(drawable) = owner.drawables().get(key.slot()) else {
                        continue;
                    };
                    if !bound {
                        bound = true;
                        stats.textures_bound += 1;
                    }
                    let pos = drawable.world_pos(owner.position(), owner.angle());
                    sink.sprite(&DrawCommand {
                        level: *level,
                        texture: *texture,
                        position: camera.parallax(pos, depth),
                        angle: drawable.world_angle(owner.angle()),
                        size: drawable.tex_size(),
                        origin: drawable.origin(),
                        tint: drawable.tint,
                        additive: drawable.is_additive(),
                    });
                    stats.sprites += 1;
                }
            }
        }

        sink.end_frame();
        tracing::trace!(
            levels = stats.levels_drawn,
            sprites = stats.sprites,
            textures = stats.textures_bound,
            "draw complete"
        );
        stats
    }

    pub fn is_in_cam(&self, key: DrawableKey) -> bool {
        self.in_cam.contains(&key)
    }

    pub fn visible_count(&self) -> usize {
        self.in_cam.len()
    }

    pub fn registered_count(&self) -> usize {
        self.levels.iter().map(LevelBuckets::len).sum()
    }

    /// Texture buckets of `level` in draw order.
    pub fn buckets(&self, level: DrawLevel) -> impl Iterator<Item = (TextureId, &[DrawableKey])> {
        self.levels[level.index()]
            .buckets
            .iter()
            .map(|(t, keys)| (*t, keys.as_slice()))
    }

    /// Every registered key with its level, in draw order.
    pub fn registered(&self) -> impl Iterator<Item = (DrawLevel, DrawableKey)> + '_ {
        DrawLevel::ALL.iter().zip(&self.levels).flat_map(|(level, buckets)| {
            buckets
                .buckets
                .iter()
                .flat_map(move |(_, keys)| keys.iter().map(move |k| (*level, *k)))
        })
    }

    /// Textures of visible drawables whose centre is within half their
    /// radius of `point`. Each texture is collected once.
    pub fn collect_visible_textures_near(
        &self,
        registry: &ObjectRegistry,
        point: Vec2,
        collector: &mut Vec<TextureId>,
    ) {
        for key in &self.in_cam {
            let Some(owner) = registry.get(key.entity) else {
                continue;
            };
            let Some(drawable) = owner.drawables().get(key.slot()) else {
                continue;
            };
            let pos = drawable.world_pos(owner.position(), owner.angle());
            if 0.5 * drawable.radius() < pos.distance(point) {
                continue;
            }
            if !collector.contains(&drawable.texture()) {
                collector.push(drawable.texture());
            }
        }
    }
}

impl VisibilityQuery for DrawLevelManager {
    fn is_in_cam(&self, key: DrawableKey) -> bool {
        DrawLevelManager::is_in_cam(self, key)
    }
}

/// World position and radius of a registered drawable, for overlays.
pub fn drawable_circle(owner: &dyn NearObject, key: DrawableKey) -> Option<(Vec2, f32)> {
    let drawable = owner.drawables().get(key.slot())?;
    Some((
        drawable.world_pos(owner.position(), owner.angle()),
        drawable.radius(),
    ))
}
