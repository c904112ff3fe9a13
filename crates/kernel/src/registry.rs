use farspace_common::{EntityId, radius_of};
use glam::Vec2;
use std::collections::BTreeMap;

use crate::far::{BuildContext, FarObject, ObjectFactory};
use crate::object::{DrawableSlot, GroundInfo, NearObject, UpdateContext, VisibilityQuery, slots_of};
use crate::physics::PhysicsWorld;

/// Presence radii are recomputed from drawables this often (seconds).
pub const RADIUS_RECALC_PERIOD: f32 = 1.0;
/// Upper bound on object speed, used to pad stale presence radii.
pub const MAX_MOVE_SPEED: f32 = 8.0;
/// Far objects come back within `FAR_END_FACTOR * view_distance`.
pub const FAR_END_FACTOR: f32 = 1.5;
/// Near objects leave beyond `FAR_BEGIN_FACTOR * far_end`.
pub const FAR_BEGIN_FACTOR: f32 = 1.33;

/// Why a near object left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    /// Its remove controller, fade or own lifetime retired it.
    Retired,
    /// It moved out of range and now lives on as a far object.
    WentFar,
    /// It moved out of range but was ephemeral.
    Discarded,
    /// Explicit removal by gameplay code.
    Removed,
    /// Whole-registry teardown.
    Teardown,
}

/// An event record produced by every change to the registry's contents.
///
/// Near events carry the drawable slots so listeners can update side tables
/// after the object itself is gone.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    NearAdded {
        id: EntityId,
        slots: Vec<DrawableSlot>,
    },
    NearRemoved {
        id: EntityId,
        slots: Vec<DrawableSlot>,
        cause: RemovalCause,
    },
    FarAdded {
        id: EntityId,
    },
    /// A far object whose remove controller fired.
    FarDropped {
        id: EntityId,
    },
}

/// Frame inputs for [`ObjectRegistry::update`].
pub struct FrameContext<'a> {
    pub dt: f32,
    pub viewpoint: Vec2,
    pub view_distance: f32,
    pub physics: &'a mut dyn PhysicsWorld,
    pub factory: &'a ObjectFactory,
    pub ground: Option<GroundInfo>,
    pub visibility: &'a dyn VisibilityQuery,
}

struct NearEntry {
    object: Box<dyn NearObject>,
    radius: f32,
}

struct FarEntry {
    object: FarObject,
    depth: f32,
    delay: f32,
}

/// The canonical object list.
///
/// Every entity is either a near object or a far object under the same
/// [`EntityId`], never both. All mutations go through explicit operations
/// and are recorded in an append-only event log. BTreeMap storage keeps
/// iteration order deterministic.
pub struct ObjectRegistry {
    near: BTreeMap<EntityId, NearEntry>,
    far: BTreeMap<EntityId, FarEntry>,
    to_add: Vec<(EntityId, Box<dyn NearObject>)>,
    to_remove: Vec<(EntityId, RemovalCause)>,
    radius_recalc_await: f32,
    far_end_dist: f32,
    far_begin_dist: f32,
    tick: u64,
    event_log: Vec<RegistryEvent>,
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            near: BTreeMap::new(),
            far: BTreeMap::new(),
            to_add: Vec::new(),
            to_remove: Vec::new(),
            radius_recalc_await: 0.0,
            far_end_dist: 0.0,
            far_begin_dist: 0.0,
            tick: 0,
            event_log: Vec::new(),
        }
    }

    /// Number of completed updates.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn near_count(&self) -> usize {
        self.near.len()
    }

    pub fn far_count(&self) -> usize {
        self.far.len()
    }

    /// Near objects queued for addition at the next flush.
    pub fn pending_adds(&self) -> usize {
        self.to_add.len()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[RegistryEvent] {
        &self.event_log
    }

    pub fn get(&self, id: EntityId) -> Option<&dyn NearObject> {
        self.near.get(&id).map(|e| e.object.as_ref())
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut (dyn NearObject + 'static)> {
        self.near.get_mut(&id).map(|e| e.object.as_mut())
    }

    pub fn get_far(&self, id: EntityId) -> Option<&FarObject> {
        self.far.get(&id).map(|e| &e.object)
    }

    pub fn contains_near(&self, id: EntityId) -> bool {
        self.near.contains_key(&id)
    }

    pub fn contains_far(&self, id: EntityId) -> bool {
        self.far.contains_key(&id)
    }

    /// Near objects in id order.
    pub fn near_objects(&self) -> impl Iterator<Item = (EntityId, &dyn NearObject)> + '_ {
        self.near.iter().map(|(id, e)| (*id, e.object.as_ref()))
    }

    /// Far objects in id order.
    pub fn far_objects(&self) -> impl Iterator<Item = (EntityId, &FarObject)> + '_ {
        self.far.iter().map(|(id, e)| (*id, &e.object))
    }

    /// Drawable radius of a near object as of the last recomputation.
    pub fn radius(&self, id: EntityId) -> Option<f32> {
        self.near.get(&id).map(|e| e.radius)
    }

    /// Radius used for presence and visibility tests: the last computed
    /// radius padded by how far the object may have moved since.
    pub fn presence_radius(&self, id: EntityId) -> Option<f32> {
        let elapsed = RADIUS_RECALC_PERIOD - self.radius_recalc_await;
        self.radius(id).map(|r| r + MAX_MOVE_SPEED * elapsed)
    }

    /// Distance beyond which near objects convert to far.
    pub fn far_begin_dist(&self) -> f32 {
        self.far_begin_dist
    }

    /// Distance within which far objects convert to near.
    pub fn far_end_dist(&self) -> f32 {
        self.far_end_dist
    }

    /// Insert a near object immediately.
    pub fn add_now(&mut self, object: Box<dyn NearObject>) -> EntityId {
        let id = EntityId::new();
        self.insert_near(id, object);
        id
    }

    /// Queue a near object; it joins at the next flush. The id is reserved now.
    pub fn add_delayed(&mut self, object: Box<dyn NearObject>) -> EntityId {
        let id = EntityId::new();
        self.to_add.push((id, object));
        id
    }

    /// Queue a near object for removal at the next flush.
    pub fn remove(&mut self, id: EntityId) {
        self.remove_delayed(id, RemovalCause::Removed);
    }

    /// Insert a far object immediately.
    pub fn add_far_now(&mut self, object: FarObject) -> EntityId {
        let id = EntityId::new();
        self.insert_far(id, object);
        id
    }

    /// Whether no body-carrying object overlaps the circle at `pos`.
    pub fn is_place_empty(&self, pos: Vec2, radius: f32) -> bool {
        let near_clear = self.near.values().all(|e| match e.object.body_radius() {
            Some(r) => e.object.position().distance(pos) > r + radius,
            None => true,
        });
        let far_clear = self.far.values().all(|e| {
            !e.object.has_body() || e.object.position().distance(pos) > e.object.radius + radius
        });
        near_clear && far_clear
    }

    /// Make every far object re-check its distance on the next update.
    pub fn reset_delays(&mut self) {
        for entry in self.far.values_mut() {
            entry.delay = 0.0;
        }
    }

    /// Apply queued removals, then queued additions.
    pub fn flush(&mut self, physics: &mut dyn PhysicsWorld) {
        for (id, cause) in std::mem::take(&mut self.to_remove) {
            let Some(mut entry) = self.near.remove(&id) else {
                continue;
            };
            entry.object.on_remove(physics);
            let slots = slots_of(id, entry.object.drawables());
            tracing::debug!(id = %id.short(), ?cause, "near object removed");
            self.event_log.push(RegistryEvent::NearRemoved { id, slots, cause });
        }
        for (id, object) in std::mem::take(&mut self.to_add) {
            self.insert_near(id, object);
        }
    }

    /// One simulation tick: step physics, update near objects, retire or
    /// convert them, and bring far objects back into range.
    pub fn update(&mut self, ctx: &mut FrameContext<'_>) {
        let _span = tracing::info_span!("registry_update").entered();
        self.flush(ctx.physics);
        ctx.physics.step(ctx.dt);

        self.far_end_dist = FAR_END_FACTOR * ctx.view_distance;
        self.far_begin_dist = FAR_BEGIN_FACTOR * self.far_end_dist;

        let recalc_radius = if self.radius_recalc_await > 0.0 {
            self.radius_recalc_await -= ctx.dt;
            false
        } else {
            self.radius_recalc_await = RADIUS_RECALC_PERIOD;
            true
        };

        self.update_near(ctx, recalc_radius);
        self.update_far(ctx);
        self.flush(ctx.physics);
        self.tick += 1;

        tracing::trace!(
            tick = self.tick,
            near = self.near.len(),
            far = self.far.len(),
            "registry update complete"
        );
    }

    fn update_near(&mut self, ctx: &mut FrameContext<'_>, recalc_radius: bool) {
        let mut went_far = Vec::new();
        for (id, entry) in self.near.iter_mut() {
            let mut obj_ctx = UpdateContext {
                entity: *id,
                dt: ctx.dt,
                physics: &mut *ctx.physics,
                ground: ctx.ground,
                visibility: ctx.visibility,
            };
            entry.object.update(&mut obj_ctx);
            for drawable in entry.object.drawables_mut() {
                drawable.update(ctx.dt);
            }

            if entry.object.should_be_removed() {
                self.to_remove.push((*id, RemovalCause::Retired));
                continue;
            }
            let elapsed = RADIUS_RECALC_PERIOD - self.radius_recalc_await;
            if is_far(entry, ctx.viewpoint, elapsed, self.far_begin_dist) {
                match entry.object.to_far() {
                    Some(far) => {
                        went_far.push((*id, far));
                        self.to_remove.push((*id, RemovalCause::WentFar));
                    }
                    None => self.to_remove.push((*id, RemovalCause::Discarded)),
                }
                continue;
            }
            if recalc_radius {
                entry.radius = radius_of(entry.object.drawables());
            }
        }
        for (id, far) in went_far {
            self.insert_far(id, far);
        }
    }

    fn update_far(&mut self, ctx: &mut FrameContext<'_>) {
        let mut occupied: Vec<(Vec2, f32)> = self
            .near
            .values()
            .filter_map(|e| e.object.body_radius().map(|r| (e.object.position(), r)))
            .collect();

        let mut dropped = Vec::new();
        let mut coming_near = Vec::new();
        for (id, entry) in self.far.iter_mut() {
            if entry.object.should_be_removed() {
                dropped.push(*id);
                continue;
            }
            if is_near(entry, ctx.viewpoint, ctx.dt, self.far_end_dist) {
                coming_near.push(*id);
            }
        }

        for id in dropped {
            self.far.remove(&id);
            tracing::debug!(id = %id.short(), "far object dropped");
            self.event_log.push(RegistryEvent::FarDropped { id });
        }

        for id in coming_near {
            let Some(entry) = self.far.remove(&id) else {
                continue;
            };
            let tag = entry.object.tag();
            let mut build_ctx = BuildContext {
                physics: &mut *ctx.physics,
                occupied: &occupied,
            };
            match ctx.factory.build(entry.object, &mut build_ctx) {
                Ok(object) => {
                    if let Some(r) = object.body_radius() {
                        occupied.push((object.position(), r));
                    }
                    tracing::debug!(id = %id.short(), ?tag, "far object came near");
                    self.to_add.push((id, object));
                }
                Err(err) => {
                    tracing::error!(id = %id.short(), %err, "could not rebuild far object");
                }
            }
        }
    }

    /// Release every object and its physics bodies. Emits removal events so
    /// side tables can be cleared too.
    pub fn clear(&mut self, physics: &mut dyn PhysicsWorld) {
        self.to_remove.clear();
        for (_, mut object) in std::mem::take(&mut self.to_add) {
            object.on_remove(physics);
        }
        for (id, mut entry) in std::mem::take(&mut self.near) {
            entry.object.on_remove(physics);
            let slots = slots_of(id, entry.object.drawables());
            self.event_log.push(RegistryEvent::NearRemoved {
                id,
                slots,
                cause: RemovalCause::Teardown,
            });
        }
        for id in std::mem::take(&mut self.far).into_keys() {
            self.event_log.push(RegistryEvent::FarDropped { id });
        }
        tracing::debug!("registry cleared");
    }

    fn insert_near(&mut self, id: EntityId, object: Box<dyn NearObject>) {
        if self.near.contains_key(&id) {
            tracing::warn!(id = %id.short(), "near object added twice, ignoring");
            return;
        }
        let slots = slots_of(id, object.drawables());
        let radius = radius_of(object.drawables());
        self.near.insert(id, NearEntry { object, radius });
        self.event_log.push(RegistryEvent::NearAdded { id, slots });
    }

    fn insert_far(&mut self, id: EntityId, object: FarObject) {
        let depth = object.depth();
        self.far.insert(
            id,
            FarEntry {
                object,
                depth,
                delay: 0.0,
            },
        );
        self.event_log.push(RegistryEvent::FarAdded { id });
    }

    fn remove_delayed(&mut self, id: EntityId, cause: RemovalCause) {
        if self.to_remove.iter().any(|(queued, _)| *queued == id) {
            return;
        }
        self.to_remove.push((id, cause));
    }
}

fn is_far(entry: &NearEntry, viewpoint: Vec2, elapsed: f32, far_begin_dist: f32) -> bool {
    let mut r = entry.radius + MAX_MOVE_SPEED * elapsed;
    if let Some(first) = entry.object.drawables().first() {
        r *= first.level().depth();
    }
    let dst = entry.object.position().distance(viewpoint) - r;
    far_begin_dist < dst
}

/// Whether a far object is close enough to come back. Objects still out of
/// range wait until they could possibly have closed the gap.
fn is_near(entry: &mut FarEntry, viewpoint: Vec2, dt: f32, far_end_dist: f32) -> bool {
    if entry.delay > 0.0 {
        entry.delay -= dt;
        return false;
    }
    let r = entry.object.radius * entry.depth;
    let dst = entry.object.position().distance(viewpoint) - r;
    if dst < far_end_dist {
        return true;
    }
    entry.delay = (dst - far_end_dist) / (2.0 * MAX_MOVE_SPEED);
    false
}
