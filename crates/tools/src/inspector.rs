use farspace_common::EntityId;
use farspace_kernel::{KindTag, ObjectRegistry};
use farspace_render::DrawLevelManager;
use farspace_stream::StreamStats;
use glam::Vec2;

/// Read-only queries against the simulation for debugging and the CLI.
pub struct WorldInspector;

impl WorldInspector {
    /// Produce a summary of the simulation state.
    pub fn summary(
        registry: &ObjectRegistry,
        draw: &DrawLevelManager,
        stream: &StreamStats,
    ) -> WorldSummary {
        WorldSummary {
            tick: registry.tick(),
            near_count: registry.near_count(),
            far_count: registry.far_count(),
            pending_events: registry.events().len(),
            registered_drawables: draw.registered_count(),
            visible_drawables: draw.visible_count(),
            active_foreground: stream.active_foreground,
            active_background: stream.active_background,
        }
    }

    /// Describe one entity in whichever representation it currently has.
    pub fn inspect_entity(registry: &ObjectRegistry, id: EntityId) -> Option<EntityInfo> {
        if let Some(object) = registry.get(id) {
            return Some(EntityInfo {
                id,
                representation: Representation::Near,
                kind: object.kind(),
                position: object.position(),
                velocity: object.velocity(),
                angle: object.angle(),
                drawables: object.drawables().len(),
                label: object.debug_label(),
            });
        }
        registry.get_far(id).map(|far| EntityInfo {
            id,
            representation: Representation::Far,
            kind: far.tag(),
            position: far.kinematics.position,
            velocity: far.kinematics.velocity,
            angle: far.kinematics.angle,
            drawables: 0,
            label: None,
        })
    }

    /// Near ids followed by far ids, each in id order.
    pub fn list_entities(registry: &ObjectRegistry) -> Vec<EntityId> {
        registry
            .near_objects()
            .map(|(id, _)| id)
            .chain(registry.far_objects().map(|(id, _)| id))
            .collect()
    }
}

/// Summary of simulation state for the inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldSummary {
    pub tick: u64,
    pub near_count: usize,
    pub far_count: usize,
    pub pending_events: usize,
    pub registered_drawables: usize,
    pub visible_drawables: usize,
    pub active_foreground: usize,
    pub active_background: usize,
}

impl std::fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "World: tick={} near={} far={} drawables={}/{} visible chunks={}+{} pending_events={}",
            self.tick,
            self.near_count,
            self.far_count,
            self.visible_drawables,
            self.registered_drawables,
            self.active_foreground,
            self.active_background,
            self.pending_events
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Near,
    Far,
}

/// Detailed info about a single entity.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub id: EntityId,
    pub representation: Representation,
    pub kind: KindTag,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub drawables: usize,
    pub label: Option<String>,
}

impl std::fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Entity [{}] {:?} {:?} pos=({:.2}, {:.2}) vel=({:.2}, {:.2}) drawables={}",
            self.id.short(),
            self.representation,
            self.kind,
            self.position.x,
            self.position.y,
            self.velocity.x,
            self.velocity.y,
            self.drawables,
        )?;
        if let Some(label) = &self.label {
            write!(f, " ({label})")?;
        }
        Ok(())
    }
}
