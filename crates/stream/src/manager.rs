use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::{Duration, Instant};

use farspace_common::{RemoveController, SharedRemover};
use farspace_kernel::ObjectRegistry;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::chunk::ChunkCoord;

/// Chunk streaming configuration. Remove radii are derived from the fill
/// radii so they always exceed them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Side length of a chunk in world units.
    pub chunk_size: f32,
    /// Foreground chunks within this Chebyshev radius are kept filled.
    pub fill_radius: i32,
    /// Background chunks within this Chebyshev radius are kept filled.
    pub bg_fill_radius: i32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: 20.0,
            fill_radius: 1,
            bg_fill_radius: 2,
        }
    }
}

impl StreamConfig {
    pub fn fill_radius(&self, layer: Layer) -> i32 {
        match layer {
            Layer::Foreground => self.fill_radius,
            Layer::Background => self.bg_fill_radius,
        }
    }

    pub fn remove_radius(&self, layer: Layer) -> i32 {
        match layer {
            Layer::Foreground => self.fill_radius + 2,
            Layer::Background => self.bg_fill_radius + 1,
        }
    }

    pub fn validate(&self) -> Result<(), StreamConfigError> {
        if !(self.chunk_size.is_finite() && self.chunk_size > 0.0) {
            return Err(StreamConfigError::ChunkSize(self.chunk_size));
        }
        for layer in Layer::ALL {
            let radius = self.fill_radius(layer);
            if radius < 0 {
                return Err(StreamConfigError::FillRadius { layer, radius });
            }
        }
        Ok(())
    }
}

/// Errors in [`StreamConfig`].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StreamConfigError {
    #[error("chunk size must be a positive finite number, got {0}")]
    ChunkSize(f32),
    #[error("{layer:?} fill radius must not be negative, got {radius}")]
    FillRadius { layer: Layer, radius: i32 },
}

/// The two independently streamed chunk layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    Foreground,
    Background,
}

impl Layer {
    pub const ALL: [Layer; 2] = [Layer::Foreground, Layer::Background];

    pub fn is_background(self) -> bool {
        self == Layer::Background
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Populates a newly activated chunk.
pub trait ContentGenerator {
    /// Called exactly once per chunk activation. Objects created here should
    /// carry `remover` so they retire when their chunk goes out of range.
    fn fill(
        &mut self,
        registry: &mut ObjectRegistry,
        chunk: ChunkCoord,
        remover: SharedRemover,
        background: bool,
    );
}

impl<F> ContentGenerator for F
where
    F: FnMut(&mut ObjectRegistry, ChunkCoord, SharedRemover, bool),
{
    fn fill(
        &mut self,
        registry: &mut ObjectRegistry,
        chunk: ChunkCoord,
        remover: SharedRemover,
        background: bool,
    ) {
        self(registry, chunk, remover, background)
    }
}

/// Fires for positions whose chunk is at or beyond `remove_radius` from the
/// viewpoint's current chunk. One per layer, shared by all its objects.
#[derive(Debug)]
pub struct ChunkRemover {
    current: Rc<Cell<ChunkCoord>>,
    chunk_size: f32,
    remove_radius: i32,
}

impl RemoveController for ChunkRemover {
    fn should_remove(&self, pos: Vec2) -> bool {
        ChunkCoord::of(pos, self.chunk_size).distance(self.current.get()) >= self.remove_radius
    }
}

/// Chunks gained and lost by one update, per layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkDelta {
    pub added: Vec<(Layer, ChunkCoord)>,
    pub removed: Vec<(Layer, ChunkCoord)>,
}

impl ChunkDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Per-frame streaming statistics for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub chunks_added_this_frame: usize,
    pub chunks_removed_this_frame: usize,
    pub active_foreground: usize,
    pub active_background: usize,
    pub frame_time: Duration,
}

struct LayerState {
    active: BTreeSet<ChunkCoord>,
    remover: SharedRemover,
    fill_radius: i32,
    remove_radius: i32,
}

/// Keeps the chunks around the viewpoint filled, one activation set per layer.
pub struct ChunkManager<G> {
    config: StreamConfig,
    generator: G,
    current: Rc<Cell<ChunkCoord>>,
    started: bool,
    layers: [LayerState; 2],
    stats: StreamStats,
}

impl<G: ContentGenerator> ChunkManager<G> {
    pub fn new(config: StreamConfig, generator: G) -> Result<Self, StreamConfigError> {
        config.validate()?;
        let current = Rc::new(Cell::new(ChunkCoord::default()));
        let layers = Layer::ALL.map(|layer| {
            let remove_radius = config.remove_radius(layer);
            let remover: SharedRemover = Rc::new(ChunkRemover {
                current: Rc::clone(&current),
                chunk_size: config.chunk_size,
                remove_radius,
            });
            LayerState {
                active: BTreeSet::new(),
                remover,
                fill_radius: config.fill_radius(layer),
                remove_radius,
            }
        });
        Ok(Self {
            config,
            generator,
            current,
            started: false,
            layers,
            stats: StreamStats::default(),
        })
    }

    /// Bring both layers up to date with the viewpoint. Does nothing unless
    /// the viewpoint's chunk changed since the previous call; the first call
    /// always counts as a change.
    pub fn update(&mut self, viewpoint: Vec2, registry: &mut ObjectRegistry) -> ChunkDelta {
        let _span = tracing::info_span!("chunk_update").entered();
        let frame_start = Instant::now();
        let coord = ChunkCoord::of(viewpoint, self.config.chunk_size);
        let mut delta = ChunkDelta::default();

        if !self.started || coord != self.current.get() {
            self.started = true;
            self.current.set(coord);

            for (layer, state) in Layer::ALL.into_iter().zip(self.layers.iter_mut()) {
                let remove_radius = state.remove_radius;
                state.active.retain(|chunk| {
                    let keep = chunk.distance(coord) < remove_radius;
                    if !keep {
                        tracing::debug!(?layer, ?chunk, "unfilling chunk");
                        delta.removed.push((layer, *chunk));
                    }
                    keep
                });
            }

            for (layer, state) in Layer::ALL.into_iter().zip(self.layers.iter_mut()) {
                for chunk in coord.square(state.fill_radius) {
                    if !state.active.insert(chunk) {
                        continue;
                    }
                    tracing::debug!(?layer, ?chunk, "filling chunk");
                    self.generator.fill(
                        registry,
                        chunk,
                        Rc::clone(&state.remover),
                        layer.is_background(),
                    );
                    delta.added.push((layer, chunk));
                }
            }
        }

        self.stats = StreamStats {
            chunks_added_this_frame: delta.added.len(),
            chunks_removed_this_frame: delta.removed.len(),
            active_foreground: self.layers[Layer::Foreground.index()].active.len(),
            active_background: self.layers[Layer::Background.index()].active.len(),
            frame_time: frame_start.elapsed(),
        };

        tracing::trace!(
            added = delta.added.len(),
            removed = delta.removed.len(),
            foreground = self.stats.active_foreground,
            background = self.stats.active_background,
            "chunk update complete"
        );

        delta
    }

    /// Whether the chunk containing `pos` is at least `distance` chunks from
    /// the current one.
    pub fn is_inactive(&self, pos: Vec2, distance: i32) -> bool {
        ChunkCoord::of(pos, self.config.chunk_size).distance(self.current.get()) >= distance
    }

    pub fn current_chunk(&self) -> ChunkCoord {
        self.current.get()
    }

    pub fn active(&self, layer: Layer) -> &BTreeSet<ChunkCoord> {
        &self.layers[layer.index()].active
    }

    pub fn is_active(&self, layer: Layer, chunk: ChunkCoord) -> bool {
        self.layers[layer.index()].active.contains(&chunk)
    }

    /// The remove controller shared by every object of `layer`.
    pub fn remover(&self, layer: Layer) -> SharedRemover {
        Rc::clone(&self.layers[layer.index()].remover)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut G {
        &mut self.generator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    type Calls = Rc<RefCell<Vec<(ChunkCoord, bool)>>>;

    fn recording(calls: &Calls) -> impl FnMut(&mut ObjectRegistry, ChunkCoord, SharedRemover, bool) {
        let calls = Rc::clone(calls);
        move |_: &mut ObjectRegistry, chunk: ChunkCoord, _: SharedRemover, background: bool| {
            calls.borrow_mut().push((chunk, background));
        }
    }

    fn noop() -> impl FnMut(&mut ObjectRegistry, ChunkCoord, SharedRemover, bool) {
        |_, _, _, _| {}
    }

    fn small_config() -> StreamConfig {
        StreamConfig {
            chunk_size: 10.0,
            fill_radius: 1,
            bg_fill_radius: 2,
        }
    }

    fn foreground(calls: &Calls) -> Vec<ChunkCoord> {
        calls.borrow().iter().filter(|(_, bg)| !bg).map(|(c, _)| *c).collect()
    }

    #[test]
    fn stream_config_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.chunk_size, 20.0);
        assert_eq!(config.remove_radius(Layer::Foreground), 3);
        assert_eq!(config.remove_radius(Layer::Background), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_config_fails_fast() {
        let bad_size = StreamConfig {
            chunk_size: 0.0,
            ..StreamConfig::default()
        };
        assert!(matches!(
            ChunkManager::new(bad_size, noop()).err(),
            Some(StreamConfigError::ChunkSize(_))
        ));

        let bad_radius = StreamConfig {
            bg_fill_radius: -1,
            ..StreamConfig::default()
        };
        assert_eq!(
            bad_radius.validate(),
            Err(StreamConfigError::FillRadius {
                layer: Layer::Background,
                radius: -1
            })
        );
    }

    #[test]
    fn first_update_fills_nine_foreground_chunks() {
        let calls = Calls::default();
        let mut registry = ObjectRegistry::new();
        let mut manager = ChunkManager::new(small_config(), recording(&calls)).unwrap();

        manager.update(Vec2::ZERO, &mut registry);

        let fg = foreground(&calls);
        assert_eq!(fg.len(), 9);
        assert_eq!(fg[0], ChunkCoord::new(0, 0));
        assert_eq!(manager.active(Layer::Foreground).len(), 9);
        assert_eq!(manager.active(Layer::Background).len(), 25);
        for chunk in ChunkCoord::new(0, 0).square(1) {
            assert!(manager.is_active(Layer::Foreground, chunk));
        }
    }

    #[test]
    fn moving_one_chunk_fills_the_new_column() {
        let calls = Calls::default();
        let mut registry = ObjectRegistry::new();
        let mut manager = ChunkManager::new(small_config(), recording(&calls)).unwrap();

        manager.update(Vec2::ZERO, &mut registry);
        calls.borrow_mut().clear();
        let delta = manager.update(Vec2::new(10.0, 0.0), &mut registry);

        let fg = foreground(&calls);
        assert_eq!(fg.len(), 3);
        assert!(fg.iter().all(|c| c.x == 2));
        // Foreground column x = -1 is only two chunks away; background x = -2 is three.
        assert!(delta.removed.iter().all(|(l, c)| *l == Layer::Background && c.x == -2));
        assert_eq!(delta.removed.len(), 5);
        for chunk in ChunkCoord::new(1, 0).square(1) {
            assert!(manager.is_active(Layer::Foreground, chunk));
        }
    }

    #[test]
    fn chunks_at_remove_radius_are_dropped() {
        let calls = Calls::default();
        let mut registry = ObjectRegistry::new();
        let mut manager = ChunkManager::new(small_config(), recording(&calls)).unwrap();

        manager.update(Vec2::ZERO, &mut registry);
        manager.update(Vec2::new(10.0, 0.0), &mut registry);
        let delta = manager.update(Vec2::new(20.0, 0.0), &mut registry);

        let current = ChunkCoord::new(2, 0);
        let dropped_fg: Vec<_> = delta
            .removed
            .iter()
            .filter(|(l, _)| *l == Layer::Foreground)
            .map(|(_, c)| *c)
            .collect();
        assert_eq!(dropped_fg.len(), 3);
        assert!(dropped_fg.iter().all(|c| c.x == -1));
        for layer in Layer::ALL {
            let remove = manager.config().remove_radius(layer);
            let fill = manager.config().fill_radius(layer);
            assert!(manager.active(layer).iter().all(|c| c.distance(current) < remove));
            for chunk in current.square(fill) {
                assert!(manager.is_active(layer, chunk));
            }
        }
    }

    #[test]
    fn unchanged_chunk_is_idempotent() {
        let calls = Calls::default();
        let mut registry = ObjectRegistry::new();
        let mut manager = ChunkManager::new(small_config(), recording(&calls)).unwrap();

        manager.update(Vec2::new(1.0, 1.0), &mut registry);
        let filled = calls.borrow().len();
        let active = manager.active(Layer::Foreground).clone();

        for pos in [Vec2::new(2.0, 3.0), Vec2::new(9.9, 9.9), Vec2::ZERO] {
            let delta = manager.update(pos, &mut registry);
            assert!(delta.is_empty());
        }
        assert_eq!(calls.borrow().len(), filled);
        assert_eq!(manager.active(Layer::Foreground), &active);
        assert_eq!(manager.stats().chunks_added_this_frame, 0);
    }

    #[test]
    fn returning_viewpoint_does_not_refill_active_chunks() {
        let calls = Calls::default();
        let mut registry = ObjectRegistry::new();
        let mut manager = ChunkManager::new(small_config(), recording(&calls)).unwrap();

        manager.update(Vec2::ZERO, &mut registry);
        manager.update(Vec2::new(10.0, 0.0), &mut registry);
        calls.borrow_mut().clear();
        manager.update(Vec2::ZERO, &mut registry);

        // Column x = -1 was never dropped, so nothing in the foreground refills.
        assert!(foreground(&calls).is_empty());
    }

    #[test]
    fn negative_viewpoint_uses_floor() {
        let calls = Calls::default();
        let mut registry = ObjectRegistry::new();
        let mut manager = ChunkManager::new(small_config(), recording(&calls)).unwrap();

        manager.update(Vec2::new(-0.5, -0.5), &mut registry);
        assert_eq!(manager.current_chunk(), ChunkCoord::new(-1, -1));
        assert_eq!(foreground(&calls)[0], ChunkCoord::new(-1, -1));
    }

    #[test]
    fn remover_tracks_current_chunk() {
        let mut registry = ObjectRegistry::new();
        let mut manager = ChunkManager::new(small_config(), noop()).unwrap();
        manager.update(Vec2::ZERO, &mut registry);

        let remover = manager.remover(Layer::Foreground);
        let pos = Vec2::new(25.0, 0.0);
        assert!(!remover.should_remove(pos));

        manager.update(Vec2::new(-10.0, 0.0), &mut registry);
        assert!(remover.should_remove(pos));
        assert!(manager.is_inactive(pos, 3));
        assert!(!manager.is_inactive(Vec2::new(-5.0, 0.0), 1));
    }

    #[test]
    fn generator_sees_layer_remover_and_background_flag() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut registry = ObjectRegistry::new();
        let config = StreamConfig {
            chunk_size: 10.0,
            fill_radius: 0,
            bg_fill_radius: 0,
        };
        let mut manager = ChunkManager::new(
            config,
            move |_: &mut ObjectRegistry, _: ChunkCoord, remover: SharedRemover, background: bool| {
                // Background removers fire one chunk earlier.
                sink.borrow_mut().push((background, remover.should_remove(Vec2::new(15.0, 0.0))));
            },
        )
        .unwrap();
        manager.update(Vec2::ZERO, &mut registry);
        assert_eq!(&*seen.borrow(), &[(false, false), (true, true)]);
    }
}
