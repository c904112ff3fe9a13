use std::time::Instant;

use farspace_kernel::{
    FrameContext, GroundInfo, KinematicWorld, ObjectFactory, ObjectRegistry, PhysicsWorld,
};
use farspace_render::{Camera, DepthTable, DrawLevelManager, DrawSink, DrawStats};
use farspace_stream::{ChunkDelta, ChunkManager, ContentGenerator, FrameTimer, SpaceFiller};
use farspace_tools::{WorldInspector, WorldSummary, draw_bounds};
use glam::Vec2;

use crate::config::{ConfigError, SimConfig};

/// Frames kept by the step timer.
const TIMER_WINDOW: usize = 120;

/// What one fixed step changed.
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    pub tick: u64,
    pub chunks: ChunkDelta,
    pub near_count: usize,
    pub far_count: usize,
    pub visible: usize,
}

/// Owns every subsystem and runs them in a fixed order each step: chunk
/// streaming, object update with near/far conversion, visibility. Drawing is
/// a separate phase so several steps can share one rendered frame.
pub struct Simulation<G> {
    config: SimConfig,
    chunks: ChunkManager<G>,
    registry: ObjectRegistry,
    draw: DrawLevelManager,
    physics: Box<dyn PhysicsWorld>,
    factory: ObjectFactory,
    camera: Camera,
    ground: Option<GroundInfo>,
    accumulator: f64,
    timer: FrameTimer,
    last_draw: DrawStats,
    shut_down: bool,
}

impl Simulation<SpaceFiller> {
    /// A simulation populated by the default space filler.
    pub fn with_space_filler(config: SimConfig) -> Result<Self, ConfigError> {
        let filler = SpaceFiller::new(config.filler.clone(), config.stream.chunk_size);
        Self::new(config, filler)
    }
}

impl<G: ContentGenerator> Simulation<G> {
    pub fn new(config: SimConfig, generator: G) -> Result<Self, ConfigError> {
        config.validate()?;
        let chunks = ChunkManager::new(config.stream, generator)?;
        let camera = Camera::new(Vec2::ZERO, config.view_distance);
        tracing::info!(
            chunk_size = config.stream.chunk_size,
            view_distance = config.view_distance,
            tick_rate = config.tick_rate,
            "simulation created"
        );
        Ok(Self {
            config,
            chunks,
            registry: ObjectRegistry::new(),
            draw: DrawLevelManager::new(DepthTable::default()),
            physics: Box::new(KinematicWorld::new()),
            factory: ObjectFactory::standard(),
            camera,
            ground: None,
            accumulator: 0.0,
            timer: FrameTimer::new(TIMER_WINDOW),
            last_draw: DrawStats::default(),
            shut_down: false,
        })
    }

    /// Swap in another physics backend. Only valid before any body exists.
    pub fn with_physics(mut self, physics: Box<dyn PhysicsWorld>) -> Self {
        self.physics = physics;
        self
    }

    pub fn with_factory(mut self, factory: ObjectFactory) -> Self {
        self.factory = factory;
        self
    }

    /// One fixed step through the update phases.
    pub fn step(&mut self) -> StepReport {
        let started = Instant::now();
        let dt = self.config.tick_dt() as f32;

        let chunks = self.chunks.update(self.camera.position, &mut self.registry);

        let mut ctx = FrameContext {
            dt,
            viewpoint: self.camera.position,
            view_distance: self.camera.view_distance,
            physics: self.physics.as_mut(),
            factory: &self.factory,
            ground: self.ground,
            visibility: &self.draw,
        };
        self.registry.update(&mut ctx);

        let events = self.registry.drain_events();
        self.draw.apply_events(&events);
        self.draw.update(&self.registry, &self.camera);

        self.timer.record(started.elapsed());
        StepReport {
            tick: self.registry.tick(),
            chunks,
            near_count: self.registry.near_count(),
            far_count: self.registry.far_count(),
            visible: self.draw.visible_count(),
        }
    }

    /// Draw the current visible set.
    pub fn render(&mut self, sink: &mut dyn DrawSink) -> DrawStats {
        self.last_draw = self.draw.draw(&self.registry, &self.camera, sink);
        self.last_draw
    }

    /// One step followed by one draw.
    pub fn tick(&mut self, sink: &mut dyn DrawSink) -> StepReport {
        let report = self.step();
        self.render(sink);
        report
    }

    /// Feed wall-clock time into the fixed-step accumulator, run as many
    /// steps as fit, then draw once. Returns the number of steps run.
    pub fn advance(&mut self, elapsed: f64, sink: &mut dyn DrawSink) -> usize {
        let tick_dt = self.config.tick_dt();
        self.accumulator += elapsed;
        let mut steps = 0;
        while self.accumulator >= tick_dt {
            self.accumulator -= tick_dt;
            self.step();
            steps += 1;
        }
        self.render(sink);
        steps
    }

    /// Outline every registered drawable, coloured by visibility.
    pub fn draw_debug(&self, sink: &mut dyn DrawSink) -> usize {
        draw_bounds(&self.draw, &self.registry, sink)
    }

    pub fn summary(&self) -> WorldSummary {
        WorldInspector::summary(&self.registry, &self.draw, self.chunks.stats())
    }
}

impl<G> Simulation<G> {
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Move the viewpoint smoothly; far objects keep their re-check delays.
    pub fn set_viewpoint(&mut self, position: Vec2) {
        self.camera.position = position;
    }

    /// Jump the viewpoint. Far objects re-check their distance next step
    /// instead of waiting out delays computed for the old position.
    pub fn teleport(&mut self, position: Vec2) {
        self.camera.position = position;
        self.registry.reset_delays();
        tracing::debug!(x = position.x, y = position.y, "viewpoint teleported");
    }

    pub fn set_ground(&mut self, ground: Option<GroundInfo>) {
        self.ground = ground;
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ObjectRegistry {
        &mut self.registry
    }

    pub fn draw_manager(&self) -> &DrawLevelManager {
        &self.draw
    }

    pub fn chunks(&self) -> &ChunkManager<G> {
        &self.chunks
    }

    pub fn physics(&self) -> &dyn PhysicsWorld {
        self.physics.as_ref()
    }

    pub fn physics_mut(&mut self) -> &mut dyn PhysicsWorld {
        self.physics.as_mut()
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    pub fn last_draw(&self) -> DrawStats {
        self.last_draw
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Release every object and physics body. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.registry.clear(self.physics.as_mut());
        self.registry.drain_events();
        self.draw.clear();
        self.shut_down = true;
        tracing::info!(
            bodies = self.physics.body_count(),
            "simulation shut down"
        );
    }
}

impl<G> Drop for Simulation<G> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
