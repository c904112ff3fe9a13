use std::f32::consts::PI;

use farspace_common::{DrawLevel, Drawable, Kinematics, SharedRemover, TextureId, Vec4};
use farspace_kernel::{FarKind, FarObject, ObjectRegistry};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::chunk::ChunkCoord;
use crate::manager::ContentGenerator;

const DUST_SIZE: f32 = 0.02;
/// Upper bound on specks in one dust cloud, whatever the chunk size.
pub const MAX_DUST_SPECKS: usize = 4096;
const JUNK_MAX_SIZE: f32 = 0.3;
const JUNK_MAX_ROT_SPEED: f32 = 45.0;
const JUNK_MAX_SPEED: f32 = 0.3;
const FAR_JUNK_MAX_SIZE: f32 = 2.0;
const FAR_JUNK_MAX_ROT_SPEED: f32 = 10.0;
const ASTEROID_MIN_SIZE: f32 = 0.5;
const ASTEROID_MAX_SIZE: f32 = 1.2;
const ASTEROID_SPEED: f32 = 0.2;
const FREE_POS_TRIES: usize = 100;

const LIGHT_GRAY: Vec4 = Vec4::new(0.75, 0.75, 0.75, 1.0);
const DARK_GRAY: Vec4 = Vec4::new(0.25, 0.25, 0.25, 1.0);

/// What to report when an asteroid texture has no collision shape. The
/// policy only controls logging: every asteroid body is a circle, so shaped
/// and unshaped textures produce the same body. Substitutions are always
/// counted in [`FillStats::shape_substitutions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingShapePolicy {
    Warn,
    Silent,
}

impl Default for MissingShapePolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            MissingShapePolicy::Warn
        } else {
            MissingShapePolicy::Silent
        }
    }
}

/// Densities are objects per square world unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillerConfig {
    pub seed: u64,
    pub dust_density: f32,
    pub junk_density: f32,
    pub far_junk_density: f32,
    pub asteroid_density: f32,
    pub dust_texture: TextureId,
    pub junk_textures: Vec<TextureId>,
    pub far_junk_textures: Vec<TextureId>,
    pub asteroid_textures: Vec<TextureId>,
    /// Asteroid textures with a collision shape definition.
    pub shaped_textures: Vec<TextureId>,
    pub missing_shape: MissingShapePolicy,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            dust_density: 0.2,
            junk_density: 0.01,
            far_junk_density: 0.005,
            asteroid_density: 0.008,
            dust_texture: TextureId(1),
            junk_textures: vec![TextureId(10), TextureId(11), TextureId(12)],
            far_junk_textures: vec![TextureId(20), TextureId(21), TextureId(22)],
            asteroid_textures: vec![TextureId(30), TextureId(31), TextureId(32)],
            shaped_textures: vec![TextureId(30), TextureId(31), TextureId(32)],
            missing_shape: MissingShapePolicy::default(),
        }
    }
}

/// Running totals of what the filler produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillStats {
    pub chunks: usize,
    pub far_objects: usize,
    pub shape_substitutions: usize,
}

/// Default content generator: dust, drifting junk and asteroids in the
/// foreground, layered far junk in the background. Each chunk draws from
/// its own RNG so refilling a chunk reproduces its content.
pub struct SpaceFiller {
    config: FillerConfig,
    chunk_size: f32,
    stats: FillStats,
}

impl SpaceFiller {
    pub fn new(config: FillerConfig, chunk_size: f32) -> Self {
        Self {
            config,
            chunk_size,
            stats: FillStats::default(),
        }
    }

    pub fn config(&self) -> &FillerConfig {
        &self.config
    }

    pub fn stats(&self) -> FillStats {
        self.stats
    }

    /// Number of objects for `density`. Fractional amounts below one become
    /// a single object with that probability.
    fn entity_count(&self, density: f32, rng: &mut StdRng) -> usize {
        let amount = self.chunk_size * self.chunk_size * density;
        if amount >= 1.0 {
            return amount as usize;
        }
        usize::from(rng.random_bool(f64::from(amount.max(0.0))))
    }

    fn random_pos(&self, center: Vec2, rng: &mut StdRng) -> Vec2 {
        let half = self.chunk_size / 2.0;
        center + Vec2::new(spread(rng, half), spread(rng, half))
    }

    fn free_random_pos(
        &self,
        registry: &ObjectRegistry,
        center: Vec2,
        radius: f32,
        rng: &mut StdRng,
    ) -> Option<Vec2> {
        (0..FREE_POS_TRIES)
            .map(|_| self.random_pos(center, rng))
            .find(|pos| registry.is_place_empty(*pos, radius))
    }

    fn add(&mut self, registry: &mut ObjectRegistry, object: FarObject) {
        registry.add_far_now(object);
        self.stats.far_objects += 1;
    }

    fn fill_dust(
        &mut self,
        registry: &mut ObjectRegistry,
        center: Vec2,
        remover: &SharedRemover,
        rng: &mut StdRng,
    ) {
        let count = self
            .entity_count(self.config.dust_density, rng)
            .min(MAX_DUST_SPECKS);
        if count == 0 {
            return;
        }
        let drawables = (0..count)
            .map(|_| {
                let rel = self.random_pos(center, rng) - center;
                Drawable::sprite(
                    self.config.dust_texture,
                    DUST_SIZE,
                    rel,
                    DrawLevel::Deco,
                    0.0,
                    0.0,
                    Vec4::ONE,
                )
            })
            .collect();
        let dust = FarObject::decorative(drawables, center, Vec2::ZERO, Some(remover.clone()), true);
        self.add(registry, dust);
    }

    fn fill_junk(
        &mut self,
        registry: &mut ObjectRegistry,
        center: Vec2,
        remover: &SharedRemover,
        rng: &mut StdRng,
    ) {
        if self.config.junk_textures.is_empty() {
            return;
        }
        let count = self.entity_count(self.config.junk_density, rng);
        for _ in 0..count {
            let pos = self.random_pos(center, rng);
            let texture = pick(&self.config.junk_textures, rng);
            let size = rng.random_range(0.3..1.0) * JUNK_MAX_SIZE;
            let rot_speed = spread(rng, JUNK_MAX_ROT_SPEED.to_radians());
            let sprite = Drawable::sprite(
                texture,
                size,
                Vec2::ZERO,
                DrawLevel::Deco,
                spread(rng, PI),
                rot_speed,
                LIGHT_GRAY,
            );
            let velocity = Vec2::from_angle(spread(rng, PI)) * rng.random_range(0.0..JUNK_MAX_SPEED);
            let junk = FarObject::decorative(vec![sprite], pos, velocity, Some(remover.clone()), true);
            self.add(registry, junk);
        }
    }

    fn fill_far_junk(
        &mut self,
        registry: &mut ObjectRegistry,
        center: Vec2,
        remover: &SharedRemover,
        level: DrawLevel,
        rng: &mut StdRng,
    ) {
        if self.config.far_junk_textures.is_empty() {
            return;
        }
        let count = self.entity_count(self.config.far_junk_density, rng);
        if count == 0 {
            return;
        }
        let drawables = (0..count)
            .map(|_| {
                let texture = pick(&self.config.far_junk_textures, rng);
                let size = rng.random_range(0.3..1.0) * FAR_JUNK_MAX_SIZE;
                let rot_speed = spread(rng, FAR_JUNK_MAX_ROT_SPEED.to_radians());
                let rel = self.random_pos(center, rng) - center;
                Drawable::sprite(texture, size, rel, level, spread(rng, PI), rot_speed, DARK_GRAY)
            })
            .collect();
        let junk = FarObject::decorative(drawables, center, Vec2::ZERO, Some(remover.clone()), true);
        self.add(registry, junk);
    }

    fn fill_asteroids(
        &mut self,
        registry: &mut ObjectRegistry,
        center: Vec2,
        remover: &SharedRemover,
        rng: &mut StdRng,
    ) {
        if self.config.asteroid_textures.is_empty() {
            return;
        }
        let count = self.entity_count(self.config.asteroid_density, rng);
        for _ in 0..count {
            let size = rng.random_range(ASTEROID_MIN_SIZE..ASTEROID_MAX_SIZE);
            let Some(pos) = self.free_random_pos(registry, center, size, rng) else {
                continue;
            };
            let texture = pick(&self.config.asteroid_textures, rng);
            if !self.config.shaped_textures.contains(&texture) {
                self.stats.shape_substitutions += 1;
                if self.config.missing_shape == MissingShapePolicy::Warn {
                    tracing::warn!(?texture, "no collision shape for asteroid texture, using a circle");
                }
            }
            let kinematics = Kinematics::at(pos)
                .with_velocity(Vec2::from_angle(spread(rng, PI)) * ASTEROID_SPEED)
                .with_angle(spread(rng, PI));
            let asteroid = FarObject::new(
                kinematics,
                size,
                FarKind::Asteroid { texture, size },
                Some(remover.clone()),
            );
            self.add(registry, asteroid);
        }
    }
}

impl ContentGenerator for SpaceFiller {
    fn fill(
        &mut self,
        registry: &mut ObjectRegistry,
        chunk: ChunkCoord,
        remover: SharedRemover,
        background: bool,
    ) {
        let center = chunk.center(self.chunk_size);
        let mut rng = StdRng::seed_from_u64(chunk_seed(self.config.seed, chunk, background));
        let before = self.stats.far_objects;

        if background {
            for level in [DrawLevel::FarDeco3, DrawLevel::FarDeco2, DrawLevel::FarDeco1] {
                self.fill_far_junk(registry, center, &remover, level, &mut rng);
            }
        } else {
            self.fill_dust(registry, center, &remover, &mut rng);
            self.fill_junk(registry, center, &remover, &mut rng);
            self.fill_asteroids(registry, center, &remover, &mut rng);
        }

        self.stats.chunks += 1;
        tracing::trace!(
            ?chunk,
            background,
            objects = self.stats.far_objects - before,
            "chunk filled"
        );
    }
}

/// Uniform in `[-max, max)`, or zero when `max` is not positive.
fn spread(rng: &mut StdRng, max: f32) -> f32 {
    if max > 0.0 {
        rng.random_range(-max..max)
    } else {
        0.0
    }
}

fn pick(textures: &[TextureId], rng: &mut StdRng) -> TextureId {
    textures[rng.random_range(0..textures.len())]
}

fn chunk_seed(seed: u64, chunk: ChunkCoord, background: bool) -> u64 {
    let mut state = splitmix64(seed);
    for part in [chunk.x as u32 as u64, chunk.y as u32 as u64, u64::from(background)] {
        state = splitmix64(state ^ part);
    }
    state
}

fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use farspace_common::NeverRemove;
    use std::rc::Rc;

    fn remover() -> SharedRemover {
        Rc::new(NeverRemove)
    }

    fn positions(registry: &ObjectRegistry) -> Vec<Vec2> {
        registry.far_objects().map(|(_, f)| f.position()).collect()
    }

    #[test]
    fn foreground_fill_creates_dust_cloud() {
        let mut filler = SpaceFiller::new(FillerConfig::default(), 20.0);
        let mut registry = ObjectRegistry::new();
        filler.fill(&mut registry, ChunkCoord::new(0, 0), remover(), false);

        let dust: Vec<_> = registry
            .far_objects()
            .filter(|(_, f)| match &f.kind {
                FarKind::Decorative { drawables, .. } => drawables.len() == 80,
                FarKind::Asteroid { .. } => false,
            })
            .collect();
        assert_eq!(dust.len(), 1);
        assert_eq!(dust[0].1.position(), Vec2::new(10.0, 10.0));
        assert!(filler.stats().far_objects >= 5);
    }

    #[test]
    fn dust_cloud_is_capped_on_huge_chunks() {
        let config = FillerConfig {
            junk_density: 0.0,
            asteroid_density: 0.0,
            ..FillerConfig::default()
        };
        let mut filler = SpaceFiller::new(config, 600.0);
        let mut registry = ObjectRegistry::new();
        filler.fill(&mut registry, ChunkCoord::new(0, 0), remover(), false);

        let largest = registry
            .far_objects()
            .filter_map(|(_, f)| match &f.kind {
                FarKind::Decorative { drawables, .. } => Some(drawables.len()),
                FarKind::Asteroid { .. } => None,
            })
            .max();
        assert_eq!(largest, Some(MAX_DUST_SPECKS));
    }

    #[test]
    fn background_fill_uses_far_deco_levels() {
        let config = FillerConfig {
            far_junk_density: 0.01,
            ..FillerConfig::default()
        };
        let mut filler = SpaceFiller::new(config, 20.0);
        let mut registry = ObjectRegistry::new();
        filler.fill(&mut registry, ChunkCoord::new(3, -2), remover(), true);

        let mut levels: Vec<DrawLevel> = registry
            .far_objects()
            .filter_map(|(_, f)| match &f.kind {
                FarKind::Decorative { drawables, .. } => Some(drawables[0].level()),
                FarKind::Asteroid { .. } => None,
            })
            .collect();
        levels.sort();
        assert_eq!(
            levels,
            vec![DrawLevel::FarDeco3, DrawLevel::FarDeco2, DrawLevel::FarDeco1]
        );
        assert!(registry.far_objects().all(|(_, f)| !f.has_body()));
    }

    #[test]
    fn refill_is_deterministic() {
        let chunk = ChunkCoord::new(-4, 7);
        let mut a = ObjectRegistry::new();
        let mut b = ObjectRegistry::new();
        SpaceFiller::new(FillerConfig::default(), 20.0).fill(&mut a, chunk, remover(), false);
        SpaceFiller::new(FillerConfig::default(), 20.0).fill(&mut b, chunk, remover(), false);

        let mut pa = positions(&a);
        let mut pb = positions(&b);
        pa.sort_by(|l, r| l.x.total_cmp(&r.x).then(l.y.total_cmp(&r.y)));
        pb.sort_by(|l, r| l.x.total_cmp(&r.x).then(l.y.total_cmp(&r.y)));
        assert_eq!(pa, pb);
    }

    #[test]
    fn content_stays_inside_chunk() {
        let chunk = ChunkCoord::new(2, 2);
        let mut filler = SpaceFiller::new(FillerConfig::default(), 20.0);
        let mut registry = ObjectRegistry::new();
        filler.fill(&mut registry, chunk, remover(), false);
        for pos in positions(&registry) {
            assert_eq!(ChunkCoord::of(pos, 20.0), chunk);
        }
    }

    #[test]
    fn fractional_counts_are_sampled() {
        let filler = SpaceFiller::new(FillerConfig::default(), 10.0);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(filler.entity_count(0.25, &mut rng), 25);
        assert_eq!(filler.entity_count(0.0, &mut rng), 0);
        assert_eq!(filler.entity_count(0.5, &mut rng), 50);
        let hits: usize = (0..1000).map(|_| filler.entity_count(0.005, &mut rng)).sum();
        assert!((350..650).contains(&hits));
    }

    #[test]
    fn occupied_chunk_gets_no_asteroids() {
        let config = FillerConfig {
            asteroid_density: 0.05,
            ..FillerConfig::default()
        };
        let mut filler = SpaceFiller::new(config, 20.0);
        let mut registry = ObjectRegistry::new();
        registry.add_far_now(FarObject::new(
            Kinematics::at(Vec2::new(10.0, 10.0)),
            50.0,
            FarKind::Asteroid {
                texture: TextureId(30),
                size: 50.0,
            },
            None,
        ));
        filler.fill(&mut registry, ChunkCoord::new(0, 0), remover(), false);
        let bodies = registry.far_objects().filter(|(_, f)| f.has_body()).count();
        assert_eq!(bodies, 1);
    }

    #[test]
    fn missing_shapes_are_substituted() {
        let config = FillerConfig {
            asteroid_density: 0.05,
            shaped_textures: Vec::new(),
            missing_shape: MissingShapePolicy::Silent,
            ..FillerConfig::default()
        };
        let mut filler = SpaceFiller::new(config, 20.0);
        let mut registry = ObjectRegistry::new();
        filler.fill(&mut registry, ChunkCoord::new(0, 0), remover(), false);

        let asteroids = registry.far_objects().filter(|(_, f)| f.has_body()).count();
        assert!(asteroids > 0);
        assert_eq!(filler.stats().shape_substitutions, asteroids);
    }

    #[test]
    fn shape_policy_only_changes_logging() {
        let asteroids_with = |missing_shape| {
            let config = FillerConfig {
                asteroid_density: 0.05,
                shaped_textures: Vec::new(),
                missing_shape,
                ..FillerConfig::default()
            };
            let mut filler = SpaceFiller::new(config, 20.0);
            let mut registry = ObjectRegistry::new();
            filler.fill(&mut registry, ChunkCoord::new(1, -1), remover(), false);
            let mut found: Vec<(f32, f32, f32)> = registry
                .far_objects()
                .filter_map(|(_, f)| match &f.kind {
                    FarKind::Asteroid { size, .. } => {
                        Some((f.position().x, f.position().y, *size))
                    }
                    FarKind::Decorative { .. } => None,
                })
                .collect();
            found.sort_by(|a, b| a.partial_cmp(b).unwrap());
            (found, filler.stats().shape_substitutions)
        };

        let warned = asteroids_with(MissingShapePolicy::Warn);
        let silent = asteroids_with(MissingShapePolicy::Silent);
        assert!(!warned.0.is_empty());
        assert_eq!(warned, silent);
    }

    #[test]
    fn filled_objects_carry_the_remover() {
        let mut filler = SpaceFiller::new(FillerConfig::default(), 20.0);
        let mut registry = ObjectRegistry::new();
        let everything: SharedRemover = Rc::new(|_: Vec2| true);
        filler.fill(&mut registry, ChunkCoord::new(0, 0), everything, false);
        assert!(registry.far_count() > 0);
        assert!(registry.far_objects().all(|(_, f)| f.should_be_removed()));
    }
}
