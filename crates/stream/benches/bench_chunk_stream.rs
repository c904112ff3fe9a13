use std::hint::black_box;
use std::time::Instant;

use farspace_common::SharedRemover;
use farspace_kernel::ObjectRegistry;
use farspace_stream::{
    ChunkCoord, ChunkManager, ContentGenerator, FillerConfig, SpaceFiller, StreamConfig,
};
use glam::Vec2;

fn noop() -> impl FnMut(&mut ObjectRegistry, ChunkCoord, SharedRemover, bool) {
    |_, _, _, _| {}
}

fn bench_flight<G: ContentGenerator>(label: &str, mut manager: ChunkManager<G>, steps: usize) {
    let mut registry = ObjectRegistry::new();
    let chunk_size = manager.config().chunk_size;

    let start = Instant::now();
    for i in 0..steps {
        // Cross a chunk boundary roughly every ten steps.
        let viewpoint = Vec2::new(i as f32 * chunk_size / 10.0, 0.0);
        let _ = black_box(manager.update(black_box(viewpoint), &mut registry));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / steps as u32;
    println!(
        "  {label} ({steps} steps, {} far objects): {per_iter:?}/step, total {elapsed:?}",
        registry.far_count()
    );
}

fn bench_idle(steps: usize) {
    let mut registry = ObjectRegistry::new();
    let Ok(mut manager) = ChunkManager::new(StreamConfig::default(), noop()) else {
        return;
    };
    manager.update(Vec2::ZERO, &mut registry);

    let start = Instant::now();
    for _ in 0..steps {
        let _ = black_box(manager.update(black_box(Vec2::new(1.0, 1.0)), &mut registry));
    }
    let elapsed = start.elapsed();
    println!(
        "  idle update ({steps} steps): {:?}/step, total {elapsed:?}",
        elapsed / steps as u32
    );
}

fn main() {
    println!("=== Chunk Stream Benchmarks ===\n");

    println!("Idle (no chunk change):");
    bench_idle(100_000);

    println!("\nFlight with empty generator:");
    for fill_radius in [1, 2, 4] {
        let config = StreamConfig {
            fill_radius,
            bg_fill_radius: fill_radius + 1,
            ..StreamConfig::default()
        };
        if let Ok(manager) = ChunkManager::new(config, noop()) {
            bench_flight(&format!("fill radius {fill_radius}"), manager, 10_000);
        }
    }

    println!("\nFlight with space filler:");
    let config = StreamConfig::default();
    let filler = SpaceFiller::new(FillerConfig::default(), config.chunk_size);
    if let Ok(manager) = ChunkManager::new(config, filler) {
        bench_flight("space filler", manager, 1_000);
    }

    println!("\n=== Done ===");
}
