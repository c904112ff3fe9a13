use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use farspace_common::SharedRemover;
use farspace_kernel::ObjectRegistry;
use farspace_render::{RecordingSink, TextSink};
use farspace_sim::{SimConfig, Simulation};
use farspace_stream::{ChunkCoord, ChunkManager, Layer};
use glam::Vec2;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "farspace-cli", about = "CLI tool for farspace world streaming")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info
    Info,
    /// Fly the viewpoint in a straight line and report what streamed in
    Fly {
        /// Number of fixed steps to run
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// Heading in degrees, 0 is +x
        #[arg(long, default_value = "0")]
        heading: f32,
        /// Speed in world units per second
        #[arg(short, long, default_value = "5")]
        speed: f32,
        /// JSON config file; defaults are used for missing fields
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the draw commands of the final frame
        #[arg(long)]
        dump: bool,
        /// Include debug bounding circles in the dump
        #[arg(long)]
        bounds: bool,
    },
    /// List the active chunks around a point
    Chunks {
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        x: f32,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        y: f32,
        /// JSON config file for the chunk settings
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SimConfig> {
    match path {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(SimConfig::default()),
    }
}

fn fly(
    config: SimConfig,
    ticks: u64,
    heading: f32,
    speed: f32,
    dump: bool,
    bounds: bool,
) -> anyhow::Result<()> {
    let dt = config.tick_dt() as f32;
    let velocity = Vec2::from_angle(heading.to_radians()) * speed;
    let mut sim = Simulation::with_space_filler(config)?;
    let mut sink = RecordingSink::new();

    let mut chunks_added = 0;
    let mut chunks_removed = 0;
    let mut peak_near = 0;
    for _ in 0..ticks {
        let next = sim.camera().position + velocity * dt;
        sim.set_viewpoint(next);
        let report = sim.step();
        chunks_added += report.chunks.added.len();
        chunks_removed += report.chunks.removed.len();
        peak_near = peak_near.max(report.near_count);
    }
    let stats = sim.render(&mut sink);
    tracing::info!(ticks, chunks_added, chunks_removed, "flight finished");

    let pos = sim.camera().position;
    println!("Flight: {ticks} ticks, heading={heading:.0} deg, speed={speed:.1}");
    println!("Viewpoint: ({:.1}, {:.1})", pos.x, pos.y);
    println!("Chunks: +{chunks_added} -{chunks_removed}");
    println!("Peak near objects: {peak_near}");
    println!(
        "Last frame: {} levels, {} sprites, {} textures",
        stats.levels_drawn, stats.sprites, stats.textures_bound
    );
    println!(
        "Step time: avg={:?} max={:?}",
        sim.timer().average(),
        sim.timer().max()
    );
    println!("{}", sim.summary());

    if dump {
        let mut text = TextSink::new();
        sim.render(&mut text);
        if bounds {
            sim.draw_debug(&mut text);
        }
        print!("{}", text.output());
    }

    sim.shutdown();
    Ok(())
}

fn chunks(config: SimConfig, point: Vec2) -> anyhow::Result<()> {
    let noop = |_: &mut ObjectRegistry, _: ChunkCoord, _: SharedRemover, _: bool| {};
    let mut manager = ChunkManager::new(config.stream, noop)?;
    let mut registry = ObjectRegistry::new();
    manager.update(point, &mut registry);

    println!(
        "Point ({:.1}, {:.1}) is in chunk {:?}",
        point.x,
        point.y,
        manager.current_chunk()
    );
    for layer in Layer::ALL {
        let active = manager.active(layer);
        println!("{layer:?}: {} chunks", active.len());
        for chunk in active {
            let origin = chunk.origin(config.stream.chunk_size);
            println!("  ({}, {}) origin=({:.1}, {:.1})", chunk.x, chunk.y, origin.x, origin.y);
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("farspace-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", farspace_common::crate_info());
            println!("kernel: {}", farspace_kernel::crate_info());
            println!("stream: {}", farspace_stream::crate_info());
            println!("render: {}", farspace_render::crate_info());
            println!("tools: {}", farspace_tools::crate_info());
            println!("sim: {}", farspace_sim::crate_info());
        }
        Commands::Fly {
            ticks,
            heading,
            speed,
            config,
            dump,
            bounds,
        } => {
            let config = load_config(config.as_ref())?;
            fly(config, ticks, heading, speed, dump, bounds)?;
        }
        Commands::Chunks { x, y, config } => {
            let config = load_config(config.as_ref())?;
            chunks(config, Vec2::new(x, y))?;
        }
    }

    Ok(())
}
