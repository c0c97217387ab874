mod run;

use clap::{Parser, Subcommand};
use glam::Vec3;
use std::path::PathBuf;
use std::time::Duration;
use tickpool_pool::{InstancePool, PoolDefinition, SpawnParams};
use tickpool_scheduler::{Frame, LoadMode, SceneLoadRequest, Scheduler, SimulatedLoader};
use tracing_subscriber::EnvFilter;

use crate::run::{Prop, RunFile};

#[derive(Parser)]
#[command(name = "tickpool-cli", about = "Instance pool and tick scheduler driver")]
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
    /// Drain a single pool, then return everything that was checked out
    Pool {
        /// Pre-allocated instances
        #[arg(short, long, default_value = "10")]
        size: usize,
        /// Checkout requests to make
        #[arg(long, default_value = "15")]
        spawns: usize,
        /// Grow the pool when it runs dry
        #[arg(short, long)]
        grow: bool,
    },
    /// Run a staged scene transition on the simulated loader
    Transition {
        /// Loader advances needed to stage the scene
        #[arg(short, long, default_value = "5")]
        load_ticks: u32,
        /// Minimum time between start and completion
        #[arg(short, long, default_value = "1000")]
        min_duration_ms: u64,
        /// Ticks per second
        #[arg(short, long, default_value = "60")]
        fps: u32,
    },
    /// Play a run file (pool manifest plus spawn schedule)
    Run {
        /// Path to the YAML run file
        file: PathBuf,
    },
}

#[derive(Default)]
struct Timeline {
    started: Option<Frame>,
    completed: Option<Frame>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tickpool-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", tickpool_common::crate_info());
            println!("pool: {}", tickpool_pool::crate_info());
            println!("scheduler: {}", tickpool_scheduler::crate_info());
            println!("audio: {}", tickpool_audio::crate_info());
            println!("runtime: {}", tickpool_runtime::crate_info());
        }
        Commands::Pool { size, spawns, grow } => {
            println!("Pool demo: size={size}, spawns={spawns}, grow={grow}");

            let mut pool = InstancePool::new([(
                PoolDefinition::new("Prop", size).confirm_not_poolable(),
                Prop::default(),
            )]);
            let mut held = Vec::new();
            let mut misses = 0usize;
            for i in 0..spawns {
                let mut params = SpawnParams::at(Vec3::new(i as f32, 0.0, 0.0));
                if grow {
                    params = params.growable();
                }
                match pool.checkout("Prop", params, &()) {
                    Some(instance) => held.push(instance),
                    None => misses += 1,
                }
            }
            println!("Hits: {}, misses: {misses}", held.len());

            let returned = held
                .into_iter()
                .map(|instance| pool.release(instance, &()))
                .filter(|released| *released)
                .count();
            println!("Returned: {returned}");
            for stats in pool.stats() {
                println!(
                    "{} ({}): idle={}, outstanding={}, created={}, grown={}",
                    stats.name, stats.key, stats.idle, stats.outstanding, stats.created, stats.grown
                );
            }
        }
        Commands::Transition {
            load_ticks,
            min_duration_ms,
            fps,
        } => {
            let min_duration = Duration::from_millis(min_duration_ms);
            let delta = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
            println!(
                "Transition demo: load_ticks={load_ticks}, min_duration={min_duration:?}, fps={fps}"
            );

            let mut loader = SimulatedLoader::new(load_ticks);
            let mut scheduler: Scheduler<Timeline> = Scheduler::new();
            let mut timeline = Timeline::default();
            scheduler.load_scene(
                &mut loader,
                SceneLoadRequest::new("Game", LoadMode::Single)
                    .on_start(|s: &mut Scheduler<Timeline>, t: &mut Timeline| {
                        t.started = Some(s.frame())
                    })
                    .min_duration(min_duration)
                    .on_complete(|s: &mut Scheduler<Timeline>, t: &mut Timeline| {
                        t.completed = Some(s.frame())
                    }),
            );

            // Enough ticks for the load plus the hold, with headroom.
            let hold_ticks = (min_duration.as_secs_f64() * f64::from(fps.max(1))).ceil() as u64;
            let limit = u64::from(load_ticks) + hold_ticks + 4;
            for _ in 0..limit {
                if timeline.completed.is_some() {
                    break;
                }
                loader.advance();
                scheduler.tick(&mut timeline, delta);
            }

            match (timeline.started, timeline.completed) {
                (Some(start), Some(done)) => {
                    println!("Started: tick={}, elapsed={:?}", start.tick, start.elapsed);
                    println!("Completed: tick={}, elapsed={:?}", done.tick, done.elapsed);
                    println!("Visible for: {:?}", done.elapsed - start.elapsed);
                    println!("Loaded scenes: {:?}", loader.loaded());
                }
                _ => anyhow::bail!("transition did not complete within {limit} ticks"),
            }
        }
        Commands::Run { file } => {
            let run = RunFile::load(&file)?;
            println!(
                "Run: {} ({} pools, {} ticks at {} fps)",
                file.display(),
                run.manifest.pools.len(),
                run.ticks,
                run.fps
            );

            let report = run::execute(&run)?;
            println!("Hits: {}, misses: {}", report.hits, report.misses);
            println!(
                "Events: spawned={}, despawned={}, stepped={}",
                report.spawned, report.despawned, report.stepped
            );
            println!("Elapsed: {:?}", report.elapsed);
            if !report.loaded.is_empty() {
                println!("Loaded scenes: {}", report.loaded.join(", "));
            }
            for stats in &report.stats {
                println!(
                    "{}: idle={}, outstanding={}, created={}, grown={}",
                    stats.name, stats.idle, stats.outstanding, stats.created, stats.grown
                );
            }
        }
    }

    Ok(())
}
