//! Run files: a pool manifest plus a scripted spawn schedule, played on a runtime.

use anyhow::Context;
use glam::Vec3;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tickpool_common::{FloatRange, Transform};
use tickpool_pool::{InstancePool, PoolManifest, PoolStats, Poolable, SpawnParams};
use tickpool_runtime::{Runtime, RuntimeEvent, World};
use tickpool_scheduler::SimulatedLoader;

/// Stand-in entity for every template named in a run file.
#[derive(Debug, Clone, Default)]
pub struct Prop {
    transform: Transform,
    active: bool,
}

impl Poolable for Prop {
    type Args = ();

    fn transform(&self) -> &Transform {
        &self.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

type RunWorld = World<Prop, SimulatedLoader>;

fn default_fps() -> u32 {
    60
}

fn default_every() -> u64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunFile {
    pub manifest: PoolManifest,
    pub ticks: u64,
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Scene loaded by the boot sequence, if any.
    #[serde(default)]
    pub boot: Option<String>,
    #[serde(default)]
    pub load_ticks: u32,
    #[serde(default)]
    pub spawns: Vec<SpawnRule>,
}

/// Spawn `template` every `every` ticks and return it `lifetime` ticks later.
#[derive(Debug, Clone, Deserialize)]
pub struct SpawnRule {
    pub template: String,
    #[serde(default = "default_every")]
    pub every: u64,
    pub lifetime: u64,
    /// Spread of the spawn position along x.
    #[serde(default)]
    pub spread: Option<FloatRange>,
    #[serde(default)]
    pub grow: bool,
}

impl RunFile {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading run file {}", path.display()))?;
        serde_yaml::from_str(&data)
            .with_context(|| format!("parsing run file {}", path.display()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub hits: usize,
    pub misses: usize,
    pub spawned: usize,
    pub despawned: usize,
    pub stepped: usize,
    pub elapsed: Duration,
    pub loaded: Vec<String>,
    pub stats: Vec<PoolStats>,
}

/// Play `run` to the end and summarize what happened.
pub fn execute(run: &RunFile) -> anyhow::Result<RunReport> {
    let _span = tracing::info_span!("run", ticks = run.ticks, fps = run.fps).entered();
    let delta = Duration::from_secs_f64(1.0 / f64::from(run.fps.max(1)));

    let pool = InstancePool::from_manifest(&run.manifest, |_| Some(Prop::default()))?;
    let mut rt = Runtime::new(pool, SimulatedLoader::new(run.load_ticks));
    if let Some(scene) = &run.boot {
        rt.boot(scene.as_str());
    }

    let mut report = RunReport::default();
    for tick in 0..run.ticks {
        for rule in &run.spawns {
            if tick % rule.every.max(1) != 0 {
                continue;
            }
            // Golden-ratio sweep spreads consecutive spawns across the range.
            let t = (report.hits as f32 * 0.618_034).fract();
            let x = rule.spread.map_or(0.0, |spread| spread.lerp(t));
            let mut params = SpawnParams::at(Vec3::new(x, 0.0, 0.0));
            if rule.grow {
                params = params.growable();
            }

            match rt.spawn(rule.template.as_str(), params, &()) {
                Some(instance) => {
                    report.hits += 1;
                    rt.scheduler_mut()
                        .after_frames(rule.lifetime, move |_, world: &mut RunWorld| {
                            world.despawn(instance, &());
                        });
                }
                None => report.misses += 1,
            }
        }
        rt.world_mut().host.advance();
        rt.step(delta);
    }

    for event in rt.events() {
        match event {
            RuntimeEvent::Spawned { .. } => report.spawned += 1,
            RuntimeEvent::Despawned { .. } => report.despawned += 1,
            RuntimeEvent::Stepped { .. } => report.stepped += 1,
        }
    }
    report.elapsed = rt.elapsed();
    report.loaded = rt
        .world()
        .host
        .loaded()
        .iter()
        .map(ToString::to_string)
        .collect();
    report.stats = rt.world().pool.stats();

    tracing::info!(hits = report.hits, misses = report.misses, "run finished");
    Ok(report)
}
