use std::hint::black_box;
use std::time::Instant;

use glam::Vec3;
use tickpool_common::Transform;
use tickpool_pool::{InstancePool, PoolDefinition, Poolable, SpawnParams};

#[derive(Debug, Clone, Default)]
struct Particle {
    transform: Transform,
    active: bool,
}

impl Poolable for Particle {
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

    fn has_lifecycle_hooks(&self) -> bool {
        true
    }
}

fn make_pool(size: usize) -> InstancePool<Particle> {
    InstancePool::new([(PoolDefinition::new("Particle", size), Particle::default())])
}

fn bench_churn(size: usize, iterations: usize) {
    let mut pool = make_pool(size);
    let mut live = Vec::with_capacity(size);

    let start = Instant::now();
    for i in 0..iterations {
        let params = SpawnParams::at(Vec3::splat(i as f32));
        while let Some(p) = pool.checkout("Particle", params, &()) {
            live.push(p);
        }
        for p in live.drain(..) {
            black_box(pool.release(p, &()));
        }
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  churn ({size} instances, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_growth(initial: usize, spawns: usize) {
    let mut pool = make_pool(initial);
    let mut live = Vec::with_capacity(spawns);

    let start = Instant::now();
    let params = SpawnParams::at(Vec3::ZERO).growable();
    for _ in 0..spawns {
        if let Some(p) = pool.checkout("Particle", params, &()) {
            live.push(p);
        }
    }
    let elapsed = start.elapsed();
    println!("  growth ({initial} -> {spawns} instances): total {elapsed:?}");
    black_box(live);
}

fn main() {
    println!("pool benchmarks");
    bench_churn(64, 1_000);
    bench_churn(1_024, 100);
    bench_growth(0, 10_000);
    bench_growth(1_000, 10_000);
}
