use serde::{Deserialize, Serialize};
use std::time::Duration;
use tickpool_common::{InstanceId, TemplateKey};
use tickpool_pool::{InstancePool, Poolable, Pooled, SpawnParams};
use tickpool_scheduler::{
    LoadMode, SceneId, SceneLoadRequest, SceneLoader, Scheduler, SimulatedLoader, WaitId,
};

/// A record appended by every pool mutation and every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuntimeEvent {
    /// An instance was checked out of the pool for `key`.
    Spawned { id: InstanceId, key: TemplateKey },
    /// An instance went back to its pool.
    Despawned { id: InstanceId, key: TemplateKey },
    /// The scheduler advanced to `tick`.
    Stepped { tick: u64, elapsed: Duration },
}

/// Host side of a runtime that can start scene loads.
pub trait SceneHost {
    fn scene_loader(&mut self) -> &mut dyn SceneLoader;
}

impl SceneHost for SimulatedLoader {
    fn scene_loader(&mut self) -> &mut dyn SceneLoader {
        self
    }
}

/// State handed to every scheduler callback: the pools, the host engine
/// handle and the event log.
pub struct World<E: Poolable, H> {
    pub pool: InstancePool<E>,
    pub host: H,
    events: Vec<RuntimeEvent>,
}

impl<E: Poolable, H> World<E, H> {
    pub fn new(pool: InstancePool<E>, host: H) -> Self {
        Self {
            pool,
            host,
            events: Vec::new(),
        }
    }

    /// Check an instance out of the pool for `key`, logging a `Spawned` event on success.
    pub fn spawn(
        &mut self,
        key: impl Into<TemplateKey>,
        params: SpawnParams,
        args: &E::Args,
    ) -> Option<Pooled<E>> {
        let instance = self.pool.checkout(key, params, args)?;
        self.events.push(RuntimeEvent::Spawned {
            id: instance.id(),
            key: instance.key(),
        });
        Some(instance)
    }

    /// Return an instance to its pool, logging a `Despawned` event on success.
    pub fn despawn(&mut self, instance: Pooled<E>, args: &E::Args) -> bool {
        let (id, key) = (instance.id(), instance.key());
        let released = self.pool.release(instance, args);
        if released {
            self.events.push(RuntimeEvent::Despawned { id, key });
        }
        released
    }

    pub fn events(&self) -> &[RuntimeEvent] {
        &self.events
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<RuntimeEvent> {
        std::mem::take(&mut self.events)
    }
}

/// The long-lived context of a running game: one world and the scheduler
/// that drives it. Created once at startup and passed to whoever needs it.
pub struct Runtime<E: Poolable + 'static, H: 'static> {
    world: World<E, H>,
    scheduler: Scheduler<World<E, H>>,
}

impl<E: Poolable + 'static, H: 'static> Runtime<E, H> {
    pub fn new(pool: InstancePool<E>, host: H) -> Self {
        Self {
            world: World::new(pool, host),
            scheduler: Scheduler::new(),
        }
    }

    pub fn world(&self) -> &World<E, H> {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World<E, H> {
        &mut self.world
    }

    /// Scheduler for registering waits against the world.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler<World<E, H>> {
        &mut self.scheduler
    }

    /// Ticks advanced so far.
    pub fn tick(&self) -> u64 {
        self.scheduler.frame().tick
    }

    pub fn elapsed(&self) -> Duration {
        self.scheduler.frame().elapsed
    }

    /// Advance one tick of length `delta`, resolving every due wait.
    pub fn step(&mut self, delta: Duration) {
        self.scheduler.tick(&mut self.world, delta);
        let frame = self.scheduler.frame();
        self.world.events.push(RuntimeEvent::Stepped {
            tick: frame.tick,
            elapsed: frame.elapsed,
        });
    }

    pub fn spawn(
        &mut self,
        key: impl Into<TemplateKey>,
        params: SpawnParams,
        args: &E::Args,
    ) -> Option<Pooled<E>> {
        self.world.spawn(key, params, args)
    }

    pub fn despawn(&mut self, instance: Pooled<E>, args: &E::Args) -> bool {
        self.world.despawn(instance, args)
    }

    pub fn events(&self) -> &[RuntimeEvent] {
        self.world.events()
    }

    pub fn drain_events(&mut self) -> Vec<RuntimeEvent> {
        self.world.drain_events()
    }
}

impl<E: Poolable + 'static, H: SceneHost + 'static> Runtime<E, H> {
    /// Boot sequence: let the first frame render, then load `target` as the
    /// only scene.
    pub fn boot(&mut self, target: impl Into<SceneId>) -> WaitId {
        let target = target.into();
        tracing::info!(scene = %target, "booting");
        self.scheduler.next_frame(move |scheduler, world: &mut World<E, H>| {
            scheduler.load_scene(
                world.host.scene_loader(),
                SceneLoadRequest::new(target, LoadMode::Single),
            );
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use tickpool_common::Transform;
    use tickpool_pool::PoolDefinition;

    const DT: Duration = Duration::from_millis(16);

    #[derive(Debug, Clone, Default)]
    struct Drone {
        transform: Transform,
        active: bool,
    }

    impl Poolable for Drone {
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

    fn runtime(size: usize) -> Runtime<Drone, SimulatedLoader> {
        let pool = InstancePool::new([(
            PoolDefinition::new("Drone", size).confirm_not_poolable(),
            Drone::default(),
        )]);
        Runtime::new(pool, SimulatedLoader::new(2))
    }

    #[test]
    fn runtime_starts_at_tick_zero() {
        let rt = runtime(1);
        assert_eq!(rt.tick(), 0);
        assert_eq!(rt.elapsed(), Duration::ZERO);
        assert!(rt.events().is_empty());
    }

    #[test]
    fn spawn_and_despawn_are_logged() {
        let mut rt = runtime(1);
        let drone = rt.spawn("Drone", SpawnParams::at(Vec3::X), &()).unwrap();
        let id = drone.id();
        assert!(rt.spawn("Drone", SpawnParams::at(Vec3::X), &()).is_none());
        assert!(rt.despawn(drone, &()));

        let key = TemplateKey::from_name("Drone");
        assert_eq!(
            rt.events(),
            &[
                RuntimeEvent::Spawned { id, key },
                RuntimeEvent::Despawned { id, key },
            ]
        );
    }

    #[test]
    fn step_advances_clock_and_logs() {
        let mut rt = runtime(1);
        rt.step(DT);
        rt.step(DT);
        assert_eq!(rt.tick(), 2);
        assert_eq!(rt.elapsed(), DT * 2);
        assert_eq!(
            rt.events().last(),
            Some(&RuntimeEvent::Stepped {
                tick: 2,
                elapsed: DT * 2
            })
        );
    }

    #[test]
    fn drain_events_clears_log() {
        let mut rt = runtime(2);
        rt.step(DT);
        rt.spawn("Drone", SpawnParams::at(Vec3::ZERO), &());
        assert_eq!(rt.drain_events().len(), 2);
        assert!(rt.events().is_empty());
    }

    #[test]
    fn callbacks_can_spawn_through_world() {
        let mut rt = runtime(3);
        rt.scheduler_mut()
            .after_frames(2, |_, world: &mut World<Drone, SimulatedLoader>| {
                let drone = world.spawn("Drone", SpawnParams::at(Vec3::Y), &());
                assert!(drone.is_some_and(|drone| world.pool.discard(drone)));
            });

        rt.step(DT);
        assert_eq!(rt.world().pool.idle_count("Drone"), Some(3));
        rt.step(DT);
        // The callback retired its instance instead of returning it.
        assert_eq!(rt.world().pool.idle_count("Drone"), Some(2));
        assert_eq!(rt.world().pool.outstanding_count(), 0);
        assert!(matches!(rt.events()[1], RuntimeEvent::Spawned { .. }));
    }

    #[test]
    fn boot_loads_single_scene_after_first_frame() {
        let mut rt = runtime(1);
        rt.boot("Game");

        rt.world_mut().host.advance();
        rt.step(DT);
        // Load has only been requested on the first tick.
        assert_eq!(rt.world().host.in_progress(), 1);
        assert!(rt.world().host.loaded().is_empty());

        for _ in 0..10 {
            rt.world_mut().host.advance();
            rt.step(DT);
        }
        assert_eq!(rt.world().host.loaded(), &[SceneId::from("Game")]);
        assert_eq!(rt.scheduler_mut().pending(), 0);
    }
}
