use glam::{Quat, Vec3};
use std::collections::{HashSet, VecDeque};
use tickpool_common::{InstanceId, TemplateKey, Transform};

use crate::manifest::{PoolDefinition, PoolError, PoolManifest};
use crate::poolable::{Poolable, Pooled};

/// Where and how to place a checked-out instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnParams {
    pub position: Vec3,
    /// `None` keeps the template's original rotation.
    pub rotation: Option<Quat>,
    /// Create a fresh instance when the pool is empty.
    pub allow_growth: bool,
}

impl SpawnParams {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: None,
            allow_growth: false,
        }
    }

    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn growable(mut self) -> Self {
        self.allow_growth = true;
        self
    }
}

/// Per-pool counters for instrumentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub name: String,
    pub key: TemplateKey,
    pub idle: usize,
    pub outstanding: usize,
    /// Instances created so far, pre-allocated and grown.
    pub created: usize,
    /// Instances created on demand past the pre-allocation.
    pub grown: usize,
}

struct Pool<E> {
    definition: PoolDefinition,
    key: TemplateKey,
    container: String,
    template: E,
    idle: VecDeque<Pooled<E>>,
    outstanding: HashSet<InstanceId>,
    created: usize,
}

impl<E: Poolable> Pool<E> {
    fn fill(definition: PoolDefinition, mut template: E) -> Self {
        let key = definition.key();
        template.set_active(false);

        let idle: VecDeque<Pooled<E>> = (0..definition.size)
            .map(|_| Pooled::new(key, template.clone()))
            .collect();
        tracing::debug!(name = %definition.name, size = idle.len(), "pool filled");

        Self {
            container: format!("{} pool", definition.name),
            key,
            template,
            created: idle.len(),
            idle,
            outstanding: HashSet::new(),
            definition,
        }
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            name: self.definition.name.clone(),
            key: self.key,
            idle: self.idle.len(),
            outstanding: self.outstanding.len(),
            created: self.created,
            grown: self.created.saturating_sub(self.definition.size),
        }
    }
}

/// Named groups of pre-allocated, reusable instances.
///
/// Lookups resolve a [`TemplateKey`] against the definitions in the order
/// they were given. Failures never panic: an unknown key, an exhausted pool
/// or a foreign instance all degrade to `None` / `false`.
pub struct InstancePool<E: Poolable> {
    pools: Vec<Pool<E>>,
}

impl<E: Poolable> InstancePool<E> {
    /// Create every pool and fill it with `size` inactive copies of its template.
    ///
    /// A template without lifecycle hooks whose definition was not confirmed
    /// as hook-less logs a warning; it is still pooled.
    pub fn new(entries: impl IntoIterator<Item = (PoolDefinition, E)>) -> Self {
        let _span = tracing::info_span!("pool_init").entered();
        let mut pools: Vec<Pool<E>> = Vec::new();

        for (definition, template) in entries {
            if !definition.confirmed_not_poolable && !template.has_lifecycle_hooks() {
                tracing::warn!(
                    name = %definition.name,
                    "template isn't poolable: no lifecycle hooks"
                );
            }
            if pools.iter().any(|p| p.key == definition.key()) {
                tracing::warn!(
                    name = %definition.name,
                    "duplicate pool definition, lookups use the first"
                );
            }
            pools.push(Pool::fill(definition, template));
        }

        tracing::info!(pools = pools.len(), "instance pools ready");
        Self { pools }
    }

    /// Build pools from a manifest, asking `template_for` for each entry's template.
    pub fn from_manifest(
        manifest: &PoolManifest,
        mut template_for: impl FnMut(&PoolDefinition) -> Option<E>,
    ) -> Result<Self, PoolError> {
        let mut entries = Vec::with_capacity(manifest.pools.len());
        for definition in &manifest.pools {
            let template = template_for(definition)
                .ok_or_else(|| PoolError::MissingTemplate(definition.name.clone()))?;
            entries.push((definition.clone(), template));
        }
        Ok(Self::new(entries))
    }

    /// Take an instance out of the pool for `key` and place it in the world.
    ///
    /// Returns `None` when no pool matches `key`, or when the pool is empty
    /// and `params.allow_growth` is off.
    pub fn checkout(
        &mut self,
        key: impl Into<TemplateKey>,
        params: SpawnParams,
        args: &E::Args,
    ) -> Option<Pooled<E>> {
        let key = key.into();
        let Some(pool) = self.pool_mut(key) else {
            tracing::debug!(%key, "checkout: no pool for key");
            return None;
        };

        let mut instance = match pool.idle.pop_front() {
            Some(instance) => instance,
            None if params.allow_growth => {
                pool.created += 1;
                tracing::debug!(name = %pool.definition.name, created = pool.created, "pool grown");
                Pooled::new(key, pool.template.clone())
            }
            None => {
                tracing::debug!(name = %pool.definition.name, "checkout: pool exhausted");
                return None;
            }
        };

        let template = pool.template.transform();
        instance.place(Transform {
            position: params.position,
            rotation: params.rotation.unwrap_or(template.rotation),
            scale: template.scale,
        });
        instance.activate(args);
        pool.outstanding.insert(instance.id());

        tracing::trace!(name = %pool.definition.name, id = ?instance.id(), "checked out");
        Some(instance)
    }

    /// Hand an instance back to its pool.
    ///
    /// Returns `false`, dropping the instance, when its key matches no pool or
    /// when it was not checked out from this pool.
    pub fn release(&mut self, mut instance: Pooled<E>, args: &E::Args) -> bool {
        let Some(pool) = self.pool_mut(instance.key()) else {
            tracing::debug!(key = %instance.key(), "release: no pool for key, dropped");
            return false;
        };
        if !pool.outstanding.remove(&instance.id()) {
            tracing::warn!(
                name = %pool.definition.name,
                id = ?instance.id(),
                "release: instance wasn't checked out from this pool, dropped"
            );
            return false;
        }

        instance.deactivate(args);
        tracing::trace!(name = %pool.definition.name, id = ?instance.id(), "released");
        pool.idle.push_back(instance);
        true
    }

    /// Retire a checked-out instance for good instead of returning it.
    ///
    /// A `Pooled` that is simply dropped stays counted as outstanding; this
    /// is the way to let go of one. Returns `false` under the same conditions
    /// as [`release`](Self::release).
    pub fn discard(&mut self, instance: Pooled<E>) -> bool {
        let Some(pool) = self.pool_mut(instance.key()) else {
            tracing::debug!(key = %instance.key(), "discard: no pool for key");
            return false;
        };
        if !pool.outstanding.remove(&instance.id()) {
            tracing::warn!(
                name = %pool.definition.name,
                id = ?instance.id(),
                "discard: instance wasn't checked out from this pool"
            );
            return false;
        }
        tracing::debug!(name = %pool.definition.name, id = ?instance.id(), "discarded");
        true
    }

    /// Whether a pool exists for `key`.
    pub fn contains(&self, key: impl Into<TemplateKey>) -> bool {
        self.pool(key.into()).is_some()
    }

    /// Idle instances for `key`, or `None` if there is no such pool.
    pub fn idle_count(&self, key: impl Into<TemplateKey>) -> Option<usize> {
        self.pool(key.into()).map(|p| p.idle.len())
    }

    /// Instances currently checked out across all pools.
    pub fn outstanding_count(&self) -> usize {
        self.pools.iter().map(|p| p.outstanding.len()).sum()
    }

    /// Label of the container grouping the instances of `key`.
    pub fn container(&self, key: impl Into<TemplateKey>) -> Option<&str> {
        self.pool(key.into()).map(|p| p.container.as_str())
    }

    pub fn definitions(&self) -> impl Iterator<Item = &PoolDefinition> {
        self.pools.iter().map(|p| &p.definition)
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        self.pools.iter().map(Pool::stats).collect()
    }

    fn pool(&self, key: TemplateKey) -> Option<&Pool<E>> {
        self.pools.iter().find(|p| p.key == key)
    }

    fn pool_mut(&mut self, key: TemplateKey) -> Option<&mut Pool<E>> {
        self.pools.iter_mut().find(|p| p.key == key)
    }
}
