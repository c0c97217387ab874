use tickpool_common::{InstanceId, TemplateKey, Transform};

/// Capability contract for entities stored in an [`InstancePool`](crate::InstancePool).
///
/// Every poolable entity carries a transform and a visibility flag. Entities
/// that report [`has_lifecycle_hooks`](Poolable::has_lifecycle_hooks) get
/// [`on_spawn`](Poolable::on_spawn) / [`on_despawn`](Poolable::on_despawn)
/// on checkout/return; the others are toggled with `set_active` directly.
/// Hooks are expected to leave the entity visible / hidden respectively.
pub trait Poolable: Clone {
    /// Payload handed to the lifecycle hooks.
    type Args;

    fn transform(&self) -> &Transform;

    fn transform_mut(&mut self) -> &mut Transform;

    fn is_active(&self) -> bool;

    fn set_active(&mut self, active: bool);

    fn has_lifecycle_hooks(&self) -> bool {
        false
    }

    fn on_spawn(&mut self, _args: &Self::Args) {
        self.set_active(true);
    }

    fn on_despawn(&mut self, _args: &Self::Args) {
        self.set_active(false);
    }
}

/// An instance owned by a pool, tagged with the key of its template.
///
/// Not `Clone`: a checked-out instance exists exactly once, so it cannot be
/// handed back twice. Hand it to `release` or `discard` when done; dropping
/// it leaves it counted as outstanding.
#[derive(Debug)]
pub struct Pooled<E> {
    id: InstanceId,
    key: TemplateKey,
    entity: E,
}

impl<E> Pooled<E> {
    pub(crate) fn new(key: TemplateKey, entity: E) -> Self {
        Self {
            id: InstanceId::new(),
            key,
            entity,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Key of the template this instance was cloned from.
    pub fn key(&self) -> TemplateKey {
        self.key
    }

    pub fn entity(&self) -> &E {
        &self.entity
    }

    pub fn entity_mut(&mut self) -> &mut E {
        &mut self.entity
    }
}

impl<E: Poolable> Pooled<E> {
    pub fn transform(&self) -> &Transform {
        self.entity.transform()
    }

    pub fn is_active(&self) -> bool {
        self.entity.is_active()
    }

    pub(crate) fn place(&mut self, transform: Transform) {
        *self.entity.transform_mut() = transform;
    }

    pub(crate) fn activate(&mut self, args: &E::Args) {
        if self.entity.has_lifecycle_hooks() {
            self.entity.on_spawn(args);
        } else {
            self.entity.set_active(true);
        }
    }

    pub(crate) fn deactivate(&mut self, args: &E::Args) {
        if self.entity.has_lifecycle_hooks() {
            self.entity.on_despawn(args);
        } else {
            self.entity.set_active(false);
        }
    }
}
