use std::collections::btree_map::{self, BTreeMap};
use std::fmt;

use bastion_core::types::EntityId;

use super::component::{Component, ComponentData, ComponentKind, ComponentSlots, KindSet};
use super::entity::EntityRegistry;

/// The entity is unknown or no longer live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoSuchEntity(pub EntityId);

impl fmt::Display for NoSuchEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no such entity: {}", self.0)
    }
}

impl std::error::Error for NoSuchEntity {}

/// Entity registry plus per-entity component slot tables.
///
/// Every accessor treats a dead or unknown id as absent: reads return
/// `None`, mutations return `NoSuchEntity`.
#[derive(Debug, Default)]
pub struct World {
    registry: EntityRegistry,
    store: BTreeMap<EntityId, ComponentSlots>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh live entity with no components.
    pub fn create_entity(&mut self) -> EntityId {
        let id = self.registry.allocate();
        self.store.insert(id, ComponentSlots::default());
        id
    }

    /// Attach a component, replacing any existing one of the same kind.
    pub fn attach(
        &mut self,
        id: EntityId,
        component: impl Into<Component>,
    ) -> Result<(), NoSuchEntity> {
        let slots = self.store.get_mut(&id).ok_or(NoSuchEntity(id))?;
        slots.insert(component.into());
        Ok(())
    }

    /// Detach and return a component.
    pub fn detach<T: ComponentData>(&mut self, id: EntityId) -> Result<Option<T>, NoSuchEntity> {
        let slots = self.store.get_mut(&id).ok_or(NoSuchEntity(id))?;
        Ok(T::take(slots))
    }

    /// Drop an entity and all of its components. Its id is never reused.
    pub fn remove(&mut self, id: EntityId) -> Result<(), NoSuchEntity> {
        if !self.registry.retire(id) {
            return Err(NoSuchEntity(id));
        }
        self.store.remove(&id);
        Ok(())
    }

    pub fn is_live(&self, id: EntityId) -> bool {
        self.registry.is_live(id)
    }

    pub fn get<T: ComponentData>(&self, id: EntityId) -> Option<&T> {
        self.store.get(&id).and_then(T::slot)
    }

    pub fn get_mut<T: ComponentData>(&mut self, id: EntityId) -> Option<&mut T> {
        self.store.get_mut(&id).and_then(T::slot_mut)
    }

    pub fn has(&self, id: EntityId, kind: ComponentKind) -> bool {
        self.kinds(id).is_some_and(|kinds| kinds.contains(kind))
    }

    /// Kinds held by a live entity.
    pub fn kinds(&self, id: EntityId) -> Option<KindSet> {
        self.store.get(&id).map(ComponentSlots::kinds)
    }

    /// Live entities holding every kind in `required`, in creation order.
    ///
    /// The result is recomputed on every call and reflects the world as it
    /// is at that moment.
    pub fn query(&self, required: KindSet) -> Query<'_> {
        Query {
            iter: self.store.iter(),
            required,
        }
    }

    /// All live entities, in creation order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.registry.live()
    }

    pub fn live_count(&self) -> usize {
        self.registry.live_count()
    }

    pub fn allocated_count(&self) -> usize {
        self.registry.allocated_count()
    }

    /// Forget removed entities. Returns how many were dropped.
    pub fn collect_garbage(&mut self) -> usize {
        self.registry.purge_retired()
    }
}

/// Lazy iterator over the entities matching a kind set.
#[derive(Clone)]
pub struct Query<'w> {
    iter: btree_map::Iter<'w, EntityId, ComponentSlots>,
    required: KindSet,
}

impl Iterator for Query<'_> {
    type Item = EntityId;

    fn next(&mut self) -> Option<EntityId> {
        let required = self.required;
        self.iter
            .by_ref()
            .find(|(_, slots)| slots.kinds().contains_all(required))
            .map(|(id, _)| *id)
    }
}
