use std::collections::BTreeSet;

use bastion_core::types::EntityId;

/// Hands out entity ids and tracks which are live.
///
/// Ids increase monotonically and are never reissued. Removed ids stay in
/// the retired set until `purge_retired` drops the bookkeeping.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    next_id: u64,
    live: BTreeSet<EntityId>,
    retired: BTreeSet<EntityId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .expect("entity id space exhausted");
        self.live.insert(id);
        id
    }

    /// Mark an id not live. Returns false if it was not live.
    pub fn retire(&mut self, id: EntityId) -> bool {
        if self.live.remove(&id) {
            self.retired.insert(id);
            true
        } else {
            false
        }
    }

    pub fn is_live(&self, id: EntityId) -> bool {
        self.live.contains(&id)
    }

    /// Forget retired ids. Returns how many were dropped.
    pub fn purge_retired(&mut self) -> usize {
        let count = self.retired.len();
        self.retired.clear();
        count
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Live plus retired-but-not-yet-purged ids.
    pub fn allocated_count(&self) -> usize {
        self.live.len() + self.retired.len()
    }

    /// Live ids in allocation order.
    pub fn live(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.live.iter().copied()
    }
}
