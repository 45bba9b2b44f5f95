//! System trait and the priority-ordered scheduler.

use bastion_core::types::EntityId;

use crate::context::TickContext;
use crate::ecs::{KindSet, World};

/// A unit of per-tick logic over the entities holding a set of kinds.
///
/// Systems keep no per-entity state between ticks; everything lives in
/// components.
pub trait System {
    fn name(&self) -> &'static str;

    /// Kinds an entity must hold to be handed to `update`.
    fn required(&self) -> KindSet;

    /// Lower runs earlier. Ties run in registration order.
    fn priority(&self) -> i32;

    /// Process one tick. `entities` was queried right before the call;
    /// entries removed since then must be treated as absent.
    fn update(&mut self, world: &mut World, ctx: &mut TickContext<'_>, entities: &[EntityId]);
}

#[derive(Default)]
pub struct Scheduler {
    systems: Vec<Box<dyn System>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
        // Stable sort keeps registration order among equal priorities.
        self.systems.sort_by_key(|system| system.priority());
    }

    /// Names in run order.
    pub fn order(&self) -> Vec<&'static str> {
        self.systems.iter().map(|system| system.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Run every system once, each against a fresh query.
    pub fn run(&mut self, world: &mut World, ctx: &mut TickContext<'_>) {
        for system in &mut self.systems {
            let entities: Vec<EntityId> = world.query(system.required()).collect();
            system.update(world, ctx, &entities);
        }
    }
}
