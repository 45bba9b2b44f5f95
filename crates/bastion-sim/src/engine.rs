//! Simulation engine: the host-facing entry point.
//!
//! `SimulationEngine` owns the world, the scheduler, the seeded RNG, the
//! event bus, the removal queue and the stockpile. The host assembles
//! entities through it, calls `advance` once per frame, then drains events
//! and reads a snapshot.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace, warn};

use bastion_core::components::{Boost, Resource, TowerStats};
use bastion_core::config::SimConfig;
use bastion_core::events::{EventBatch, SimEvent};
use bastion_core::state::WorldSnapshot;
use bastion_core::types::{EntityId, SimTime};

use crate::context::{EventBus, PendingRemoval, RemovalQueue, TickContext};
use crate::economy::{Harvest, Stockpile};
use crate::ecs::{Component, KindSet, NoSuchEntity, Query, World};
use crate::schedule::{Scheduler, System};
use crate::systems::ai_behavior::AiBehaviorSystem;
use crate::systems::combat::CombatSystem;
use crate::systems::movement::MovementSystem;
use crate::systems::resources::{self, ResourceSystem};
use crate::systems::snapshot::build_snapshot;
use crate::systems::targets::HostileLocator;
use crate::systems::tower_targeting::TowerTargetingSystem;

pub struct SimulationEngine {
    world: World,
    scheduler: Scheduler,
    config: SimConfig,
    rng: ChaCha8Rng,
    time: SimTime,
    bus: EventBus,
    removals: RemovalQueue,
    stockpile: Stockpile,
}

impl SimulationEngine {
    /// Engine with the default systems and the faction-based hostile lookup.
    pub fn new(config: SimConfig) -> Self {
        Self::with_systems(config, default_systems(AiBehaviorSystem::default()))
    }

    /// Engine with the default systems, resolving AI targets through
    /// `locator`.
    pub fn with_locator(config: SimConfig, locator: Box<dyn HostileLocator>) -> Self {
        Self::with_systems(config, default_systems(AiBehaviorSystem::new(locator)))
    }

    /// Engine running exactly `systems`.
    pub fn with_systems(config: SimConfig, systems: Vec<Box<dyn System>>) -> Self {
        let config = config.sanitized();
        let mut scheduler = Scheduler::new();
        for system in systems {
            scheduler.add(system);
        }
        Self {
            world: World::new(),
            scheduler,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            time: SimTime::default(),
            bus: EventBus::default(),
            removals: RemovalQueue::default(),
            stockpile: Stockpile::new(),
        }
    }

    /// Register an extra system. It runs in priority order with the rest.
    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.scheduler.add(system);
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Deaths whose delay has elapsed are removed first, then every system
    /// runs once, then zero-delay deaths from this tick are removed.
    pub fn advance(&mut self, dt: f64) {
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            warn!(dt, "invalid frame delta, clamped to 0");
            0.0
        };

        let due = self.removals.advance(dt);
        self.remove_all(due);

        let mut ctx = TickContext {
            dt,
            tick: self.time.tick,
            rng: &mut self.rng,
            bus: &mut self.bus,
            removals: &mut self.removals,
            config: &self.config,
        };
        self.scheduler.run(&mut self.world, &mut ctx);

        let due = self.removals.take_due();
        self.remove_all(due);

        self.time.advance(dt);
        trace!(
            tick = self.time.tick,
            dt,
            entities = self.world.live_count(),
            "tick complete"
        );
    }

    fn remove_all(&mut self, ids: Vec<EntityId>) {
        for id in ids {
            if self.world.remove(id).is_ok() {
                debug!(entity = %id, "entity removed");
                self.bus.emit(SimEvent::EntityRemoved { id });
            }
        }
    }

    pub fn create_entity(&mut self) -> EntityId {
        self.world.create_entity()
    }

    pub fn attach(
        &mut self,
        id: EntityId,
        component: impl Into<Component>,
    ) -> Result<(), NoSuchEntity> {
        self.world.attach(id, component)
    }

    /// Remove an entity right away, outside any death delay.
    pub fn remove(&mut self, id: EntityId) -> Result<(), NoSuchEntity> {
        self.world.remove(id)?;
        self.bus.emit(SimEvent::EntityRemoved { id });
        Ok(())
    }

    pub fn query(&self, required: KindSet) -> Query<'_> {
        self.world.query(required)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Take everything emitted since the last drain.
    pub fn drain_events(&mut self) -> EventBatch {
        self.bus.drain()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        build_snapshot(&self.world, &self.time)
    }

    pub fn pending_removals(&self) -> &[PendingRemoval] {
        self.removals.pending()
    }

    /// Harvest from a resource node into the stockpile.
    pub fn collect_resource(&mut self, id: EntityId, requested: f64) -> Option<Harvest> {
        resources::collect(
            &mut self.world,
            &mut self.bus,
            &mut self.stockpile,
            id,
            requested,
        )
    }

    /// Install a damage boost on a tower, replacing any active one.
    pub fn boost_tower(
        &mut self,
        id: EntityId,
        multiplier: f64,
        duration: f64,
    ) -> Result<(), NoSuchEntity> {
        let tower = self
            .world
            .get_mut::<TowerStats>(id)
            .ok_or(NoSuchEntity(id))?;
        tower.damage_boost = Some(Boost {
            multiplier,
            remaining: duration,
        });
        Ok(())
    }

    /// Install a yield boost on a resource node, replacing any active one.
    pub fn boost_resource(
        &mut self,
        id: EntityId,
        multiplier: f64,
        duration: f64,
    ) -> Result<(), NoSuchEntity> {
        let node = self.world.get_mut::<Resource>(id).ok_or(NoSuchEntity(id))?;
        node.yield_boost = Some(Boost {
            multiplier,
            remaining: duration,
        });
        Ok(())
    }

    pub fn stockpile(&self) -> &Stockpile {
        &self.stockpile
    }

    pub fn stockpile_mut(&mut self) -> &mut Stockpile {
        &mut self.stockpile
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// System names in run order.
    pub fn system_order(&self) -> Vec<&'static str> {
        self.scheduler.order()
    }
}

fn default_systems(ai: AiBehaviorSystem) -> Vec<Box<dyn System>> {
    vec![
        Box::new(ai),
        Box::new(MovementSystem),
        Box::new(CombatSystem),
        Box::new(TowerTargetingSystem),
        Box::new(ResourceSystem),
    ]
}
