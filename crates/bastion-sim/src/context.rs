//! Per-tick state handed to every system.

use rand_chacha::ChaCha8Rng;

use bastion_core::config::SimConfig;
use bastion_core::constants::TIMER_EPSILON;
use bastion_core::events::{EventBatch, ProjectileIntent, SimEvent, StatusIntent};
use bastion_core::types::EntityId;

/// Everything a system may touch besides the world.
pub struct TickContext<'a> {
    /// Seconds covered by this tick. Never negative.
    pub dt: f64,
    pub tick: u64,
    pub rng: &'a mut ChaCha8Rng,
    pub bus: &'a mut EventBus,
    pub removals: &'a mut RemovalQueue,
    pub config: &'a SimConfig,
}

/// Output queue for events and intents, drained by the host.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<SimEvent>,
    projectiles: Vec<ProjectileIntent>,
    statuses: Vec<StatusIntent>,
}

impl EventBus {
    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn spawn_projectile(&mut self, intent: ProjectileIntent) {
        self.projectiles.push(intent);
    }

    pub fn apply_status(&mut self, intent: StatusIntent) {
        self.statuses.push(intent);
    }

    /// Events emitted since the last drain.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.projectiles.is_empty() && self.statuses.is_empty()
    }

    pub fn drain(&mut self) -> EventBatch {
        EventBatch {
            events: std::mem::take(&mut self.events),
            projectiles: std::mem::take(&mut self.projectiles),
            statuses: std::mem::take(&mut self.statuses),
        }
    }
}

/// An entity waiting out its death delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingRemoval {
    pub id: EntityId,
    /// Seconds until removal.
    pub remaining: f64,
}

/// Deferred removals, counted down in simulation seconds.
#[derive(Debug, Default)]
pub struct RemovalQueue {
    entries: Vec<PendingRemoval>,
}

impl RemovalQueue {
    /// Schedule `id` for removal after `delay` seconds. An id already queued
    /// keeps its original deadline.
    pub fn schedule(&mut self, id: EntityId, delay: f64) {
        if self.is_scheduled(id) {
            return;
        }
        let remaining = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        self.entries.push(PendingRemoval { id, remaining });
    }

    pub fn is_scheduled(&self, id: EntityId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Count every entry down by `dt` and return the ids now due.
    pub fn advance(&mut self, dt: f64) -> Vec<EntityId> {
        for entry in &mut self.entries {
            entry.remaining -= dt;
        }
        self.take_due()
    }

    /// Remove and return the entries whose delay has fully elapsed.
    pub fn take_due(&mut self) -> Vec<EntityId> {
        let mut due = Vec::new();
        self.entries.retain(|entry| {
            if entry.remaining <= TIMER_EPSILON {
                due.push(entry.id);
                false
            } else {
                true
            }
        });
        due
    }

    pub fn pending(&self) -> &[PendingRemoval] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
