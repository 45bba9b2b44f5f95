//! Resource nodes: collection readiness, depletion respawn and yield boosts.

use tracing::debug;

use bastion_core::components::Resource;
use bastion_core::constants::TIMER_EPSILON;
use bastion_core::events::SimEvent;
use bastion_core::types::EntityId;

use crate::context::{EventBus, TickContext};
use crate::economy::{Harvest, Stockpile};
use crate::ecs::{ComponentKind, KindSet, World};
use crate::schedule::System;
use crate::systems::{priority, tick_boost};

#[derive(Debug, Default)]
pub struct ResourceSystem;

impl System for ResourceSystem {
    fn name(&self) -> &'static str {
        "resources"
    }

    fn required(&self) -> KindSet {
        KindSet::of(&[ComponentKind::Resource])
    }

    fn priority(&self) -> i32 {
        priority::RESOURCES
    }

    fn update(&mut self, world: &mut World, ctx: &mut TickContext<'_>, entities: &[EntityId]) {
        for &id in entities {
            let Some(node) = world.get_mut::<Resource>(id) else {
                continue;
            };
            tick_boost(&mut node.yield_boost, ctx.dt);

            if node.is_depleted {
                node.respawn_timer = (node.respawn_timer - ctx.dt).max(0.0);
                if node.respawn_timer <= TIMER_EPSILON {
                    node.is_depleted = false;
                    node.amount = node.max_amount.max(0.0);
                    node.collection_timer = 0.0;
                    debug!(node = %id, resource = ?node.resource_type, "resource respawned");
                    ctx.bus.emit(SimEvent::ResourceRespawned {
                        id,
                        resource_type: node.resource_type,
                    });
                }
            } else {
                node.collection_timer = (node.collection_timer - ctx.dt).max(0.0);
            }
        }
    }
}

/// Harvest up to `requested` from a node into `stockpile`.
///
/// Returns `None` when the node is gone, depleted or still on its
/// collection interval.
pub fn collect(
    world: &mut World,
    bus: &mut EventBus,
    stockpile: &mut Stockpile,
    id: EntityId,
    requested: f64,
) -> Option<Harvest> {
    let node = world.get_mut::<Resource>(id)?;
    if node.is_depleted || node.collection_timer > TIMER_EPSILON {
        return None;
    }
    if !requested.is_finite() || requested <= 0.0 {
        return None;
    }

    let taken = requested.min(node.amount.max(0.0));
    node.amount = (node.amount - taken).max(0.0);
    node.collection_timer = node.collection_interval.max(0.0);

    let boost = node
        .yield_boost
        .map_or(1.0, |b| if b.multiplier.is_finite() { b.multiplier.max(0.0) } else { 1.0 });
    let credited = taken * node.quality.clamp(0.0, 1.0) * boost;
    let resource_type = node.resource_type;

    let depleted = node.amount <= 0.0;
    if depleted {
        node.is_depleted = true;
        node.respawn_timer = node.respawn_time.max(0.0);
        debug!(node = %id, resource = ?resource_type, "resource depleted");
        bus.emit(SimEvent::ResourceDepleted { id, resource_type });
    }

    stockpile.deposit(resource_type, credited);
    Some(Harvest {
        node: id,
        resource_type,
        taken,
        credited,
        depleted,
    })
}
