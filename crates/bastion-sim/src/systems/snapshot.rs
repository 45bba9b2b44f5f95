//! Snapshot builder: reads the world into a `WorldSnapshot` for rendering.
//!
//! Read-only. Never modifies the world.

use bastion_core::components::{AiBehavior, Health, Sprite};
use bastion_core::state::{EntityView, WorldSnapshot};
use bastion_core::types::{Position, SimTime};

use crate::ecs::{ComponentKind, KindSet, World};

const DRAWABLE: KindSet = KindSet::EMPTY
    .with(ComponentKind::Position)
    .with(ComponentKind::Sprite);

/// Build a snapshot of every live entity with a position and a sprite.
pub fn build_snapshot(world: &World, time: &SimTime) -> WorldSnapshot {
    WorldSnapshot {
        time: *time,
        entities: world
            .query(DRAWABLE)
            .filter_map(|id| {
                let position = *world.get::<Position>(id)?;
                let sprite = world.get::<Sprite>(id)?;
                let health = world.get::<Health>(id);
                Some(EntityView {
                    id,
                    position,
                    sprite: sprite.key.clone(),
                    layer: sprite.layer,
                    health: health.map(Health::fraction),
                    ai_state: world.get::<AiBehavior>(id).map(|ai| ai.current_state),
                    is_dead: health.is_some_and(|h| h.is_dead),
                })
            })
            .collect(),
    }
}
