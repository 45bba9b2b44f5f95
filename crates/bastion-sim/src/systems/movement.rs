//! Kinematic integration: position += velocity * dt.

use glam::DVec2;

use bastion_core::components::Health;
use bastion_core::types::{EntityId, Position, Velocity};

use crate::context::TickContext;
use crate::ecs::{ComponentKind, KindSet, World};
use crate::schedule::System;
use crate::systems::priority;

#[derive(Debug, Default)]
pub struct MovementSystem;

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn required(&self) -> KindSet {
        KindSet::of(&[ComponentKind::Position, ComponentKind::Velocity])
    }

    fn priority(&self) -> i32 {
        priority::MOVEMENT
    }

    fn update(&mut self, world: &mut World, ctx: &mut TickContext<'_>, entities: &[EntityId]) {
        for &id in entities {
            if world.get::<Health>(id).is_some_and(|h| h.is_dead) {
                continue;
            }
            let Some(velocity) = world.get::<Velocity>(id).copied() else {
                continue;
            };
            let step: DVec2 = velocity.as_vec() * ctx.dt;
            if !step.is_finite() {
                continue;
            }
            if let Some(position) = world.get_mut::<Position>(id) {
                *position = Position::from_vec(position.as_vec() + step);
            }
        }
    }
}
