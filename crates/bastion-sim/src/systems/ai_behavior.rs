//! AI behavior system: feeds each unit's situation to the FSM and applies
//! the decision to its components.

use rand::Rng;
use tracing::debug;

use bastion_ai::fsm::{evaluate, AiContext, HostileInfo};
use bastion_ai::steering::{plan_velocity, Speeds};
use bastion_core::components::{AiBehavior, Health};
use bastion_core::enums::AiState;
use bastion_core::events::SimEvent;
use bastion_core::types::{EntityId, Position, Velocity};

use crate::context::TickContext;
use crate::ecs::{ComponentKind, KindSet, World};
use crate::schedule::System;
use crate::systems::priority;
use crate::systems::targets::{FactionLocator, HostileLocator};

pub struct AiBehaviorSystem {
    locator: Box<dyn HostileLocator>,
}

impl AiBehaviorSystem {
    pub fn new(locator: Box<dyn HostileLocator>) -> Self {
        Self { locator }
    }
}

impl Default for AiBehaviorSystem {
    fn default() -> Self {
        Self::new(Box::new(FactionLocator))
    }
}

impl System for AiBehaviorSystem {
    fn name(&self) -> &'static str {
        "ai_behavior"
    }

    fn required(&self) -> KindSet {
        KindSet::of(&[ComponentKind::AiBehavior, ComponentKind::Position])
    }

    fn priority(&self) -> i32 {
        priority::AI
    }

    fn update(&mut self, world: &mut World, ctx: &mut TickContext<'_>, entities: &[EntityId]) {
        for &id in entities {
            self.update_unit(world, ctx, id);
        }
    }
}

impl AiBehaviorSystem {
    fn update_unit(&self, world: &mut World, ctx: &mut TickContext<'_>, id: EntityId) {
        let Some(position) = world.get::<Position>(id).copied() else {
            return;
        };
        let vitals = world.get::<Health>(id).map(|h| (h.is_dead, h.fraction()));
        if let Some((true, _)) = vitals {
            if let Some(velocity) = world.get_mut::<Velocity>(id) {
                *velocity = Velocity::ZERO;
            }
            return;
        }
        let health_fraction = vitals.map(|(_, fraction)| fraction);

        let hostile = self.locator.nearest_hostile(world, id).and_then(|h| {
            let at = *world.get::<Position>(h)?;
            Some(HostileInfo {
                position: at,
                distance: position.distance_to(&at),
            })
        });

        let Some(ai) = world.get_mut::<AiBehavior>(id) else {
            return;
        };
        ai.state_timer = (ai.state_timer - ctx.dt).max(0.0);

        let waypoint = current_waypoint(ai);
        let patrol_roll = if ai.current_state == AiState::Idle && ai.state_timer <= 0.0 {
            ctx.rng.gen::<f64>()
        } else {
            1.0
        };

        let decision = evaluate(
            &AiContext {
                state: ai.current_state,
                position,
                state_timer: ai.state_timer,
                patrol_roll,
                hostile,
                health_fraction,
                detection_range: ai.detection_range,
                attack_range: ai.attack_range,
                flee_threshold: ai.flee_threshold.clamp(0.0, 1.0),
                waypoint,
            },
            &ctx.config.ai,
        );

        if decision.advance_waypoint && !ai.patrol_points.is_empty() {
            ai.current_patrol_index = (ai.current_patrol_index + 1) % ai.patrol_points.len();
        }

        if decision.state_changed {
            let from = ai.current_state;
            ai.previous_state = from;
            ai.current_state = decision.new_state;
            ai.state_timer = ctx.config.ai.state_durations.for_state(decision.new_state);
            ai.is_attacking = false;
            ctx.bus.emit(SimEvent::StateChanged {
                id,
                from,
                to: decision.new_state,
            });
            debug!(entity = %id, ?from, to = ?decision.new_state, "ai state changed");
        }

        let state = ai.current_state;
        ai.is_attacking = state == AiState::Attack;
        let speeds = Speeds {
            patrol: ai.patrol_speed,
            chase: ai.chase_speed,
            flee: ai.flee_speed,
        };
        let waypoint = current_waypoint(ai);

        if let Some(velocity) = world.get_mut::<Velocity>(id) {
            *velocity = plan_velocity(
                state,
                position,
                waypoint,
                hostile.map(|h| h.position),
                speeds,
            );
        }
    }
}

fn current_waypoint(ai: &AiBehavior) -> Option<Position> {
    if ai.patrol_points.is_empty() {
        return None;
    }
    ai.patrol_points
        .get(ai.current_patrol_index % ai.patrol_points.len())
        .copied()
}
