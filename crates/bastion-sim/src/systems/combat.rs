//! Health upkeep, damage application, death, and unit melee/ranged attacks.

use rand::Rng;
use tracing::debug;

use bastion_core::components::{AiBehavior, Damage, Health};
use bastion_core::constants::TIMER_EPSILON;
use bastion_core::events::SimEvent;
use bastion_core::types::{EntityId, Position};

use crate::context::TickContext;
use crate::ecs::{ComponentKind, KindSet, World};
use crate::schedule::System;
use crate::systems::{priority, targets};

/// What a single `deal_damage` call did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    /// Health actually removed, critical bonus included.
    pub applied: f64,
    pub critical: bool,
    pub killed: bool,
}

/// Apply `amount` to `target`, plus a critical bonus rolled from the
/// attacker's `Damage`.
///
/// Returns `None` when nothing happened: the target is gone, has no health,
/// is already dead, or is invulnerable.
pub fn deal_damage(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    attacker: Option<EntityId>,
    target: EntityId,
    amount: f64,
) -> Option<DamageOutcome> {
    let crit_profile = attacker
        .and_then(|a| world.get::<Damage>(a))
        .map(|d| (d.critical_chance, d.critical_multiplier));

    let health = world.get_mut::<Health>(target)?;
    if health.is_dead || health.is_invulnerable() {
        return None;
    }

    let amount = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
    let critical = match crit_profile {
        Some((chance, _)) => {
            let chance = if chance.is_finite() { chance.clamp(0.0, 1.0) } else { 0.0 };
            ctx.rng.gen::<f64>() < chance
        }
        None => false,
    };
    let bonus = match crit_profile {
        Some((_, multiplier)) if critical => amount * multiplier.max(1.0),
        _ => 0.0,
    };

    let max = health.max.max(0.0);
    let before = health.current.clamp(0.0, max);
    health.current = (before - amount - bonus).max(0.0);
    if health.invulnerability_window > 0.0 {
        health.invulnerability_timer = health.invulnerability_window;
    }
    let applied = before - health.current;
    let remaining = health.current;

    ctx.bus.emit(SimEvent::DamageApplied {
        target,
        attacker,
        amount: applied,
        critical,
        remaining,
    });

    let killed = remaining <= 0.0 && mark_dead(world, ctx, target, attacker);
    Some(DamageOutcome {
        applied,
        critical,
        killed,
    })
}

/// Flag `id` dead and schedule its removal. Returns false if it was already
/// dead or has no health.
pub fn mark_dead(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    id: EntityId,
    killer: Option<EntityId>,
) -> bool {
    let Some(health) = world.get_mut::<Health>(id) else {
        return false;
    };
    if health.is_dead {
        return false;
    }
    health.is_dead = true;
    health.current = 0.0;
    let delay = health.death_delay;

    if let Some(ai) = world.get_mut::<AiBehavior>(id) {
        ai.is_attacking = false;
    }

    ctx.removals.schedule(id, delay);
    ctx.bus.emit(SimEvent::EntityDied { id, killer });
    debug!(entity = %id, killer = ?killer, delay, "entity died");
    true
}

/// Runs regeneration, invulnerability timers, death checks and attacks for
/// every entity with `Health`.
#[derive(Debug, Default)]
pub struct CombatSystem;

impl System for CombatSystem {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn required(&self) -> KindSet {
        KindSet::of(&[ComponentKind::Health])
    }

    fn priority(&self) -> i32 {
        priority::COMBAT
    }

    fn update(&mut self, world: &mut World, ctx: &mut TickContext<'_>, entities: &[EntityId]) {
        for &id in entities {
            upkeep(world, ctx, id);
        }

        for &id in entities {
            if !targets::is_alive(world, id) {
                continue;
            }
            let Some(damage) = world.get::<Damage>(id).copied() else {
                continue;
            };
            resolve_melee(world, ctx, id, &damage);
            resolve_ranged(world, ctx, id, &damage);
        }
    }
}

fn upkeep(world: &mut World, ctx: &mut TickContext<'_>, id: EntityId) {
    let Some(health) = world.get_mut::<Health>(id) else {
        return;
    };
    if health.is_dead {
        return;
    }

    let max = health.max.max(0.0);
    health.current = health.current.clamp(0.0, max);
    if let Some(regen) = health.regen_per_second {
        if regen > 0.0 && health.current > 0.0 && health.current < max {
            health.current = (health.current + regen * ctx.dt).min(max);
        }
    }
    if health.invulnerability_timer > 0.0 {
        health.invulnerability_timer = (health.invulnerability_timer - ctx.dt).max(0.0);
    }

    if health.current <= 0.0 {
        mark_dead(world, ctx, id, None);
    }
}

/// Count an optional cooldown down. Returns true when it is ready.
fn cooldown_ready(cooldown: &mut Option<f64>, dt: f64) -> bool {
    match cooldown {
        Some(remaining) => {
            *remaining = (*remaining - dt).max(0.0);
            *remaining <= TIMER_EPSILON
        }
        None => true,
    }
}

fn resolve_melee(world: &mut World, ctx: &mut TickContext<'_>, id: EntityId, damage: &Damage) {
    let Some(ai) = world.get::<AiBehavior>(id) else {
        return;
    };
    let attacking = ai.is_attacking;
    let reach = damage.melee_range.unwrap_or(ai.attack_range);

    let mut cooldown = damage.melee_cooldown;
    let ready = cooldown_ready(&mut cooldown, ctx.dt);
    if !attacking || !ready {
        store_melee_cooldown(world, id, cooldown);
        return;
    }

    let Some(origin) = world.get::<Position>(id).copied() else {
        return;
    };
    let amount = damage.melee_damage.unwrap_or(damage.base_damage);
    if amount <= 0.0 {
        store_melee_cooldown(world, id, cooldown);
        return;
    }
    let victims = targets::hostiles_within(
        world,
        id,
        origin,
        Some(reach),
        KindSet::of(&[ComponentKind::Health]),
    );
    if victims.is_empty() {
        store_melee_cooldown(world, id, cooldown);
        return;
    }

    for (victim, _) in victims {
        deal_damage(world, ctx, Some(id), victim, amount);
    }
    if cooldown.is_some() {
        cooldown = Some(damage.melee_cooldown_max.unwrap_or(0.0).max(0.0));
    }
    store_melee_cooldown(world, id, cooldown);
}

fn store_melee_cooldown(world: &mut World, id: EntityId, cooldown: Option<f64>) {
    if let Some(d) = world.get_mut::<Damage>(id) {
        d.melee_cooldown = cooldown;
    }
}

fn resolve_ranged(world: &mut World, ctx: &mut TickContext<'_>, id: EntityId, damage: &Damage) {
    let (Some(amount), Some(range)) = (damage.ranged_damage, damage.ranged_range) else {
        return;
    };

    let mut cooldown = Some(damage.ranged_cooldown.unwrap_or(0.0));
    let ready = cooldown_ready(&mut cooldown, ctx.dt);
    let fired = ready && fire_ranged(world, ctx, id, damage, amount, range);
    if fired {
        cooldown = Some(damage.ranged_cooldown_max.unwrap_or(0.0).max(0.0));
    }
    if let Some(d) = world.get_mut::<Damage>(id) {
        d.ranged_cooldown = cooldown;
    }
}

fn fire_ranged(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    id: EntityId,
    damage: &Damage,
    amount: f64,
    range: f64,
) -> bool {
    let Some(origin) = world.get::<Position>(id).copied() else {
        return false;
    };
    let health_only = KindSet::of(&[ComponentKind::Health]);
    let Some(target) = targets::nearest(targets::hostiles_within(
        world,
        id,
        origin,
        Some(range),
        health_only,
    )) else {
        return false;
    };
    let Some(impact) = world.get::<Position>(target).copied() else {
        return false;
    };

    deal_damage(world, ctx, Some(id), target, amount);

    if let (Some(splash), Some(radius)) = (damage.area_damage, damage.area_range) {
        for (other, _) in targets::hostiles_within(world, id, impact, Some(radius), health_only) {
            if other != target {
                deal_damage(world, ctx, Some(id), other, splash);
            }
        }
    }

    if let Some(hops) = damage.chain_count {
        let reach = damage.chain_range.unwrap_or(range);
        let mut hit = vec![target];
        let mut from = impact;
        for _ in 0..hops {
            let next = targets::nearest(
                targets::hostiles_within(world, id, from, Some(reach), health_only)
                    .into_iter()
                    .filter(|(other, _)| !hit.contains(other))
                    .collect(),
            );
            let Some(next) = next else {
                break;
            };
            let Some(at) = world.get::<Position>(next).copied() else {
                break;
            };
            deal_damage(world, ctx, Some(id), next, amount);
            hit.push(next);
            from = at;
        }
    }
    true
}
