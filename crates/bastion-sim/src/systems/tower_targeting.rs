//! Tower targeting: primary attacks on the best-scoring enemy in range, and
//! special abilities on their own cooldown.

use tracing::debug;

use bastion_core::components::{Boss, Enemy, Health, TowerStats};
use bastion_core::config::TargetingWeights;
use bastion_core::constants::{CHAIN_DEFAULT_HOPS, TIMER_EPSILON};
use bastion_core::enums::{Delivery, SpecialAbility, StatusEffect};
use bastion_core::events::{DamageProfile, ProjectileIntent, SimEvent, StatusIntent};
use bastion_core::types::{EntityId, Position};

use crate::context::TickContext;
use crate::ecs::{ComponentKind, KindSet, World};
use crate::schedule::System;
use crate::systems::combat::{deal_damage, DamageOutcome};
use crate::systems::{priority, targets, tick_boost};

#[derive(Debug, Default)]
pub struct TowerTargetingSystem;

impl System for TowerTargetingSystem {
    fn name(&self) -> &'static str {
        "tower_targeting"
    }

    fn required(&self) -> KindSet {
        KindSet::of(&[ComponentKind::TowerStats, ComponentKind::Position])
    }

    fn priority(&self) -> i32 {
        priority::TOWER_TARGETING
    }

    fn update(&mut self, world: &mut World, ctx: &mut TickContext<'_>, entities: &[EntityId]) {
        for &id in entities {
            update_tower(world, ctx, id);
        }
    }
}

/// Score one candidate. Higher is better.
pub fn score(
    tower: &TowerStats,
    weights: &TargetingWeights,
    range: f64,
    distance: f64,
    health_fraction: f64,
    is_boss: bool,
    threat_level: f64,
) -> f64 {
    let prefs = tower.targeting;
    let distance_term = if range <= 0.0 {
        0.0
    } else if prefs.prefer_closer {
        (range - distance) / range * weights.distance
    } else {
        distance / range * weights.distance
    };
    let health_term = if prefs.target_low_health {
        (1.0 - health_fraction) * weights.health
    } else if prefs.target_high_health {
        health_fraction * weights.health
    } else {
        0.0
    };
    let boss_term = if prefs.prioritize_bosses && is_boss {
        weights.boss
    } else {
        0.0
    };
    let threat = if threat_level.is_finite() { threat_level } else { 0.0 };
    distance_term + health_term + boss_term + threat * weights.threat
}

/// Best-scoring enemy within the tower's range. Ties go to the first found.
pub fn select_target(
    world: &World,
    tower: &TowerStats,
    origin: Position,
    weights: &TargetingWeights,
) -> Option<EntityId> {
    let range = tower.range.max(0.0);
    let mut best: Option<(EntityId, f64)> = None;
    for (candidate, distance) in targets::enemies_within(world, origin, range, &[]) {
        let fraction = world.get::<Health>(candidate).map_or(0.0, Health::fraction);
        let is_boss = world.get::<Boss>(candidate).is_some();
        let threat = world.get::<Enemy>(candidate).map_or(0.0, |e| e.threat_level);
        let value = score(tower, weights, range, distance, fraction, is_boss, threat);
        if best.map_or(true, |(_, top)| value > top) {
            best = Some((candidate, value));
        }
    }
    best.map(|(id, _)| id)
}

fn update_tower(world: &mut World, ctx: &mut TickContext<'_>, id: EntityId) {
    if !targets::is_alive(world, id) {
        return;
    }
    let Some(origin) = world.get::<Position>(id).copied() else {
        return;
    };
    let Some(tower) = world.get_mut::<TowerStats>(id) else {
        return;
    };
    let multiplier = tick_boost(&mut tower.damage_boost, ctx.dt);
    tower.attack_cooldown = (tower.attack_cooldown - ctx.dt).max(0.0);
    tower.special_cooldown = (tower.special_cooldown - ctx.dt).max(0.0);
    let stats = *tower;
    let weights = ctx.config.targeting;

    let mut primary = None;
    if stats.attack_cooldown <= TIMER_EPSILON {
        primary = select_target(world, &stats, origin, &weights);
        if let Some(target) = primary {
            fire_primary(world, ctx, id, origin, &stats, target, multiplier);
        }
    }

    if let Some(ability) = stats.special_ability {
        if stats.special_cooldown <= TIMER_EPSILON {
            let primary = primary
                .filter(|&t| targets::is_alive(world, t))
                .or_else(|| select_target(world, &stats, origin, &weights));
            let hit = trigger_special(world, ctx, id, origin, &stats, ability, primary, multiplier);
            if !hit.is_empty() {
                if let Some(tower) = world.get_mut::<TowerStats>(id) {
                    tower.special_cooldown = stats.special_cooldown_max.max(0.0);
                }
                debug!(tower = %id, ?ability, targets = hit.len(), "special triggered");
                ctx.bus.emit(SimEvent::SpecialTriggered {
                    tower: id,
                    ability,
                    targets: hit,
                });
            }
        }
    }
}

fn fire_primary(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    id: EntityId,
    origin: Position,
    stats: &TowerStats,
    target: EntityId,
    multiplier: f64,
) {
    let damage = stats.damage.max(0.0) * multiplier;
    match stats.delivery {
        Delivery::Direct => {
            let outcome = deal_damage(world, ctx, Some(id), target, damage);
            credit(world, id, outcome);
        }
        Delivery::Projectile { speed } => {
            ctx.bus.spawn_projectile(ProjectileIntent {
                source: id,
                origin,
                target,
                profile: DamageProfile {
                    amount: damage,
                    damage_type: stats.damage_type,
                    speed: speed.max(0.0),
                },
            });
        }
    }

    if let Some(tower) = world.get_mut::<TowerStats>(id) {
        tower.attack_cooldown = stats.attack_rate.max(0.0);
    }
    ctx.bus.emit(SimEvent::TowerFired {
        tower: id,
        target,
        damage,
    });
}

/// Fire the special ability. Returns the entities it reached; empty means
/// nothing was in range and the ability stays ready.
#[allow(clippy::too_many_arguments)]
fn trigger_special(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    id: EntityId,
    origin: Position,
    stats: &TowerStats,
    ability: SpecialAbility,
    primary: Option<EntityId>,
    multiplier: f64,
) -> Vec<EntityId> {
    let weights = ctx.config.targeting;
    let radius = stats.special_range.unwrap_or(stats.range).max(0.0);

    match ability {
        SpecialAbility::AreaDamage => {
            let damage = special_damage(stats, weights.area_fallback_factor) * multiplier;
            let hit = enemies_around(world, origin, radius);
            for &enemy in &hit {
                let outcome = deal_damage(world, ctx, Some(id), enemy, damage);
                credit(world, id, outcome);
            }
            hit
        }
        SpecialAbility::Slow | SpecialAbility::Stun => {
            let effect = if ability == SpecialAbility::Slow {
                StatusEffect::Slow
            } else {
                StatusEffect::Stun
            };
            let hit = enemies_around(world, origin, radius);
            for &enemy in &hit {
                ctx.bus.apply_status(StatusIntent {
                    source: id,
                    target: enemy,
                    effect,
                    magnitude: stats.special_damage.unwrap_or(0.0),
                });
            }
            hit
        }
        SpecialAbility::ChainLightning => {
            let Some(first) = primary else {
                return Vec::new();
            };
            let damage = special_damage(stats, weights.chain_fallback_factor) * multiplier;
            let reach = stats.chain_range.unwrap_or(stats.range).max(0.0);
            let hops = stats.chain_count.unwrap_or(CHAIN_DEFAULT_HOPS) as usize;
            chain(world, ctx, id, first, damage, reach, hops)
        }
    }
}

/// Strike `first`, then hop to the nearest enemy not yet struck within
/// `reach` of the last one, at most `hops` times. Stops early when nobody is
/// left in reach.
fn chain(
    world: &mut World,
    ctx: &mut TickContext<'_>,
    id: EntityId,
    first: EntityId,
    damage: f64,
    reach: f64,
    hops: usize,
) -> Vec<EntityId> {
    let mut hit: Vec<EntityId> = Vec::with_capacity(hops + 1);
    let mut current = Some(first);
    while let Some(target) = current {
        let Some(at) = world.get::<Position>(target).copied() else {
            break;
        };
        let outcome = deal_damage(world, ctx, Some(id), target, damage);
        credit(world, id, outcome);
        hit.push(target);
        if hit.len() > hops {
            break;
        }
        current = targets::nearest(targets::enemies_within(world, at, reach, &hit));
    }
    hit
}

fn enemies_around(world: &World, origin: Position, radius: f64) -> Vec<EntityId> {
    targets::enemies_within(world, origin, radius, &[])
        .into_iter()
        .map(|(enemy, _)| enemy)
        .collect()
}

fn special_damage(stats: &TowerStats, fallback_factor: f64) -> f64 {
    stats
        .special_damage
        .unwrap_or(stats.damage * fallback_factor)
        .max(0.0)
}

fn credit(world: &mut World, tower: EntityId, outcome: Option<DamageOutcome>) {
    let Some(outcome) = outcome else {
        return;
    };
    if let Some(stats) = world.get_mut::<TowerStats>(tower) {
        stats.total_damage_dealt += outcome.applied;
        if outcome.killed {
            stats.kills += 1;
        }
    }
}
