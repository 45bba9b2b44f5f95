//! Target lookups shared by the AI, combat and tower systems.

use bastion_core::components::{Faction, Health};
use bastion_core::enums::Team;
use bastion_core::types::{EntityId, Position};

use crate::ecs::{ComponentKind, KindSet, World};

const HOSTILE_KINDS: KindSet = KindSet::EMPTY
    .with(ComponentKind::Faction)
    .with(ComponentKind::Position);

/// Kinds a tower candidate must hold.
pub const ENEMY_KINDS: KindSet = KindSet::EMPTY
    .with(ComponentKind::Health)
    .with(ComponentKind::Position)
    .with(ComponentKind::Enemy);

/// Resolves the hostile an AI unit reacts to. `None` means "no target".
pub trait HostileLocator {
    fn nearest_hostile(&self, world: &World, id: EntityId) -> Option<EntityId>;
}

/// Picks the closest living entity of a hostile team, at any distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct FactionLocator;

impl HostileLocator for FactionLocator {
    fn nearest_hostile(&self, world: &World, id: EntityId) -> Option<EntityId> {
        let origin = *world.get::<Position>(id)?;
        nearest(hostiles_within(world, id, origin, None, KindSet::EMPTY))
    }
}

/// Live and not marked dead. Entities without health count as alive.
pub fn is_alive(world: &World, id: EntityId) -> bool {
    world.is_live(id) && world.get::<Health>(id).map_or(true, |h| !h.is_dead)
}

pub fn team_of(world: &World, id: EntityId) -> Option<Team> {
    world.get::<Faction>(id).map(|f| f.team)
}

/// Living entities hostile to `id` within `radius` of `origin`, with their
/// distances, in query order. `extra` narrows the candidates further.
pub fn hostiles_within(
    world: &World,
    id: EntityId,
    origin: Position,
    radius: Option<f64>,
    extra: KindSet,
) -> Vec<(EntityId, f64)> {
    let Some(team) = team_of(world, id) else {
        return Vec::new();
    };
    let mut required = extra;
    for kind in HOSTILE_KINDS.iter() {
        required.insert(kind);
    }
    within(world, required, origin, radius, |other| {
        other != id && team_of(world, other).is_some_and(|t| team.is_hostile_to(t))
    })
}

/// Living tower candidates within `radius` of `origin`, skipping `exclude`.
pub fn enemies_within(
    world: &World,
    origin: Position,
    radius: f64,
    exclude: &[EntityId],
) -> Vec<(EntityId, f64)> {
    within(world, ENEMY_KINDS, origin, Some(radius), |other| {
        !exclude.contains(&other)
    })
}

/// First entry with the smallest distance.
pub fn nearest(candidates: Vec<(EntityId, f64)>) -> Option<EntityId> {
    let mut best: Option<(EntityId, f64)> = None;
    for (id, distance) in candidates {
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((id, distance));
        }
    }
    best.map(|(id, _)| id)
}

fn within(
    world: &World,
    required: KindSet,
    origin: Position,
    radius: Option<f64>,
    accept: impl Fn(EntityId) -> bool,
) -> Vec<(EntityId, f64)> {
    let limit = radius.map(|r| r.max(0.0));
    world
        .query(required)
        .filter(|&other| accept(other) && is_alive(world, other))
        .filter_map(|other| {
            let distance = world.get::<Position>(other)?.distance_to(&origin);
            match limit {
                Some(limit) if distance > limit => None,
                _ => Some((other, distance)),
            }
        })
        .collect()
}
