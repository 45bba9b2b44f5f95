//! Events and intents emitted by the simulation.
//!
//! Systems append these to the engine's event bus during a tick; the host
//! drains them afterwards. Nothing in here carries behavior.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{EntityId, Position};

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// Damage landed on a target.
    DamageApplied {
        target: EntityId,
        attacker: Option<EntityId>,
        amount: f64,
        critical: bool,
        remaining: f64,
    },
    /// Health reached zero. Removal follows after the death delay.
    EntityDied {
        id: EntityId,
        killer: Option<EntityId>,
    },
    /// The entity and all of its components left the world.
    EntityRemoved { id: EntityId },
    /// An AI unit switched behavior state.
    StateChanged {
        id: EntityId,
        from: AiState,
        to: AiState,
    },
    /// A tower's primary attack fired.
    TowerFired {
        tower: EntityId,
        target: EntityId,
        damage: f64,
    },
    /// A tower's special ability went off.
    SpecialTriggered {
        tower: EntityId,
        ability: SpecialAbility,
        targets: Vec<EntityId>,
    },
    /// A resource node ran dry.
    ResourceDepleted {
        id: EntityId,
        resource_type: ResourceType,
    },
    /// A depleted resource node refilled.
    ResourceRespawned {
        id: EntityId,
        resource_type: ResourceType,
    },
}

/// Damage carried by a projectile, resolved on impact by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageProfile {
    pub amount: f64,
    pub damage_type: DamageType,
    pub speed: f64,
}

/// Request to spawn a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileIntent {
    pub source: EntityId,
    pub origin: Position,
    pub target: EntityId,
    pub profile: DamageProfile,
}

/// Request to apply a status effect. Duration is the effect system's concern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusIntent {
    pub source: EntityId,
    pub target: EntityId,
    pub effect: StatusEffect,
    /// Strength hint: the triggering tower's special damage.
    pub magnitude: f64,
}

/// Everything emitted since the last drain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    pub events: Vec<SimEvent>,
    pub projectiles: Vec<ProjectileIntent>,
    pub statuses: Vec<StatusIntent>,
}

impl EventBatch {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.projectiles.is_empty() && self.statuses.is_empty()
    }
}
