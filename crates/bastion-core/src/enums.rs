//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Behavior state of an AI-controlled unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiState {
    /// Standing still, watching for hostiles.
    #[default]
    Idle,
    /// Walking the configured waypoint loop.
    Patrol,
    /// Closing in on the nearest hostile.
    Chase,
    /// Holding position and striking the nearest hostile.
    Attack,
    /// Running directly away from the nearest hostile.
    Flee,
}

impl AiState {
    pub const ALL: [AiState; 5] = [
        AiState::Idle,
        AiState::Patrol,
        AiState::Chase,
        AiState::Attack,
        AiState::Flee,
    ];
}

/// Damage school. Carried through to events and projectile intents so
/// collaborators (resistances, effects) can react to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    #[default]
    Physical,
    Magic,
    Fire,
    Frost,
    Lightning,
    Poison,
}

/// Tower special ability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialAbility {
    /// Damage every enemy around the tower.
    AreaDamage,
    /// Emit a slow intent for every enemy around the tower.
    Slow,
    /// Emit a stun intent for every enemy around the tower.
    Stun,
    /// Strike the primary target, then hop between nearby enemies.
    ChainLightning,
}

/// Status effect requested from the external effect system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffect {
    Slow,
    Stun,
}

/// How a tower's primary attack reaches its target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum Delivery {
    /// Damage lands on the tick the tower fires.
    #[default]
    Direct,
    /// A projectile intent is emitted; impact is resolved elsewhere.
    Projectile { speed: f64 },
}

/// Harvestable resource category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Gold,
    Wood,
    Stone,
    Mana,
}

/// Allegiance used for hostility checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Defenders,
    Invaders,
    #[default]
    Neutral,
}

impl Team {
    /// Defenders and invaders are hostile to each other; neutrals to nobody.
    pub fn is_hostile_to(self, other: Team) -> bool {
        matches!(
            (self, other),
            (Team::Defenders, Team::Invaders) | (Team::Invaders, Team::Defenders)
        )
    }
}
