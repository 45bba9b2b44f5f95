//! Component records attached to entities.
//!
//! Components are plain data: game logic lives in systems. Values are stored
//! exactly as attached; systems clamp out-of-domain numbers where they use
//! them.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::Position;

/// Hit points, regeneration, invulnerability and death bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Health {
    pub current: f64,
    pub max: f64,
    /// Passive regeneration, in hit points per second.
    pub regen_per_second: Option<f64>,
    pub is_dead: bool,
    /// Permanent invulnerability (e.g. a building under construction).
    pub invulnerable: bool,
    /// Seconds of invulnerability granted after each hit. 0 disables it.
    pub invulnerability_window: f64,
    /// Remaining invulnerability, counted down by the combat system.
    pub invulnerability_timer: f64,
    /// Seconds between death and removal from the world.
    pub death_delay: f64,
}

impl Health {
    /// Full health with no regeneration or invulnerability.
    pub fn new(max: f64) -> Self {
        Self {
            current: max,
            max,
            ..Self::default()
        }
    }

    /// Current health as a fraction of max, in [0, 1].
    pub fn fraction(&self) -> f64 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.current / self.max).clamp(0.0, 1.0)
    }

    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable || self.invulnerability_timer > 0.0
    }
}

impl Default for Health {
    fn default() -> Self {
        Self {
            current: 100.0,
            max: 100.0,
            regen_per_second: None,
            is_dead: false,
            invulnerable: false,
            invulnerability_window: 0.0,
            invulnerability_timer: 0.0,
            death_delay: 0.0,
        }
    }
}

/// Offensive profile of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Damage {
    pub base_damage: f64,
    pub melee_damage: Option<f64>,
    pub melee_range: Option<f64>,
    /// Seconds until the next melee strike may land.
    pub melee_cooldown: Option<f64>,
    pub melee_cooldown_max: Option<f64>,
    pub ranged_damage: Option<f64>,
    pub ranged_range: Option<f64>,
    /// Seconds until the next ranged shot.
    pub ranged_cooldown: Option<f64>,
    pub ranged_cooldown_max: Option<f64>,
    /// Probability in [0, 1] that a landed hit also deals critical damage.
    pub critical_chance: f64,
    /// Critical bonus factor, at least 1.
    pub critical_multiplier: f64,
    pub damage_type: DamageType,
    /// Splash damage applied around a ranged hit.
    pub area_damage: Option<f64>,
    pub area_range: Option<f64>,
    /// Chain hops: extra targets struck after the primary, each the nearest
    /// unhit enemy within `chain_range` of the previous one.
    pub chain_count: Option<u32>,
    pub chain_range: Option<f64>,
}

impl Default for Damage {
    fn default() -> Self {
        Self {
            base_damage: 0.0,
            melee_damage: None,
            melee_range: None,
            melee_cooldown: None,
            melee_cooldown_max: None,
            ranged_damage: None,
            ranged_range: None,
            ranged_cooldown: None,
            ranged_cooldown_max: None,
            critical_chance: 0.0,
            critical_multiplier: 1.0,
            damage_type: DamageType::Physical,
            area_damage: None,
            area_range: None,
            chain_count: None,
            chain_range: None,
        }
    }
}

/// Finite-state AI controller data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiBehavior {
    pub current_state: AiState,
    pub previous_state: AiState,
    /// Seconds left in the current state's configured duration.
    pub state_timer: f64,
    /// Raised while in `Attack`; read by the combat system for melee.
    pub is_attacking: bool,
    pub detection_range: f64,
    pub attack_range: f64,
    pub patrol_speed: f64,
    pub chase_speed: f64,
    pub flee_speed: f64,
    pub patrol_points: Vec<Position>,
    pub current_patrol_index: usize,
    /// Temperament in [0, 1]. Carried for host-side tuning.
    pub aggression: f64,
    /// Temperament in [0, 1]. Carried for host-side tuning.
    pub fear_threshold: f64,
    /// Health fraction below which an attacking unit breaks off and flees.
    pub flee_threshold: f64,
}

impl Default for AiBehavior {
    fn default() -> Self {
        Self {
            current_state: AiState::Idle,
            previous_state: AiState::Idle,
            state_timer: crate::constants::DEFAULT_STATE_DURATION,
            is_attacking: false,
            detection_range: 0.0,
            attack_range: 0.0,
            patrol_speed: 0.0,
            chase_speed: 0.0,
            flee_speed: 0.0,
            patrol_points: Vec::new(),
            current_patrol_index: 0,
            aggression: 0.5,
            fear_threshold: 0.5,
            flee_threshold: 0.0,
        }
    }
}

/// How a tower weighs its candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingPreferences {
    pub prefer_closer: bool,
    pub target_low_health: bool,
    pub target_high_health: bool,
    pub prioritize_bosses: bool,
}

/// Temporary multiplier with its own expiry timer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boost {
    pub multiplier: f64,
    /// Seconds until the boost lapses.
    pub remaining: f64,
}

/// Stationary attacker state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerStats {
    pub damage: f64,
    pub range: f64,
    /// Seconds between primary attacks.
    pub attack_rate: f64,
    /// Seconds until the next primary attack.
    pub attack_cooldown: f64,
    pub special_ability: Option<SpecialAbility>,
    pub special_cooldown: f64,
    pub special_cooldown_max: f64,
    pub special_damage: Option<f64>,
    /// Radius of area/status specials. Falls back to `range`.
    pub special_range: Option<f64>,
    /// Chain hops: extra targets struck after the primary, each the nearest
    /// unhit enemy within `chain_range` of the previous one.
    pub chain_count: Option<u32>,
    pub chain_range: Option<f64>,
    pub targeting: TargetingPreferences,
    pub delivery: Delivery,
    pub damage_type: DamageType,
    pub damage_boost: Option<Boost>,
    pub total_damage_dealt: f64,
    pub kills: u32,
}

impl Default for TowerStats {
    fn default() -> Self {
        Self {
            damage: 0.0,
            range: 0.0,
            attack_rate: 1.0,
            attack_cooldown: 0.0,
            special_ability: None,
            special_cooldown: 0.0,
            special_cooldown_max: 0.0,
            special_damage: None,
            special_range: None,
            chain_count: None,
            chain_range: None,
            targeting: TargetingPreferences::default(),
            delivery: Delivery::Direct,
            damage_type: DamageType::Physical,
            damage_boost: None,
            total_damage_dealt: 0.0,
            kills: 0,
        }
    }
}

/// Harvestable resource node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub amount: f64,
    pub max_amount: f64,
    /// Seconds until the node can be harvested again.
    #[serde(default)]
    pub collection_timer: f64,
    pub collection_interval: f64,
    /// Seconds until a depleted node refills.
    #[serde(default)]
    pub respawn_timer: f64,
    pub respawn_time: f64,
    /// Yield quality in [0, 1].
    pub quality: f64,
    #[serde(default)]
    pub is_depleted: bool,
    #[serde(default)]
    pub yield_boost: Option<Boost>,
}

/// Allegiance marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    pub team: Team,
}

/// Marks an entity as a valid tower target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    /// Relative danger, weighed by tower targeting.
    pub threat_level: f64,
}

/// Marks an enemy as a boss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boss;

/// Render tag consumed by the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    pub key: String,
    #[serde(default)]
    pub layer: i32,
}
