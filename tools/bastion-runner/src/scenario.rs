//! Scenario files and the factories that turn presets into components.
//!
//! Stat tables live here, on the host side. The simulation crates never
//! hardcode them.

use std::path::Path;

use serde::Deserialize;

use bastion_core::components::*;
use bastion_core::config::SimConfig;
use bastion_core::enums::*;
use bastion_core::types::{EntityId, Position, Velocity};
use bastion_sim::ecs::NoSuchEntity;
use bastion_sim::SimulationEngine;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: Option<SimConfig>,
    #[serde(default)]
    pub units: Vec<UnitSpawn>,
    #[serde(default)]
    pub towers: Vec<TowerSpawn>,
    #[serde(default)]
    pub nodes: Vec<NodeSpawn>,
    /// Amount requested from every node each tick.
    #[serde(default)]
    pub harvest_per_tick: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitPreset {
    Grunt,
    Brute,
    Archer,
    Warlord,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnitSpawn {
    pub preset: UnitPreset,
    pub team: Team,
    pub at: Position,
    #[serde(default)]
    pub patrol: Vec<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerPreset {
    Arrow,
    Cannon,
    Frost,
    Tesla,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TowerSpawn {
    pub preset: TowerPreset,
    pub at: Position,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpawn {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub at: Position,
    pub amount: f64,
    #[serde(default = "full_quality")]
    pub quality: f64,
}

fn full_quality() -> f64 {
    1.0
}

/// Reading a scenario failed.
#[derive(Debug)]
pub enum ScenarioError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Spawn(NoSuchEntity),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::Io(e) => write!(f, "cannot read scenario: {e}"),
            ScenarioError::Parse(e) => write!(f, "invalid scenario: {e}"),
            ScenarioError::Spawn(e) => write!(f, "cannot spawn scenario entity: {e}"),
        }
    }
}

impl std::error::Error for ScenarioError {}

impl From<NoSuchEntity> for ScenarioError {
    fn from(e: NoSuchEntity) -> Self {
        ScenarioError::Spawn(e)
    }
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        serde_json::from_str(json).map_err(ScenarioError::Parse)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path).map_err(ScenarioError::Io)?;
        Self::from_json_str(&text)
    }

    /// Spawn every entity into `engine`. Returns the tower ids.
    pub fn populate(
        &self,
        engine: &mut SimulationEngine,
    ) -> Result<Vec<EntityId>, ScenarioError> {
        for unit in &self.units {
            spawn_unit(engine, unit)?;
        }
        for node in &self.nodes {
            spawn_node(engine, node)?;
        }
        let towers = self
            .towers
            .iter()
            .map(|tower| spawn_tower(engine, tower))
            .collect::<Result<_, _>>()?;
        Ok(towers)
    }
}

struct UnitStats {
    health: f64,
    speed: f64,
    detection: f64,
    reach: f64,
    damage: Damage,
    threat: f64,
    sprite: &'static str,
}

fn unit_stats(preset: UnitPreset) -> UnitStats {
    match preset {
        UnitPreset::Grunt => UnitStats {
            health: 60.0,
            speed: 30.0,
            detection: 120.0,
            reach: 12.0,
            damage: Damage {
                melee_damage: Some(6.0),
                melee_cooldown: Some(0.0),
                melee_cooldown_max: Some(0.8),
                critical_chance: 0.1,
                critical_multiplier: 1.5,
                ..Damage::default()
            },
            threat: 1.0,
            sprite: "grunt",
        },
        UnitPreset::Brute => UnitStats {
            health: 180.0,
            speed: 18.0,
            detection: 100.0,
            reach: 15.0,
            damage: Damage {
                melee_damage: Some(15.0),
                melee_cooldown: Some(0.0),
                melee_cooldown_max: Some(1.5),
                ..Damage::default()
            },
            threat: 2.0,
            sprite: "brute",
        },
        UnitPreset::Archer => UnitStats {
            health: 45.0,
            speed: 26.0,
            detection: 160.0,
            reach: 140.0,
            damage: Damage {
                ranged_damage: Some(5.0),
                ranged_range: Some(140.0),
                ranged_cooldown_max: Some(1.2),
                critical_chance: 0.2,
                critical_multiplier: 2.0,
                ..Damage::default()
            },
            threat: 1.5,
            sprite: "archer",
        },
        UnitPreset::Warlord => UnitStats {
            health: 600.0,
            speed: 14.0,
            detection: 150.0,
            reach: 18.0,
            damage: Damage {
                melee_damage: Some(30.0),
                melee_cooldown: Some(0.0),
                melee_cooldown_max: Some(2.0),
                critical_chance: 0.25,
                critical_multiplier: 2.0,
                ..Damage::default()
            },
            threat: 5.0,
            sprite: "warlord",
        },
    }
}

pub fn spawn_unit(
    engine: &mut SimulationEngine,
    spawn: &UnitSpawn,
) -> Result<EntityId, NoSuchEntity> {
    let stats = unit_stats(spawn.preset);
    let id = engine.create_entity();
    let components: [bastion_sim::ecs::Component; 7] = [
        spawn.at.into(),
        Velocity::ZERO.into(),
        Faction { team: spawn.team }.into(),
        Health {
            death_delay: 1.0,
            invulnerability_window: 0.1,
            ..Health::new(stats.health)
        }
        .into(),
        AiBehavior {
            detection_range: stats.detection,
            attack_range: stats.reach,
            patrol_speed: stats.speed * 0.5,
            chase_speed: stats.speed,
            flee_speed: stats.speed * 1.2,
            patrol_points: spawn.patrol.clone(),
            flee_threshold: if spawn.preset == UnitPreset::Warlord { 0.0 } else { 0.2 },
            ..AiBehavior::default()
        }
        .into(),
        stats.damage.into(),
        Sprite {
            key: stats.sprite.to_string(),
            layer: 1,
        }
        .into(),
    ];
    for component in components {
        engine.attach(id, component)?;
    }

    // Towers shoot invaders only.
    if spawn.team == Team::Invaders {
        engine.attach(
            id,
            Enemy {
                threat_level: stats.threat,
            },
        )?;
        if spawn.preset == UnitPreset::Warlord {
            engine.attach(id, Boss)?;
        }
    }
    Ok(id)
}

fn tower_stats(preset: TowerPreset) -> (TowerStats, &'static str) {
    let base = TowerStats {
        damage: 8.0,
        range: 150.0,
        attack_rate: 0.8,
        targeting: TargetingPreferences {
            prefer_closer: true,
            prioritize_bosses: true,
            ..Default::default()
        },
        ..TowerStats::default()
    };
    match preset {
        TowerPreset::Arrow => (
            TowerStats {
                delivery: Delivery::Projectile { speed: 400.0 },
                ..base
            },
            "tower_arrow",
        ),
        TowerPreset::Cannon => (
            TowerStats {
                damage: 20.0,
                range: 120.0,
                attack_rate: 2.0,
                special_ability: Some(SpecialAbility::AreaDamage),
                special_range: Some(60.0),
                special_cooldown_max: 6.0,
                damage_type: DamageType::Fire,
                ..base
            },
            "tower_cannon",
        ),
        TowerPreset::Frost => (
            TowerStats {
                damage: 4.0,
                special_ability: Some(SpecialAbility::Slow),
                special_damage: Some(0.5),
                special_cooldown_max: 4.0,
                damage_type: DamageType::Frost,
                targeting: TargetingPreferences {
                    target_high_health: true,
                    ..Default::default()
                },
                ..base
            },
            "tower_frost",
        ),
        TowerPreset::Tesla => (
            TowerStats {
                damage: 12.0,
                attack_rate: 1.5,
                special_ability: Some(SpecialAbility::ChainLightning),
                special_cooldown_max: 5.0,
                chain_count: Some(4),
                chain_range: Some(50.0),
                damage_type: DamageType::Lightning,
                targeting: TargetingPreferences {
                    target_low_health: true,
                    ..Default::default()
                },
                ..base
            },
            "tower_tesla",
        ),
    }
}

pub fn spawn_tower(
    engine: &mut SimulationEngine,
    spawn: &TowerSpawn,
) -> Result<EntityId, NoSuchEntity> {
    let (stats, sprite) = tower_stats(spawn.preset);
    let id = engine.create_entity();
    engine.attach(id, spawn.at)?;
    engine.attach(id, stats)?;
    engine.attach(id, Faction { team: Team::Defenders })?;
    engine.attach(id, Health::new(400.0))?;
    engine.attach(
        id,
        Sprite {
            key: sprite.to_string(),
            layer: 0,
        },
    )?;
    Ok(id)
}

pub fn spawn_node(
    engine: &mut SimulationEngine,
    spawn: &NodeSpawn,
) -> Result<EntityId, NoSuchEntity> {
    let id = engine.create_entity();
    engine.attach(id, spawn.at)?;
    engine.attach(
        id,
        Resource {
            resource_type: spawn.resource_type,
            amount: spawn.amount,
            max_amount: spawn.amount,
            collection_timer: 0.0,
            collection_interval: 1.0,
            respawn_timer: 0.0,
            respawn_time: 10.0,
            quality: spawn.quality,
            is_depleted: false,
            yield_boost: None,
        },
    )?;
    engine.attach(
        id,
        Sprite {
            key: format!("node_{:?}", spawn.resource_type).to_lowercase(),
            layer: -1,
        },
    )?;
    Ok(id)
}
