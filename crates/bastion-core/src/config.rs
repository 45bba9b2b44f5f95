//! Simulation configuration.
//!
//! Loaded by the host (typically from JSON) and handed to the engine at
//! construction. Every field has a default so partial documents work.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::AiState;

/// Per-state timer durations for the AI state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateDurations {
    pub idle: f64,
    pub patrol: f64,
    pub chase: f64,
    pub attack: f64,
    pub flee: f64,
}

impl Default for StateDurations {
    fn default() -> Self {
        Self {
            idle: DEFAULT_STATE_DURATION,
            patrol: DEFAULT_STATE_DURATION,
            chase: DEFAULT_STATE_DURATION,
            attack: DEFAULT_STATE_DURATION,
            flee: DEFAULT_STATE_DURATION,
        }
    }
}

impl StateDurations {
    pub fn for_state(&self, state: AiState) -> f64 {
        match state {
            AiState::Idle => self.idle,
            AiState::Patrol => self.patrol,
            AiState::Chase => self.chase,
            AiState::Attack => self.attack,
            AiState::Flee => self.flee,
        }
    }
}

/// Thresholds for the AI state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTuning {
    pub state_durations: StateDurations,
    pub waypoint_tolerance: f64,
    pub idle_patrol_chance: f64,
    pub chase_leash_factor: f64,
    pub flee_recovery_factor: f64,
    pub flee_escape_factor: f64,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            state_durations: StateDurations::default(),
            waypoint_tolerance: WAYPOINT_TOLERANCE,
            idle_patrol_chance: IDLE_PATROL_CHANCE,
            chase_leash_factor: CHASE_LEASH_FACTOR,
            flee_recovery_factor: FLEE_RECOVERY_FACTOR,
            flee_escape_factor: FLEE_ESCAPE_FACTOR,
        }
    }
}

/// Weights of the tower target score and special-ability fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingWeights {
    pub distance: f64,
    pub health: f64,
    pub boss: f64,
    pub threat: f64,
    pub area_fallback_factor: f64,
    pub chain_fallback_factor: f64,
}

impl Default for TargetingWeights {
    fn default() -> Self {
        Self {
            distance: SCORE_DISTANCE_WEIGHT,
            health: SCORE_HEALTH_WEIGHT,
            boss: SCORE_BOSS_BONUS,
            threat: SCORE_THREAT_WEIGHT,
            area_fallback_factor: AREA_DAMAGE_FALLBACK,
            chain_fallback_factor: CHAIN_DAMAGE_FALLBACK,
        }
    }
}

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    pub ai: AiTuning,
    pub targeting: TargetingWeights,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            ai: AiTuning::default(),
            targeting: TargetingWeights::default(),
        }
    }
}

impl SimConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_json_str(&text)
    }

    /// Clamp every value into its valid domain.
    pub fn sanitized(mut self) -> Self {
        let d = &mut self.ai.state_durations;
        for value in [
            &mut d.idle,
            &mut d.patrol,
            &mut d.chase,
            &mut d.attack,
            &mut d.flee,
        ] {
            *value = non_negative(*value);
        }

        let ai = &mut self.ai;
        ai.waypoint_tolerance = non_negative(ai.waypoint_tolerance);
        ai.idle_patrol_chance = unit_interval(ai.idle_patrol_chance);
        ai.chase_leash_factor = at_least_one(ai.chase_leash_factor);
        ai.flee_recovery_factor = at_least_one(ai.flee_recovery_factor);
        ai.flee_escape_factor = at_least_one(ai.flee_escape_factor);

        let t = &mut self.targeting;
        t.distance = non_negative(t.distance);
        t.health = non_negative(t.health);
        t.boss = non_negative(t.boss);
        t.threat = non_negative(t.threat);
        t.area_fallback_factor = non_negative(t.area_fallback_factor);
        t.chain_fallback_factor = non_negative(t.chain_fallback_factor);
        self
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

fn unit_interval(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn at_least_one(v: f64) -> f64 {
    if v.is_finite() {
        v.max(1.0)
    } else {
        1.0
    }
}

/// Error loading a configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The file could not be read.
    Io(String),
    /// The document is not valid configuration JSON.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "failed to read config: {msg}"),
            ConfigError::Parse(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
