//! Steering: turns a behavior state into a velocity.
//!
//! Directions are normalized before scaling, and a zero-length direction
//! yields a zero velocity.

use glam::DVec2;

use bastion_core::enums::AiState;
use bastion_core::types::{Position, Velocity};

/// Movement speeds of one unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speeds {
    pub patrol: f64,
    pub chase: f64,
    pub flee: f64,
}

/// Head straight for `to` at `speed`.
pub fn seek(from: Position, to: Position, speed: f64) -> Velocity {
    steer(to.as_vec() - from.as_vec(), speed)
}

/// Head straight away from `threat` at `speed`.
pub fn flee(from: Position, threat: Position, speed: f64) -> Velocity {
    steer(from.as_vec() - threat.as_vec(), speed)
}

fn steer(direction: DVec2, speed: f64) -> Velocity {
    Velocity::from_vec(direction.normalize_or_zero() * speed.max(0.0))
}

/// Velocity for a unit in `state`.
///
/// Idle and attacking units stand still. Patrol steers toward the current
/// waypoint, chase toward the hostile and flee away from it; without the
/// relevant point the unit stands still.
pub fn plan_velocity(
    state: AiState,
    position: Position,
    waypoint: Option<Position>,
    hostile: Option<Position>,
    speeds: Speeds,
) -> Velocity {
    match state {
        AiState::Idle | AiState::Attack => Velocity::ZERO,
        AiState::Patrol => waypoint
            .map(|w| seek(position, w, speeds.patrol))
            .unwrap_or(Velocity::ZERO),
        AiState::Chase => hostile
            .map(|h| seek(position, h, speeds.chase))
            .unwrap_or(Velocity::ZERO),
        AiState::Flee => hostile
            .map(|h| flee(position, h, speeds.flee))
            .unwrap_or(Velocity::ZERO),
    }
}
