//! AI behavior finite state machine.
//!
//! Pure functions that compute state transitions for one unit from a
//! snapshot of its situation. Conditions are checked in priority order and
//! the first match wins.

use bastion_core::config::AiTuning;
use bastion_core::enums::AiState;
use bastion_core::types::Position;

/// The nearest hostile as seen by one unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostileInfo {
    pub position: Position,
    pub distance: f64,
}

/// Input to the FSM for a single unit.
#[derive(Debug, Clone, Copy)]
pub struct AiContext {
    pub state: AiState,
    pub position: Position,
    /// Seconds left on the current state's timer.
    pub state_timer: f64,
    /// Uniform draw in [0, 1), consulted only by an idle unit whose timer
    /// has run out.
    pub patrol_roll: f64,
    pub hostile: Option<HostileInfo>,
    /// Health fraction, if the unit has health.
    pub health_fraction: Option<f64>,
    pub detection_range: f64,
    pub attack_range: f64,
    pub flee_threshold: f64,
    /// Current patrol waypoint, if the unit has any.
    pub waypoint: Option<Position>,
}

/// Output from the FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiDecision {
    pub new_state: AiState,
    pub state_changed: bool,
    /// The current waypoint was reached; move on to the next one.
    pub advance_waypoint: bool,
}

impl AiDecision {
    fn stay(state: AiState) -> Self {
        Self {
            new_state: state,
            state_changed: false,
            advance_waypoint: false,
        }
    }

    fn switch(from: AiState, to: AiState) -> Self {
        Self {
            new_state: to,
            state_changed: from != to,
            advance_waypoint: false,
        }
    }
}

/// Evaluate the FSM for one unit.
pub fn evaluate(ctx: &AiContext, tuning: &AiTuning) -> AiDecision {
    match ctx.state {
        AiState::Idle => evaluate_idle(ctx, tuning),
        AiState::Patrol => evaluate_patrol(ctx, tuning),
        AiState::Chase => evaluate_chase(ctx, tuning),
        AiState::Attack => evaluate_attack(ctx),
        AiState::Flee => evaluate_flee(ctx, tuning),
    }
}

fn detects(ctx: &AiContext) -> bool {
    ctx.hostile
        .is_some_and(|h| h.distance <= ctx.detection_range.max(0.0))
}

fn evaluate_idle(ctx: &AiContext, tuning: &AiTuning) -> AiDecision {
    if detects(ctx) {
        return AiDecision::switch(ctx.state, AiState::Chase);
    }

    if ctx.state_timer <= 0.0 && ctx.patrol_roll < tuning.idle_patrol_chance {
        return AiDecision::switch(ctx.state, AiState::Patrol);
    }

    AiDecision::stay(ctx.state)
}

fn evaluate_patrol(ctx: &AiContext, tuning: &AiTuning) -> AiDecision {
    if detects(ctx) {
        return AiDecision::switch(ctx.state, AiState::Chase);
    }

    // Nothing to walk between.
    let Some(waypoint) = ctx.waypoint else {
        return AiDecision::switch(ctx.state, AiState::Idle);
    };

    if ctx.position.distance_to(&waypoint) < tuning.waypoint_tolerance {
        return AiDecision {
            advance_waypoint: true,
            ..AiDecision::stay(ctx.state)
        };
    }

    AiDecision::stay(ctx.state)
}

fn evaluate_chase(ctx: &AiContext, tuning: &AiTuning) -> AiDecision {
    let Some(hostile) = ctx.hostile else {
        return AiDecision::switch(ctx.state, AiState::Idle);
    };

    if hostile.distance > ctx.detection_range.max(0.0) * tuning.chase_leash_factor {
        return AiDecision::switch(ctx.state, AiState::Idle);
    }

    if hostile.distance <= ctx.attack_range.max(0.0) {
        return AiDecision::switch(ctx.state, AiState::Attack);
    }

    AiDecision::stay(ctx.state)
}

fn evaluate_attack(ctx: &AiContext) -> AiDecision {
    let Some(hostile) = ctx.hostile else {
        return AiDecision::switch(ctx.state, AiState::Idle);
    };

    if hostile.distance > ctx.attack_range.max(0.0) {
        return AiDecision::switch(ctx.state, AiState::Chase);
    }

    if let Some(fraction) = ctx.health_fraction {
        if fraction < ctx.flee_threshold {
            return AiDecision::switch(ctx.state, AiState::Flee);
        }
    }

    AiDecision::stay(ctx.state)
}

fn evaluate_flee(ctx: &AiContext, tuning: &AiTuning) -> AiDecision {
    let fraction = ctx.health_fraction.unwrap_or(1.0);
    if fraction > ctx.flee_threshold * tuning.flee_recovery_factor {
        return AiDecision::switch(ctx.state, AiState::Idle);
    }

    // Losing sight of the threat counts as having escaped it.
    let escaped = ctx.hostile.is_none_or(|h| {
        h.distance > ctx.detection_range.max(0.0) * tuning.flee_escape_factor
    });
    if escaped {
        return AiDecision::switch(ctx.state, AiState::Idle);
    }

    AiDecision::stay(ctx.state)
}
