//! Systems run by the scheduler each tick, plus the snapshot builder.
//!
//! Each system is a small struct implementing `System`; the shared
//! target-finding helpers live in `targets`.

pub mod ai_behavior;
pub mod combat;
pub mod movement;
pub mod resources;
pub mod snapshot;
pub mod targets;
pub mod tower_targeting;

/// Default run order.
pub mod priority {
    pub const AI: i32 = 10;
    pub const MOVEMENT: i32 = 20;
    pub const COMBAT: i32 = 30;
    pub const TOWER_TARGETING: i32 = 40;
    pub const RESOURCES: i32 = 50;
}

/// Count a boost down by `dt`, dropping it once elapsed. Returns the
/// multiplier in effect for this tick.
pub(crate) fn tick_boost(boost: &mut Option<bastion_core::components::Boost>, dt: f64) -> f64 {
    let Some(active) = boost.as_mut() else {
        return 1.0;
    };
    let multiplier = if active.multiplier.is_finite() {
        active.multiplier.max(0.0)
    } else {
        1.0
    };
    active.remaining -= dt;
    if active.remaining <= bastion_core::constants::TIMER_EPSILON {
        *boost = None;
    }
    multiplier
}
