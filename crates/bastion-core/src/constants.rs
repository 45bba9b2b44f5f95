//! Simulation constants and tuning defaults.
//!
//! These are defaults for `SimConfig`; stat tables for units and towers are
//! supplied by the host's factories, never hardcoded here.

// --- AI ---

/// Seconds an AI unit stays in a state before its timer expires.
pub const DEFAULT_STATE_DURATION: f64 = 5.0;

/// Distance at which a patrol waypoint counts as reached.
pub const WAYPOINT_TOLERANCE: f64 = 10.0;

/// Chance per tick that an idle unit with an expired timer starts patrolling.
pub const IDLE_PATROL_CHANCE: f64 = 0.01;

/// A chase is abandoned once the target is this many detection ranges away.
pub const CHASE_LEASH_FACTOR: f64 = 1.5;

/// A fleeing unit recovers once its health fraction exceeds this multiple of
/// its flee threshold.
pub const FLEE_RECOVERY_FACTOR: f64 = 1.5;

/// A fleeing unit calms down once the threat is this many detection ranges away.
pub const FLEE_ESCAPE_FACTOR: f64 = 2.0;

// --- Tower targeting ---

/// Weight of the distance term in the target score.
pub const SCORE_DISTANCE_WEIGHT: f64 = 100.0;

/// Weight of the health term in the target score.
pub const SCORE_HEALTH_WEIGHT: f64 = 200.0;

/// Flat bonus for bosses when a tower prioritizes them.
pub const SCORE_BOSS_BONUS: f64 = 500.0;

/// Weight of an enemy's threat level in the target score.
pub const SCORE_THREAT_WEIGHT: f64 = 100.0;

/// Area special damage as a fraction of tower damage when none is configured.
pub const AREA_DAMAGE_FALLBACK: f64 = 0.5;

/// Chain special damage as a fraction of tower damage when none is configured.
pub const CHAIN_DAMAGE_FALLBACK: f64 = 0.7;

/// Chain hops past the primary target when a tower sets none.
pub const CHAIN_DEFAULT_HOPS: u32 = 1;

// --- Engine ---

/// Default RNG seed.
pub const DEFAULT_SEED: u64 = 42;

/// Remaining time below which a timer counts as elapsed.
pub const TIMER_EPSILON: f64 = 1e-9;
