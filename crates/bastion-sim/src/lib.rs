//! Simulation runtime for Bastion.
//!
//! Owns the ECS world, runs the registered systems in priority order once
//! per `advance`, and exposes events and a render snapshot to the host.

pub mod context;
pub mod economy;
pub mod ecs;
pub mod engine;
pub mod schedule;
pub mod systems;

pub use bastion_core as core;
pub use context::{EventBus, RemovalQueue, TickContext};
pub use engine::SimulationEngine;
pub use schedule::{Scheduler, System};

#[cfg(test)]
mod tests;
