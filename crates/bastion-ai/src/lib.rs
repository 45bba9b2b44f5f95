//! Unit AI for BASTION.
//!
//! Implements the five-state behavior machine and the steering rules that
//! turn a state into a velocity. No ECS dependency: the simulation gathers
//! a context per unit, calls in here, and writes the results back.

pub mod fsm;
pub mod steering;

pub use bastion_core as core;
