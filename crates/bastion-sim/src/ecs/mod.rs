//! Entity-component storage for the simulation.
//!
//! `EntityRegistry` owns identity and liveness, `ComponentSlots` holds the
//! per-entity slot table, and `World` composes the two behind the
//! create/attach/query/remove interface.

pub mod component;
pub mod entity;
pub mod world;

pub use component::{Component, ComponentData, ComponentKind, KindSet};
pub use entity::EntityRegistry;
pub use world::{NoSuchEntity, Query, World};
