//! Read-only world snapshot for the rendering collaborator.

use serde::{Deserialize, Serialize};

use crate::enums::AiState;
use crate::types::{EntityId, Position, SimTime};

/// Complete renderable state after a tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub time: SimTime,
    pub entities: Vec<EntityView>,
}

/// One drawable entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub position: Position,
    pub sprite: String,
    pub layer: i32,
    /// Health fraction, if the entity has health.
    pub health: Option<f64>,
    pub ai_state: Option<AiState>,
    pub is_dead: bool,
}
