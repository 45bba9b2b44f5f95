use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use bastion_core::enums::ResourceType;
use bastion_core::types::EntityId;

/// Resource balances owned by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stockpile {
    balances: BTreeMap<ResourceType, f64>,
}

impl Stockpile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to a balance. Negative or non-finite amounts are ignored.
    pub fn deposit(&mut self, resource: ResourceType, amount: f64) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        *self.balances.entry(resource).or_insert(0.0) += amount;
    }

    /// Take `amount` out of a balance. Fails, leaving the balance untouched,
    /// when there is not enough.
    pub fn withdraw(&mut self, resource: ResourceType, amount: f64) -> bool {
        if !amount.is_finite() || amount < 0.0 {
            return false;
        }
        let balance = self.balance(resource);
        if balance < amount {
            return false;
        }
        self.balances.insert(resource, balance - amount);
        true
    }

    pub fn balance(&self, resource: ResourceType) -> f64 {
        self.balances.get(&resource).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, f64)> + '_ {
        self.balances.iter().map(|(kind, amount)| (*kind, *amount))
    }
}

/// Result of one harvest from a resource node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Harvest {
    pub node: EntityId,
    pub resource_type: ResourceType,
    /// Taken from the node.
    pub taken: f64,
    /// Credited to the stockpile after quality and boosts.
    pub credited: f64,
    pub depleted: bool,
}
