// Per-commodity goods inventory

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{GoodId, Quantity};

/// Quantities of goods held by one agent, keyed by commodity type.
///
/// Absent types read as zero. Removal clamps at zero instead of failing, so
/// an oversized removal silently empties the slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub goods: HashMap<GoodId, Quantity>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, good: GoodId, amount: Quantity) {
        *self.goods.entry(good).or_insert(0.0) += amount;
    }

    /// Subtract `amount`, then clamp the remaining quantity to `max(0, q)`.
    pub fn remove(&mut self, good: GoodId, amount: Quantity) {
        let current = self.goods.entry(good).or_insert(0.0);
        *current -= amount;
        *current = current.max(0.0);
    }

    /// Overwrite the quantity held of `good`.
    pub fn set(&mut self, good: GoodId, amount: Quantity) {
        self.goods.insert(good, amount);
    }

    pub fn get(&self, good: GoodId) -> Quantity {
        self.goods.get(&good).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> Quantity {
        self.goods.values().sum()
    }

    /// First commodity type holding a negative quantity, if any.
    pub fn find_negative(&self) -> Option<(GoodId, Quantity)> {
        self.goods
            .iter()
            .find(|(_, qty)| **qty < 0.0)
            .map(|(good, qty)| (*good, *qty))
    }
}
