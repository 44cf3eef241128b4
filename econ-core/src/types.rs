use serde::{Deserialize, Serialize};
use slotmap::{Key, new_key_type};

// === TYPE ALIASES ===

pub type GoodId = u32;
pub type Price = f64;
pub type Quantity = f64;
pub type Cash = f64;

/// The single commodity a firm produces and the households consume.
pub const CONSUMPTION_GOOD: GoodId = 0;

// === AGENT KEYS ===

new_key_type! {
    pub struct FirmId;
    pub struct HouseholdId;
}

/// Flattens a slotmap key to a scalar so it can be recorded as an event field.
pub trait KeyToU64 {
    fn to_u64(self) -> u64;
}

impl KeyToU64 for FirmId {
    fn to_u64(self) -> u64 {
        self.data().as_ffi()
    }
}

impl KeyToU64 for HouseholdId {
    fn to_u64(self) -> u64 {
        self.data().as_ffi()
    }
}

// === TRADES ===

/// Outcome of one clearing step: the executed quantity and the unit price
/// it settled at.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Trade {
    pub quantity: Quantity,
    pub price: Price,
}

impl Trade {
    pub fn value(&self) -> Cash {
        self.quantity * self.price
    }
}
